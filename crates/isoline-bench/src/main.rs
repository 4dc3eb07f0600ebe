//! isoline-bench: CLI tool for contour experiments and diagnostics.
//!
//! Runs the contour pipeline on a grid file with configurable parameters,
//! printing per-stage and per-level diagnostics. Useful for:
//!
//! - Comparing stitching strategies (`greedy` vs `vector-chain`)
//! - Tuning the coincidence and collinearity tolerances
//! - Measuring per-stage durations on large grids
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin isoline-bench -- [OPTIONS] <GRID_PATH>
//! ```
//!
//! Set `RUST_LOG=debug` to see per-level stitching logs.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod input;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use isoline_pipeline::diagnostics::{Clock, ContourDiagnostics};
use isoline_pipeline::{ContourConfig, ContourResult, ScalarGrid, StitcherKind};
use serde::Serialize;

/// Contour tracing experiments and diagnostics for isoline.
///
/// Traces contours of a scalar grid (JSON `ScalarGrid` or grayscale
/// image) and prints per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "isoline-bench", version)]
struct Cli {
    /// Path to the input grid (`.json`) or image (PNG, JPEG, BMP, WebP).
    grid_path: PathBuf,

    /// Explicit contour levels, comma separated and strictly increasing.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    levels: Option<Vec<f64>>,

    /// Number of evenly spaced levels when `--levels` is not given.
    #[arg(long, default_value_t = 10, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    level_count: usize,

    /// Segment stitching strategy.
    #[arg(long, value_enum, default_value_t = Stitcher::Greedy)]
    stitcher: Stitcher,

    /// Coincidence tolerance as a fraction of the grid spacing.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_RELATIVE_TOLERANCE)]
    relative_tolerance: f64,

    /// Slope tolerance for collinear vector condensation.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_COLLINEAR_TOLERANCE)]
    collinear_tolerance: f64,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Write the packed contour arrays as JSON to this file.
    #[arg(long)]
    packed_out: Option<PathBuf>,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Full contour config as a JSON string.
    ///
    /// When provided, `--stitcher` and both tolerance flags are ignored.
    /// The JSON must be a valid `ContourConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Stitching strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Stitcher {
    /// Grow chains at both ends by endpoint matching.
    Greedy,
    /// Displacement-vector chains with merge and collinear condensation.
    VectorChain,
}

impl From<Stitcher> for StitcherKind {
    fn from(s: Stitcher) -> Self {
        match s {
            Stitcher::Greedy => Self::Greedy,
            Stitcher::VectorChain => Self::VectorChain,
        }
    }
}

/// One run's JSON output.
#[derive(Serialize)]
struct RunReport<'a> {
    config: &'a ContourConfig,
    levels: &'a [f64],
    diagnostics: &'a ContourDiagnostics,
}

/// Build a [`ContourConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<ContourConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(ContourConfig {
        stitcher: cli.stitcher.into(),
        relative_tolerance: cli.relative_tolerance,
        collinear_tolerance: cli.collinear_tolerance,
        ..ContourConfig::default()
    })
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let grid = match input::load_grid(&cli.grid_path) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Error loading {}: {e}", cli.grid_path.display());
            return ExitCode::FAILURE;
        }
    };

    let levels = match cli.levels.clone() {
        Some(levels) => levels,
        None => match input::even_levels(&grid, cli.level_count) {
            Ok(levels) => levels,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
    };

    eprintln!(
        "Grid: {} ({}x{})",
        cli.grid_path.display(),
        grid.rows,
        grid.cols,
    );
    eprintln!("Levels: {levels:?}");
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (result, diagnostics) = match isoline_pipeline::trace_contours_with_diagnostics(
            &grid, &levels, &config, &StdClock,
        ) {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        };

        if cli.json {
            let report = RunReport {
                config: &config,
                levels: &levels,
                diagnostics: &diagnostics,
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
        }

        // Write outputs on the first run only.
        if run == 0 && write_outputs(&cli, &grid, &levels, &config, &result).is_err() {
            return ExitCode::FAILURE;
        }

        all_diagnostics.push(diagnostics);

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Write `--packed-out` and `--svg` files, reporting failures on stderr.
fn write_outputs(
    cli: &Cli,
    grid: &ScalarGrid,
    levels: &[f64],
    config: &ContourConfig,
    result: &ContourResult,
) -> Result<(), ()> {
    if let Some(ref packed_path) = cli.packed_out {
        let json = serde_json::to_string(&result.packed).map_err(|e| {
            eprintln!("Error serializing packed output: {e}");
        })?;
        std::fs::write(packed_path, &json).map_err(|e| {
            eprintln!("Error writing {}: {e}", packed_path.display());
        })?;
        eprintln!(
            "Packed output written to {} ({} points, {} polylines)",
            packed_path.display(),
            result.packed.point_count(),
            result.packed.polygon_count,
        );
    }

    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .grid_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("isoline");
        let desc = format!("{} levels, {} stitcher", levels.len(), config.stitcher.name());
        let config_json = serde_json::to_string(config).ok();
        let metadata = isoline_export::SvgMetadata {
            title: Some(title),
            description: Some(&desc),
            config_json: config_json.as_deref(),
        };
        let svg = isoline_export::to_svg(
            &result.polylines,
            levels,
            isoline_export::Bounds::from_grid(grid),
            &result.tolerance,
            &metadata,
        );
        std::fs::write(svg_path, &svg).map_err(|e| {
            eprintln!("Error writing SVG to {}: {e}", svg_path.display());
        })?;
        eprintln!(
            "SVG written to {} ({} bytes)",
            svg_path.display(),
            svg.len(),
        );
    }

    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&ContourDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[ContourDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Trace", |d| d.trace.duration),
        ("Stitch", |d| d.stitch.duration),
        ("Pack", |d| d.pack.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
