//! Pipeline diagnostics: timing and counts for each stage and level.
//!
//! [`trace_contours_with_diagnostics`] runs the same stages as
//! [`crate::trace_contours`] and records how long each took and what it
//! produced. Time is read through the caller-supplied [`Clock`] so this
//! crate stays free of platform timing APIs.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contour::CellTracer;
use crate::pack::pack_polylines;
use crate::stitch::stitch_levels;
use crate::store::LevelSegmentStore;
use crate::types::{ContourConfig, ContourError, ContourResult, Polyline, ScalarGrid, Tolerance};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of monotonic timestamps.
///
/// Native callers wrap `std::time::Instant`; tests use a fake clock that
/// advances by a fixed step per reading.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourDiagnostics {
    /// Stage 1: cell tracing.
    pub trace: StageDiagnostics,
    /// Stage 2: stitching all levels.
    pub stitch: StageDiagnostics,
    /// Stage 3: output packing.
    pub pack: StageDiagnostics,
    /// Per-level breakdown, in level order.
    pub levels: Vec<LevelDiagnostics>,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: ContourSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Cell tracing metrics.
    Trace {
        /// Which tracer was used.
        tracer: String,
        /// Number of grid cells visited (`(rows - 1) * (cols - 1)`).
        cell_count: usize,
        /// Number of levels traced.
        level_count: usize,
        /// Total segments emitted across all levels.
        segment_count: usize,
    },
    /// Stitching metrics.
    Stitch {
        /// Which stitcher was used.
        strategy: String,
        /// Total segments consumed.
        segment_count: usize,
        /// Total polylines produced.
        polyline_count: usize,
        /// Polylines whose endpoints coincide.
        closed_count: usize,
        /// Total points across all polylines.
        point_count: usize,
    },
    /// Output packing metrics.
    Pack {
        /// Length of each flat coordinate array.
        point_count: usize,
        /// Number of entries in the length table.
        polygon_count: usize,
    },
}

/// Counts for one contour level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDiagnostics {
    /// The level value.
    pub level: f64,
    /// Segments traced at this level.
    pub segment_count: usize,
    /// Polylines stitched from them.
    pub polyline_count: usize,
    /// How many of those polylines are closed.
    pub closed_count: usize,
    /// Total points across this level's polylines.
    pub point_count: usize,
}

/// High-level summary counts for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourSummary {
    /// Grid rows.
    pub rows: usize,
    /// Grid columns.
    pub cols: usize,
    /// Number of levels.
    pub level_count: usize,
    /// Segments traced across all levels.
    pub segment_count: usize,
    /// Polylines across all levels.
    pub polyline_count: usize,
    /// Points in the packed output.
    pub point_count: usize,
}

impl ContourDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Contour Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Grid: {}x{} ({} levels)",
            self.summary.rows, self.summary.cols, self.summary.level_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Trace", &self.trace),
            ("Stitch", &self.stitch),
            ("Pack", &self.pack),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        if !self.levels.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "{:<24} {:>10} {:>10} {:>10} {:>10}",
                "Level", "Segments", "Polylines", "Closed", "Points"
            ));
            lines.push("-".repeat(68));
            for level in &self.levels {
                lines.push(format!(
                    "{:<24} {:>10} {:>10} {:>10} {:>10}",
                    level.level,
                    level.segment_count,
                    level.polyline_count,
                    level.closed_count,
                    level.point_count,
                ));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "Segments: {}  |  Polylines: {}  |  Points: {}",
            self.summary.segment_count, self.summary.polyline_count, self.summary.point_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Trace {
            tracer,
            cell_count,
            level_count,
            segment_count,
        } => format!("{tracer} {cell_count} cells x {level_count} levels -> {segment_count} segs"),
        StageMetrics::Stitch {
            strategy,
            segment_count,
            polyline_count,
            closed_count,
            point_count,
        } => format!(
            "{strategy} {segment_count} segs -> {polyline_count} polys ({closed_count} closed), {point_count} pts",
        ),
        StageMetrics::Pack {
            point_count,
            polygon_count,
        } => format!("{polygon_count} polys, {point_count} pts"),
    }
}

/// Per-level counts from the stitched polylines.
fn level_diagnostics(
    level: f64,
    segment_count: usize,
    polylines: &[Polyline],
    tolerance: &Tolerance,
) -> LevelDiagnostics {
    LevelDiagnostics {
        level,
        segment_count,
        polyline_count: polylines.len(),
        closed_count: polylines.iter().filter(|p| p.is_closed(tolerance)).count(),
        point_count: polylines.iter().map(Polyline::len).sum(),
    }
}

/// Trace, stitch and pack, recording per-stage diagnostics.
///
/// Produces the same [`ContourResult`] as [`crate::trace_contours`].
///
/// # Errors
///
/// Returns the same validation errors as [`crate::trace_contours`]; no
/// diagnostics are produced on failure.
pub fn trace_contours_with_diagnostics<C: Clock>(
    grid: &ScalarGrid,
    levels: &[f64],
    config: &ContourConfig,
    clock: &C,
) -> Result<(ContourResult, ContourDiagnostics), ContourError> {
    let ctx = crate::prepare(grid, levels, config)?;
    let total_start = clock.now();

    // 1. Cell tracing.
    let start = clock.now();
    let stores = config.tracer.trace(grid, levels);
    let segment_counts: Vec<usize> = stores.iter().map(LevelSegmentStore::len).collect();
    let segment_total: usize = segment_counts.iter().sum();
    let trace = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Trace {
            tracer: format!("{:?}", config.tracer),
            cell_count: grid.rows.saturating_sub(1) * grid.cols.saturating_sub(1),
            level_count: levels.len(),
            segment_count: segment_total,
        },
    };

    // 2. Stitching.
    let start = clock.now();
    let polylines = stitch_levels(&config.stitcher, stores, &ctx);
    let level_diags: Vec<LevelDiagnostics> = levels
        .iter()
        .zip(&segment_counts)
        .zip(&polylines)
        .map(|((&level, &count), lines)| level_diagnostics(level, count, lines, &ctx.tolerance))
        .collect();
    let polyline_total: usize = level_diags.iter().map(|l| l.polyline_count).sum();
    let stitch = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Stitch {
            strategy: config.stitcher.name().to_string(),
            segment_count: segment_total,
            polyline_count: polyline_total,
            closed_count: level_diags.iter().map(|l| l.closed_count).sum(),
            point_count: level_diags.iter().map(|l| l.point_count).sum(),
        },
    };

    // 3. Packing.
    let start = clock.now();
    let packed = pack_polylines(&polylines);
    let pack = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Pack {
            point_count: packed.point_count(),
            polygon_count: packed.polygon_count,
        },
    };

    let summary = ContourSummary {
        rows: grid.rows,
        cols: grid.cols,
        level_count: levels.len(),
        segment_count: segment_total,
        polyline_count: polyline_total,
        point_count: packed.point_count(),
    };
    let diagnostics = ContourDiagnostics {
        trace,
        stitch,
        pack,
        levels: level_diags,
        total_duration: clock.elapsed(&total_start),
        summary,
    };
    let result = ContourResult {
        polylines,
        packed,
        tolerance: ctx.tolerance,
    };
    Ok((result, diagnostics))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::stitch::StitcherKind;

    /// Clock that advances one millisecond per reading.
    struct StepClock {
        ticks: Cell<u64>,
    }

    impl StepClock {
        const fn new() -> Self {
            Self {
                ticks: Cell::new(0),
            }
        }
    }

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn peak_grid() -> ScalarGrid {
        ScalarGrid::with_index_coords(
            3,
            3,
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        )
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn matches_plain_pipeline() {
        let grid = peak_grid();
        let config = ContourConfig::default();
        let (with_diag, _) =
            trace_contours_with_diagnostics(&grid, &[0.5], &config, &StepClock::new()).unwrap();
        let plain = crate::trace_contours(&grid, &[0.5], &config).unwrap();
        assert_eq!(with_diag, plain);
    }

    #[test]
    fn counts_per_level() {
        let (_, diag) = trace_contours_with_diagnostics(
            &peak_grid(),
            &[0.25, 0.5, 2.0],
            &ContourConfig::default(),
            &StepClock::new(),
        )
        .unwrap();
        assert_eq!(diag.levels.len(), 3);
        assert_eq!(diag.levels[1].segment_count, 8);
        assert_eq!(diag.levels[1].polyline_count, 1);
        assert_eq!(diag.levels[1].closed_count, 1);
        assert_eq!(diag.levels[2], LevelDiagnostics {
            level: 2.0,
            segment_count: 0,
            polyline_count: 0,
            closed_count: 0,
            point_count: 0,
        });
        assert_eq!(diag.summary.level_count, 3);
        assert_eq!(
            diag.summary.segment_count,
            diag.levels.iter().map(|l| l.segment_count).sum::<usize>()
        );
        assert!(diag.total_duration >= diag.trace.duration + diag.stitch.duration);
    }

    #[test]
    fn stitch_metrics_name_the_strategy() {
        let config = ContourConfig {
            stitcher: StitcherKind::VectorChain,
            ..ContourConfig::default()
        };
        let (_, diag) =
            trace_contours_with_diagnostics(&peak_grid(), &[0.5], &config, &StepClock::new())
                .unwrap();
        assert!(matches!(
            diag.stitch.metrics,
            StageMetrics::Stitch { ref strategy, .. } if strategy == "vector-chain"
        ));
    }

    #[test]
    fn invalid_input_produces_no_diagnostics() {
        let result = trace_contours_with_diagnostics(
            &peak_grid(),
            &[],
            &ContourConfig::default(),
            &StepClock::new(),
        );
        assert!(matches!(result, Err(ContourError::NoLevels)));
    }

    #[test]
    fn report_lists_stages_and_levels() {
        let (_, diag) = trace_contours_with_diagnostics(
            &peak_grid(),
            &[0.5],
            &ContourConfig::default(),
            &StepClock::new(),
        )
        .unwrap();
        let report = diag.report();
        assert!(report.contains("Contour Diagnostics Report"));
        assert!(report.contains("Trace"));
        assert!(report.contains("Stitch"));
        assert!(report.contains("greedy"));
        assert!(report.contains("Grid: 3x3 (1 levels)"));
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let stage = StageDiagnostics {
            duration: Duration::from_millis(1500),
            metrics: StageMetrics::Pack {
                point_count: 4,
                polygon_count: 1,
            },
        };
        let json = serde_json::to_value(&stage).unwrap();
        assert!((json["duration"].as_f64().unwrap() - 1.5).abs() < 1e-12);
        let back: StageDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration, Duration::from_millis(1500));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let json = serde_json::json!({
            "duration": -1.0,
            "metrics": { "Pack": { "point_count": 0, "polygon_count": 0 } }
        });
        assert!(serde_json::from_value::<StageDiagnostics>(json).is_err());
    }
}
