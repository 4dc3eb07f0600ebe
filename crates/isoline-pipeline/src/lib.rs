//! isoline-pipeline: contour tracing and segment stitching (sans-IO).
//!
//! Turns a rectangular grid of scalar samples into contour polylines
//! through:
//! validation -> cell tracing -> per-level segment stores ->
//! stitching (greedy or vector-chain) -> output packing.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! grids and returns owned result structs. File loading, image decoding
//! and SVG rendering live in `isoline-bench` and `isoline-export`.

pub mod contour;
pub mod diagnostics;
pub mod greedy;
pub mod pack;
pub mod stitch;
pub mod store;
pub mod types;
pub mod vector_chain;

pub use contour::{CellTracer, CellTracerKind};
pub use diagnostics::trace_contours_with_diagnostics;
pub use pack::{PackedContours, PackedSegments, pack_polylines, pack_segments};
pub use stitch::{ChainStitcher, StitchContext, StitcherKind, stitch_levels};
pub use store::LevelSegmentStore;
pub use types::{
    Axis, ContourConfig, ContourError, ContourResult, Point, Polyline, ScalarGrid, Segment,
    Tolerance,
};

/// Check a grid and its levels without doing any geometric work.
///
/// # Errors
///
/// Returns the first failing check of [`ScalarGrid::validate`], then of
/// [`types::validate_levels`].
pub fn validate(grid: &ScalarGrid, levels: &[f64]) -> Result<(), ContourError> {
    grid.validate()?;
    types::validate_levels(levels)
}

/// Validate everything and derive the per-invocation stitching context.
pub(crate) fn prepare(
    grid: &ScalarGrid,
    levels: &[f64],
    config: &ContourConfig,
) -> Result<StitchContext, ContourError> {
    validate(grid, levels)?;
    config.validate()?;
    let tolerance = Tolerance::from_coordinates(
        &grid.row_coords,
        &grid.col_coords,
        config.relative_tolerance,
    );
    log::debug!(
        "contouring {}x{} grid at {} levels (dx={:e}, dy={:e})",
        grid.rows,
        grid.cols,
        levels.len(),
        tolerance.dx,
        tolerance.dy,
    );
    Ok(StitchContext {
        tolerance,
        collinear_tolerance: config.collinear_tolerance,
    })
}

/// Trace raw segments without stitching them.
///
/// Every segment contributes its start and end point to the flat arrays;
/// `level_segment_counts` says how many segments each level produced.
///
/// # Errors
///
/// Returns a [`ContourError`] if the grid, levels or config are invalid.
pub fn trace_segments(
    grid: &ScalarGrid,
    levels: &[f64],
    config: &ContourConfig,
) -> Result<PackedSegments, ContourError> {
    prepare(grid, levels, config)?;
    let stores = config.tracer.trace(grid, levels);
    Ok(pack_segments(&stores))
}

/// Trace contours and stitch them into polylines.
///
/// # Pipeline steps
///
/// 1. Validate grid, levels and config; derive the coincidence tolerance
/// 2. Cell tracing into one segment store per level
/// 3. Stitching each level (pluggable strategy)
/// 4. Packing into flat arrays
///
/// Levels that the grid never crosses yield no polylines but still
/// occupy a slot in every per-level output.
///
/// # Errors
///
/// Returns a [`ContourError`] if the grid, levels or config are invalid.
/// Open polylines (contours leaving the grid) are not errors.
pub fn trace_contours(
    grid: &ScalarGrid,
    levels: &[f64],
    config: &ContourConfig,
) -> Result<ContourResult, ContourError> {
    let ctx = prepare(grid, levels, config)?;
    let stores = config.tracer.trace(grid, levels);
    let polylines = stitch_levels(&config.stitcher, stores, &ctx);
    let packed = pack_polylines(&polylines);
    Ok(ContourResult {
        polylines,
        packed,
        tolerance: ctx.tolerance,
    })
}
