//! Shared types for the isoline contour pipeline.

use serde::{Deserialize, Serialize};

use crate::contour::CellTracerKind;
use crate::pack::PackedContours;
use crate::stitch::StitcherKind;

/// A 2D point in grid coordinates.
///
/// Exact equality (`PartialEq`) compares bit-for-bit values and exists for
/// tests and serde round trips. Stitching always compares points through
/// a [`Tolerance`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Column coordinate.
    pub x: f64,
    /// Row coordinate.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Per-axis thresholds under which two coordinates are treated as equal.
///
/// Two points are *coincident* when both `|a.x - b.x| < dx` and
/// `|a.y - b.y| < dy`. The test is pairwise and therefore not transitive:
/// `a ~ b` and `b ~ c` do not imply `a ~ c`.
///
/// A `Tolerance` is derived once per pipeline invocation from the grid's
/// coordinate spacing and passed by value to everything that compares
/// points, so all comparisons within one invocation agree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Threshold along the column (x) axis.
    pub dx: f64,
    /// Threshold along the row (y) axis.
    pub dy: f64,
}

impl Tolerance {
    /// Smallest threshold ever used for an axis.
    ///
    /// Applies when an axis has fewer than two coordinates (no spacing to
    /// derive from) or when the derived threshold is zero or not finite.
    /// Without a floor, a zero threshold would make even identical points
    /// non-coincident under the strict `<` comparison.
    pub const MIN_THRESHOLD: f64 = 1e-12;

    /// Create a tolerance with explicit thresholds.
    #[must_use]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Derive thresholds from the spacing of the first two coordinates of
    /// each axis, scaled by `relative`.
    ///
    /// With `relative = 1e-4` and unit spacing both thresholds are `1e-4`.
    #[must_use]
    pub fn from_coordinates(row_coords: &[f64], col_coords: &[f64], relative: f64) -> Self {
        Self {
            dx: axis_threshold(col_coords, relative),
            dy: axis_threshold(row_coords, relative),
        }
    }

    /// Returns `true` if `a` and `b` are within tolerance on both axes.
    #[must_use]
    pub fn coincident(&self, a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < self.dx && (a.y - b.y).abs() < self.dy
    }
}

/// Threshold for one axis: `relative * |c[1] - c[0]|`, floored at
/// [`Tolerance::MIN_THRESHOLD`].
fn axis_threshold(coords: &[f64], relative: f64) -> f64 {
    match coords {
        [first, second, ..] => {
            let threshold = relative * (second - first).abs();
            if threshold.is_finite() && threshold >= Tolerance::MIN_THRESHOLD {
                threshold
            } else {
                Tolerance::MIN_THRESHOLD
            }
        }
        _ => Tolerance::MIN_THRESHOLD,
    }
}

/// A line fragment emitted by the cell tracer for one level.
///
/// The endpoints are ordered as emitted, but matching treats a segment as
/// undirected: either endpoint may connect to either endpoint of another
/// segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First endpoint as emitted by the tracer.
    pub start: Point,
    /// Second endpoint as emitted by the tracer.
    pub end: Point,
}

impl Segment {
    /// Weight that lets the row coordinate dominate [`sort_key`](Self::sort_key).
    const ROW_WEIGHT: f64 = 4_294_967_295.0;

    /// Create a new segment.
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Scan-order key of the segment's start point.
    ///
    /// Combines both coordinates with the row coordinate weighted to
    /// dominate. Only meant to give a deterministic order, not a geometric
    /// one.
    #[must_use]
    pub fn sort_key(&self) -> f64 {
        self.start.y.mul_add(Self::ROW_WEIGHT, self.start.x)
    }
}

/// An ordered sequence of points: one reconstructed contour.
///
/// A polyline is closed when its first and last points are coincident;
/// closure is never stored separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of edges between consecutive points.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns `true` if the polyline has at least one edge and its first
    /// and last points are coincident under `tolerance`.
    #[must_use]
    pub fn is_closed(&self, tolerance: &Tolerance) -> bool {
        match (self.0.first(), self.0.last()) {
            (Some(&first), Some(&last)) if self.0.len() > 1 => tolerance.coincident(first, last),
            _ => false,
        }
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Grid axis, used to report which coordinate array is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Row axis (major index, y coordinates).
    Rows,
    /// Column axis (minor index, x coordinates).
    Columns,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rows => f.write_str("row"),
            Self::Columns => f.write_str("column"),
        }
    }
}

/// A rectangular grid of scalar samples with coordinates for each axis.
///
/// Values are row-major: the sample at row `i`, column `j` is
/// `values[i * cols + j]`, located at `(col_coords[j], row_coords[i])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarGrid {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row-major samples, `rows * cols` long.
    pub values: Vec<f64>,
    /// Coordinate of each row (y axis).
    pub row_coords: Vec<f64>,
    /// Coordinate of each column (x axis).
    pub col_coords: Vec<f64>,
}

impl ScalarGrid {
    /// Create a grid whose coordinates are the row and column indices.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn with_index_coords(rows: usize, cols: usize, values: Vec<f64>) -> Self {
        Self {
            rows,
            cols,
            values,
            row_coords: (0..rows).map(|i| i as f64).collect(),
            col_coords: (0..cols).map(|j| j as f64).collect(),
        }
    }

    /// Sample at row `i`, column `j`, or `None` when out of range.
    #[must_use]
    pub fn value(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.rows && j < self.cols {
            self.values.get(i * self.cols + j).copied()
        } else {
            None
        }
    }

    /// Smallest and largest finite sample, or `None` if there are none.
    #[must_use]
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Check that the grid's dimensions and coordinate arrays agree.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError::EmptyCoordinates`] if either coordinate
    /// array is empty, [`ContourError::DimensionMismatch`] if a coordinate
    /// array's length differs from the matching grid dimension, and
    /// [`ContourError::ValueCount`] if `values` is not `rows * cols` long.
    pub fn validate(&self) -> Result<(), ContourError> {
        if self.row_coords.is_empty() {
            return Err(ContourError::EmptyCoordinates { axis: Axis::Rows });
        }
        if self.col_coords.is_empty() {
            return Err(ContourError::EmptyCoordinates {
                axis: Axis::Columns,
            });
        }
        if self.row_coords.len() != self.rows {
            return Err(ContourError::DimensionMismatch {
                axis: Axis::Rows,
                grid: self.rows,
                coords: self.row_coords.len(),
            });
        }
        if self.col_coords.len() != self.cols {
            return Err(ContourError::DimensionMismatch {
                axis: Axis::Columns,
                grid: self.cols,
                coords: self.col_coords.len(),
            });
        }
        let expected = self.rows.saturating_mul(self.cols);
        if self.values.len() != expected {
            return Err(ContourError::ValueCount {
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }
}

/// Check that contour levels are non-empty, finite and strictly increasing.
///
/// # Errors
///
/// Returns [`ContourError::NoLevels`] for an empty slice and
/// [`ContourError::InvalidLevels`] for non-finite or non-increasing values.
pub fn validate_levels(levels: &[f64]) -> Result<(), ContourError> {
    if levels.is_empty() {
        return Err(ContourError::NoLevels);
    }
    if let Some(idx) = levels.iter().position(|v| !v.is_finite()) {
        return Err(ContourError::InvalidLevels(format!(
            "level {idx} is not finite"
        )));
    }
    if let Some(idx) = levels.windows(2).position(|w| w[1] <= w[0]) {
        return Err(ContourError::InvalidLevels(format!(
            "level {} ({}) does not exceed level {idx} ({})",
            idx + 1,
            levels[idx + 1],
            levels[idx],
        )));
    }
    Ok(())
}

/// Configuration for a contour pipeline invocation.
///
/// Defaults: CONREC tracing, greedy stitching, a coincidence tolerance of `1e-4`
/// times the grid spacing, and a collinearity tolerance of `1e-9`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Which cell tracing algorithm turns grid cells into segments.
    pub tracer: CellTracerKind,

    /// Which algorithm stitches segments into polylines.
    pub stitcher: StitcherKind,

    /// Coincidence threshold as a fraction of the grid spacing on each
    /// axis.
    pub relative_tolerance: f64,

    /// Maximum slope difference for two consecutive displacement vectors
    /// to be condensed into one. Only used by
    /// [`StitcherKind::VectorChain`].
    pub collinear_tolerance: f64,
}

impl ContourConfig {
    /// Default relative coincidence tolerance.
    pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-4;
    /// Default collinearity tolerance for vector condensation.
    pub const DEFAULT_COLLINEAR_TOLERANCE: f64 = 1e-9;

    /// Check that both tolerances are finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), ContourError> {
        if !(self.relative_tolerance.is_finite() && self.relative_tolerance > 0.0) {
            return Err(ContourError::InvalidConfig(format!(
                "relative_tolerance must be finite and positive, got {}",
                self.relative_tolerance
            )));
        }
        if !(self.collinear_tolerance.is_finite() && self.collinear_tolerance > 0.0) {
            return Err(ContourError::InvalidConfig(format!(
                "collinear_tolerance must be finite and positive, got {}",
                self.collinear_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            tracer: CellTracerKind::default(),
            stitcher: StitcherKind::default(),
            relative_tolerance: Self::DEFAULT_RELATIVE_TOLERANCE,
            collinear_tolerance: Self::DEFAULT_COLLINEAR_TOLERANCE,
        }
    }
}

/// Result of tracing and stitching contours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourResult {
    /// Stitched polylines, one inner vector per level in level order.
    pub polylines: Vec<Vec<Polyline>>,

    /// The same polylines flattened into parallel coordinate arrays.
    pub packed: PackedContours,

    /// Coincidence tolerance used for this invocation.
    pub tolerance: Tolerance,
}

impl ContourResult {
    /// Number of levels (always equals the number of requested levels).
    #[must_use]
    pub const fn level_count(&self) -> usize {
        self.polylines.len()
    }

    /// Total number of polylines across all levels.
    #[must_use]
    pub fn polyline_count(&self) -> usize {
        self.polylines.iter().map(Vec::len).sum()
    }
}

/// Errors that can occur before any geometric work is done.
///
/// All of these are input validation failures: on error no partial
/// output is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum ContourError {
    /// A coordinate array's length differs from the grid dimension.
    #[error("{axis} coordinates have {coords} entries but the grid has {grid}")]
    DimensionMismatch {
        /// Which axis disagrees.
        axis: Axis,
        /// Grid dimension along `axis`.
        grid: usize,
        /// Length of the coordinate array.
        coords: usize,
    },

    /// The value array is not `rows * cols` long.
    #[error("grid has {actual} values, expected {expected}")]
    ValueCount {
        /// `rows * cols`.
        expected: usize,
        /// Length of the value array.
        actual: usize,
    },

    /// A coordinate array is empty.
    #[error("{axis} coordinates are empty")]
    EmptyCoordinates {
        /// Which axis is empty.
        axis: Axis,
    },

    /// No contour levels were requested.
    #[error("at least one contour level is required")]
    NoLevels,

    /// Levels are not finite and strictly increasing.
    #[error("invalid contour levels: {0}")]
    InvalidLevels(String),

    /// Pipeline configuration is invalid.
    #[error("invalid contour configuration: {0}")]
    InvalidConfig(String),
}
