//! Output packing: flatten per-level results into parallel arrays.
//!
//! Consumers outside Rust (plotting front ends, array libraries) want
//! contours as flat coordinate buffers plus length tables rather than
//! nested vectors. Both packers enumerate level-major, then
//! polyline-major (or segment-major), then point order, and never mutate
//! their input.

use serde::{Deserialize, Serialize};

use crate::store::LevelSegmentStore;
use crate::types::Polyline;

/// Stitched contours as flat buffers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackedContours {
    /// X (column) coordinate of every point of every polyline.
    pub x: Vec<f64>,
    /// Y (row) coordinate of every point, parallel to `x`.
    pub y: Vec<f64>,
    /// Point count of each polyline, in enumeration order.
    pub lengths: Vec<usize>,
    /// Total number of polylines across all levels.
    pub polygon_count: usize,
    /// Number of polylines contributed by each level.
    pub level_polygon_counts: Vec<usize>,
}

impl PackedContours {
    /// Number of levels, including levels with no polylines.
    #[must_use]
    pub const fn level_count(&self) -> usize {
        self.level_polygon_counts.len()
    }

    /// Total number of points.
    #[must_use]
    pub const fn point_count(&self) -> usize {
        self.x.len()
    }
}

/// Raw, unstitched segments as flat buffers.
///
/// Each segment contributes two consecutive points: start, then end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackedSegments {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Number of segments traced at each level.
    pub level_segment_counts: Vec<usize>,
}

impl PackedSegments {
    /// Number of levels, including levels with no segments.
    #[must_use]
    pub const fn level_count(&self) -> usize {
        self.level_segment_counts.len()
    }

    /// Total number of segments.
    #[must_use]
    pub const fn segment_count(&self) -> usize {
        self.x.len() / 2
    }
}

/// Flatten stitched polylines grouped by level.
#[must_use]
pub fn pack_polylines(levels: &[Vec<Polyline>]) -> PackedContours {
    let point_total: usize = levels.iter().flatten().map(Polyline::len).sum();
    let polygon_count: usize = levels.iter().map(Vec::len).sum();

    let mut packed = PackedContours {
        x: Vec::with_capacity(point_total),
        y: Vec::with_capacity(point_total),
        lengths: Vec::with_capacity(polygon_count),
        polygon_count,
        level_polygon_counts: Vec::with_capacity(levels.len()),
    };

    for polylines in levels {
        packed.level_polygon_counts.push(polylines.len());
        for polyline in polylines {
            packed.lengths.push(polyline.len());
            for p in polyline.points() {
                packed.x.push(p.x);
                packed.y.push(p.y);
            }
        }
    }

    packed
}

/// Flatten raw segment stores without stitching.
#[must_use]
pub fn pack_segments(stores: &[LevelSegmentStore]) -> PackedSegments {
    let point_total = 2 * stores.iter().map(LevelSegmentStore::len).sum::<usize>();
    let mut packed = PackedSegments {
        x: Vec::with_capacity(point_total),
        y: Vec::with_capacity(point_total),
        level_segment_counts: Vec::with_capacity(stores.len()),
    };

    for store in stores {
        packed.level_segment_counts.push(store.len());
        for seg in store.segments() {
            packed.x.extend([seg.start.x, seg.end.x]);
            packed.y.extend([seg.start.y, seg.end.y]);
        }
    }

    packed
}
