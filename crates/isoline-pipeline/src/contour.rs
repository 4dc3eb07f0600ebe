//! Cell tracing: find level crossings in a scalar grid as raw segments.
//!
//! This module defines the [`CellTracer`] trait for pluggable cell-by-cell
//! tracing algorithms and the [`CellTracerKind`] enum for selecting one at
//! runtime. A tracer only emits disconnected two-point segments, one bag
//! per level; ordering them into polylines is the job of
//! [`crate::stitch`].

use serde::{Deserialize, Serialize};

use crate::store::LevelSegmentStore;
use crate::types::{Point, ScalarGrid, Segment};

/// Selects which cell tracing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellTracerKind {
    /// Paul Bourke's CONREC: each cell is split into four triangles around
    /// its centre and every triangle contributes at most one segment per
    /// level.
    ///
    /// Segments come out in cell order with arbitrary direction, and
    /// neighbouring cells emit separately computed (but coincident)
    /// endpoints, which is why stitching compares points under a
    /// tolerance.
    #[default]
    Conrec,
}

/// Trait for cell tracing strategies.
///
/// Input: a validated grid and validated (finite, strictly increasing)
/// levels. Output: exactly one store per level, in level order.
pub trait CellTracer {
    /// Trace level crossings of every cell.
    fn trace(&self, grid: &ScalarGrid, levels: &[f64]) -> Vec<LevelSegmentStore>;
}

impl CellTracer for CellTracerKind {
    fn trace(&self, grid: &ScalarGrid, levels: &[f64]) -> Vec<LevelSegmentStore> {
        match *self {
            Self::Conrec => trace_conrec(grid, levels),
        }
    }
}

/// Segment shape for each combination of triangle vertex signs.
///
/// Indexed by `[sign(v1)][sign(v2)][sign(v3)]` with signs mapped
/// below/on/above the level to `0/1/2`. Cases: `1..=3` run along a
/// triangle edge between two vertices on the level, `4..=6` from a vertex
/// on the level to the opposite side, `7..=9` between two crossed sides.
const CASE_TABLE: [[[u8; 3]; 3]; 3] = [
    [[0, 0, 8], [0, 2, 5], [7, 6, 9]],
    [[0, 3, 4], [1, 3, 1], [4, 3, 0]],
    [[9, 6, 7], [5, 2, 0], [8, 0, 0]],
];

/// `(row, column)` offsets of cell corners 1 through 4.
const CORNERS: [(usize, usize); 4] = [(0, 0), (1, 0), (1, 1), (0, 1)];

/// The four corner values of cell `(i, j)`, or `None` if any is missing
/// or not finite.
fn cell_corners(grid: &ScalarGrid, i: usize, j: usize) -> Option<[f64; 4]> {
    let mut corners = [0.0; 4];
    for (slot, &(di, dj)) in corners.iter_mut().zip(&CORNERS) {
        let value = grid.value(i + di, j + dj)?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }
    Some(corners)
}

/// Map `value - level` to a case-table index.
const fn sign_index(h: f64) -> usize {
    if h > 0.0 {
        2
    } else if h < 0.0 {
        0
    } else {
        1
    }
}

/// Triangle-fan geometry of one cell relative to one level.
///
/// Index 0 is the cell centre, `1..=4` the corners.
struct CellFan {
    h: [f64; 5],
    pos: [Point; 5],
}

impl CellFan {
    /// Point on the side `p1`-`p2` where the interpolated value equals the
    /// level.
    fn intersect(&self, p1: usize, p2: usize) -> Point {
        let (h1, h2) = (self.h[p1], self.h[p2]);
        let (a, b) = (self.pos[p1], self.pos[p2]);
        let denom = h2 - h1;
        Point::new(
            h2.mul_add(a.x, -(h1 * b.x)) / denom,
            h2.mul_add(a.y, -(h1 * b.y)) / denom,
        )
    }

    /// Segment emitted by triangle `(m1, 0, m3)`, if the level crosses it.
    fn triangle_segment(&self, m1: usize, m3: usize) -> Option<Segment> {
        let m2 = 0;
        let case = CASE_TABLE[sign_index(self.h[m1])][sign_index(self.h[m2])]
            [sign_index(self.h[m3])];
        let (start, end) = match case {
            1 => (self.pos[m1], self.pos[m2]),
            2 => (self.pos[m2], self.pos[m3]),
            3 => (self.pos[m3], self.pos[m1]),
            4 => (self.pos[m1], self.intersect(m2, m3)),
            5 => (self.pos[m2], self.intersect(m3, m1)),
            6 => (self.pos[m3], self.intersect(m1, m2)),
            7 => (self.intersect(m1, m2), self.intersect(m2, m3)),
            8 => (self.intersect(m2, m3), self.intersect(m3, m1)),
            9 => (self.intersect(m3, m1), self.intersect(m1, m2)),
            _ => return None,
        };
        Some(Segment::new(start, end))
    }
}

/// CONREC contouring.
///
/// Cells are visited column by column from the last column to the first,
/// rows in increasing order within each column. Cells with a non-finite
/// corner are skipped.
fn trace_conrec(grid: &ScalarGrid, levels: &[f64]) -> Vec<LevelSegmentStore> {
    let mut stores = vec![LevelSegmentStore::new(); levels.len()];
    let (Some(&lowest), Some(&highest)) = (levels.first(), levels.last()) else {
        return stores;
    };
    if grid.rows < 2 || grid.cols < 2 {
        return stores;
    }

    for j in (0..grid.cols - 1).rev() {
        for i in 0..grid.rows - 1 {
            let Some(corners) = cell_corners(grid, i, j) else {
                continue;
            };
            let dmin = corners.iter().copied().fold(f64::INFINITY, f64::min);
            let dmax = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if dmax < lowest || dmin > highest {
                continue;
            }

            let (x0, x1) = (grid.col_coords[j], grid.col_coords[j + 1]);
            let (y0, y1) = (grid.row_coords[i], grid.row_coords[i + 1]);
            let corner_pos = CORNERS.map(|(di, dj)| {
                Point::new(
                    if dj == 0 { x0 } else { x1 },
                    if di == 0 { y0 } else { y1 },
                )
            });
            let centre = Point::new(0.5 * (x0 + x1), 0.5 * (y0 + y1));
            let mean = 0.25 * corners.iter().sum::<f64>();

            for (store, &level) in stores.iter_mut().zip(levels) {
                if level < dmin || level > dmax {
                    continue;
                }
                let fan = CellFan {
                    h: [
                        mean - level,
                        corners[0] - level,
                        corners[1] - level,
                        corners[2] - level,
                        corners[3] - level,
                    ],
                    pos: [
                        centre,
                        corner_pos[0],
                        corner_pos[1],
                        corner_pos[2],
                        corner_pos[3],
                    ],
                };
                for m1 in 1..=4 {
                    let m3 = if m1 == 4 { 1 } else { m1 + 1 };
                    if let Some(segment) = fan.triangle_segment(m1, m3) {
                        store.push(segment);
                    }
                }
            }
        }
    }

    stores
}
