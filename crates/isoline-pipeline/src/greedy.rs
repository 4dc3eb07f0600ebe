//! Greedy endpoint-adjacency stitching.
//!
//! Seeds a chain with an arbitrary segment, then repeatedly scans the
//! remaining segments from the front for one that touches either end of
//! the chain. Four cases are tried for each candidate, in order:
//!
//! 1. candidate start touches the back: append its end,
//! 2. candidate end touches the back: append its start,
//! 3. candidate start touches the front: prepend its end,
//! 4. candidate end touches the front: prepend its start.
//!
//! After every match the scan restarts from the front of the store. A
//! chain is finished when a full scan finds nothing. Each growth step may
//! scan the whole store, so the worst case is quadratic in the number of
//! segments per level.
//!
//! Every output point is an original segment endpoint; nothing is
//! re-derived or simplified.

use std::collections::VecDeque;

use crate::store::LevelSegmentStore;
use crate::types::{Point, Polyline, Segment, Tolerance};

/// Where a matched segment attaches to the growing chain, and which of
/// its endpoints becomes the new chain end.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Attach {
    Back(Point),
    Front(Point),
}

/// Decide whether `seg` extends a chain whose ends are `front` and `back`.
fn attachment(seg: &Segment, front: Point, back: Point, tolerance: &Tolerance) -> Option<Attach> {
    if tolerance.coincident(seg.start, back) {
        Some(Attach::Back(seg.end))
    } else if tolerance.coincident(seg.end, back) {
        Some(Attach::Back(seg.start))
    } else if tolerance.coincident(seg.start, front) {
        Some(Attach::Front(seg.end))
    } else if tolerance.coincident(seg.end, front) {
        Some(Attach::Front(seg.start))
    } else {
        None
    }
}

/// Stitch one level's segments by greedy endpoint matching.
///
/// Drains `store` completely. Returns chains in the order they were
/// seeded.
#[must_use = "returns the stitched polylines"]
pub fn stitch_greedy(mut store: LevelSegmentStore, tolerance: &Tolerance) -> Vec<Polyline> {
    let mut polylines = Vec::new();

    while let Some(seed) = store.consume_any() {
        let mut chain = VecDeque::from([seed.start, seed.end]);

        loop {
            // The chain always holds at least the seed's two points.
            let (Some(&front), Some(&back)) = (chain.front(), chain.back()) else {
                break;
            };
            let Some((_, attach)) =
                store.take_first_map(|seg| attachment(seg, front, back, tolerance))
            else {
                break;
            };
            match attach {
                Attach::Back(p) => chain.push_back(p),
                Attach::Front(p) => chain.push_front(p),
            }
        }

        log::trace!("greedy chain finished with {} points", chain.len());
        polylines.push(Polyline::new(chain.into()));
    }

    polylines
}
