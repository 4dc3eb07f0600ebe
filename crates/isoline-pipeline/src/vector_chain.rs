//! Vector-chain stitching with deferred merge and collinear condensation.
//!
//! A [`VectorChain`] stores a begin anchor, an end anchor and the
//! displacement vector of every segment it absorbed. Vectors are
//! differences of original segment coordinates, so growing, merging and
//! reversing chains never re-derives absolute points from tolerance
//! matches. Absolute points are only produced at the very end by walking
//! the vectors from the begin anchor.
//!
//! Per level the algorithm runs four phases:
//!
//! 1. **Sort** the segments by [`Segment::sort_key`] for a deterministic
//!    scan order.
//! 2. **Build**: pop the first segment, then repeatedly take the first
//!    segment whose *start* touches the chain's end. Reversed or
//!    front-attached neighbours are left for the merge phase.
//! 3. **Merge** chains whose anchors touch (tail-to-head, head-to-tail,
//!    tail-to-tail, head-to-head), restarting the pair scan after every
//!    merge.
//! 4. **Condense** consecutive vectors with equal slope into one.
//!
//! Build and merge are quadratic in the worst case; condensation is
//! linear in the number of vectors.

use crate::stitch::StitchContext;
use crate::store::LevelSegmentStore;
use crate::types::{Point, Polyline, Segment, Tolerance};

/// A displacement between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector {
    /// Displacement along the column axis.
    pub dx: f64,
    /// Displacement along the row axis.
    pub dy: f64,
}

impl Vector {
    /// Create a new vector.
    #[must_use]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Displacement from `from` to `to`.
    #[must_use]
    pub fn between(from: Point, to: Point) -> Self {
        Self {
            dx: to.x - from.x,
            dy: to.y - from.y,
        }
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.dx.mul_add(other.dx, self.dy * other.dy)
    }

    /// Component-wise sum.
    #[must_use]
    pub fn sum(self, other: Self) -> Self {
        Self {
            dx: self.dx + other.dx,
            dy: self.dy + other.dy,
        }
    }

    /// The same displacement in the opposite direction.
    #[must_use]
    pub fn negated(self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
        }
    }

    /// `point` moved by this displacement.
    #[must_use]
    pub fn apply(self, point: Point) -> Point {
        Point::new(point.x + self.dx, point.y + self.dy)
    }
}

/// Slopes of two vectors measured against a shared axis.
///
/// Uses `dy/dx` when both `dx` are non-zero, otherwise `dx/dy` when both
/// `dy` are non-zero. Returns `None` when neither axis works for both
/// vectors; such pairs are never condensed.
#[allow(clippy::float_cmp)]
fn paired_slopes(a: Vector, b: Vector) -> Option<(f64, f64)> {
    if a.dx != 0.0 && b.dx != 0.0 {
        Some((a.dy / a.dx, b.dy / b.dx))
    } else if a.dy != 0.0 && b.dy != 0.0 {
        Some((a.dx / a.dy, b.dx / b.dy))
    } else {
        None
    }
}

/// Returns `true` if `b` continues `a` in the same direction with a slope
/// differing by less than `difference`.
fn collinear(a: Vector, b: Vector, difference: f64) -> bool {
    paired_slopes(a, b).is_some_and(|(ma, mb)| (ma - mb).abs() < difference) && a.dot(b) > 0.0
}

/// A chain of displacement vectors anchored at both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorChain {
    begin: Point,
    end: Point,
    vectors: Vec<Vector>,
}

impl VectorChain {
    /// Start a chain from one segment.
    #[must_use]
    pub fn from_segment(segment: Segment) -> Self {
        Self {
            begin: segment.start,
            end: segment.end,
            vectors: vec![Vector::between(segment.start, segment.end)],
        }
    }

    /// Begin anchor.
    #[must_use]
    pub const fn begin(&self) -> Point {
        self.begin
    }

    /// End anchor.
    #[must_use]
    pub const fn end(&self) -> Point {
        self.end
    }

    /// Displacement vectors in traversal order.
    #[must_use]
    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    /// Append a segment that starts at (or near) the current end.
    ///
    /// The end anchor moves to the segment's end point.
    pub fn push_segment(&mut self, segment: Segment) {
        self.vectors
            .push(Vector::between(segment.start, segment.end));
        self.end = segment.end;
    }

    /// Append `other` after this chain; the end anchor becomes `other`'s.
    pub fn append(&mut self, other: Self) {
        self.vectors.extend(other.vectors);
        self.end = other.end;
    }

    /// Reverse traversal direction: swap anchors, reverse the vector order
    /// and negate every vector.
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.begin, &mut self.end);
        self.vectors.reverse();
        for v in &mut self.vectors {
            *v = v.negated();
        }
    }

    /// Merge consecutive collinear vectors in one pass.
    ///
    /// A merged vector is compared again with the vector that follows it,
    /// so a straight run of any length collapses into one vector. Running
    /// this twice never merges more than once. Returns the number of
    /// vectors removed.
    pub fn condense(&mut self, difference: f64) -> usize {
        let before = self.vectors.len();
        let mut condensed: Vec<Vector> = Vec::with_capacity(before);
        for v in self.vectors.drain(..) {
            match condensed.last_mut() {
                Some(last) if collinear(*last, v, difference) => *last = last.sum(v),
                _ => condensed.push(v),
            }
        }
        self.vectors = condensed;
        before - self.vectors.len()
    }

    /// Absolute points obtained by walking the vectors from the begin
    /// anchor.
    #[must_use]
    pub fn to_polyline(&self) -> Polyline {
        let mut points = Vec::with_capacity(self.vectors.len() + 1);
        let mut cursor = self.begin;
        points.push(cursor);
        for v in &self.vectors {
            cursor = v.apply(cursor);
            points.push(cursor);
        }
        Polyline::new(points)
    }
}

/// Build phase: grow chains by start-to-end matching over a sorted store.
///
/// Drains `store`.
#[must_use]
pub fn build_chains(mut store: LevelSegmentStore, tolerance: &Tolerance) -> Vec<VectorChain> {
    store.sort_by_anchor();
    let mut chains = Vec::new();

    while let Some(seed) = store.consume_any() {
        let mut chain = VectorChain::from_segment(seed);
        loop {
            let end = chain.end();
            let Some((next, ())) =
                store.take_first_map(|seg| tolerance.coincident(seg.start, end).then_some(()))
            else {
                break;
            };
            chain.push_segment(next);
        }
        chains.push(chain);
    }

    chains
}

/// Merge phase: join chains whose anchors touch until no pair does.
///
/// For each chain `i` and each later chain `j`, the first matching case
/// wins:
///
/// - `i.end ~ j.begin`: append `j` to `i`,
/// - `j.end ~ i.begin`: append `i` to `j`, the result replaces `i`,
/// - `i.end ~ j.end`: reverse `j`, append it to `i`,
/// - `i.begin ~ j.begin`: reverse `i`, append `j`.
///
/// Every merge removes `j` and restarts the scan at `i + 1`, since the
/// anchors of `i` changed. Returns the number of merges performed.
pub fn merge_chains(chains: &mut Vec<VectorChain>, tolerance: &Tolerance) -> usize {
    let mut merges = 0;
    let mut i = 0;
    while i < chains.len() {
        let mut j = i + 1;
        while j < chains.len() {
            let (a_begin, a_end) = (chains[i].begin(), chains[i].end());
            let (b_begin, b_end) = (chains[j].begin(), chains[j].end());

            let merged = if tolerance.coincident(a_end, b_begin) {
                let other = chains.remove(j);
                chains[i].append(other);
                true
            } else if tolerance.coincident(b_end, a_begin) {
                let mut other = chains.remove(j);
                std::mem::swap(&mut chains[i], &mut other);
                chains[i].append(other);
                true
            } else if tolerance.coincident(a_end, b_end) {
                let mut other = chains.remove(j);
                other.reverse();
                chains[i].append(other);
                true
            } else if tolerance.coincident(a_begin, b_begin) {
                let other = chains.remove(j);
                chains[i].reverse();
                chains[i].append(other);
                true
            } else {
                false
            };

            if merged {
                merges += 1;
                j = i + 1;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
    merges
}

/// Stitch one level's segments with the vector-chain algorithm.
#[must_use = "returns the stitched polylines"]
pub fn stitch_vector_chains(store: LevelSegmentStore, ctx: &StitchContext) -> Vec<Polyline> {
    let segment_count = store.len();
    let mut chains = build_chains(store, &ctx.tolerance);
    let built = chains.len();
    let merges = merge_chains(&mut chains, &ctx.tolerance);
    let condensed: usize = chains
        .iter_mut()
        .map(|c| c.condense(ctx.collinear_tolerance))
        .sum();
    log::debug!(
        "vector chains: {segment_count} segments -> {built} built, {merges} merges, \
         {condensed} vectors condensed"
    );
    chains.iter().map(VectorChain::to_polyline).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TOL: Tolerance = Tolerance::new(1e-4, 1e-4);
    const CTX: StitchContext = StitchContext {
        tolerance: TOL,
        collinear_tolerance: 1e-9,
    };

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    fn store(segments: &[Segment]) -> LevelSegmentStore {
        segments.iter().copied().collect()
    }

    fn chain(points: &[(f64, f64)]) -> VectorChain {
        let mut iter = points
            .windows(2)
            .map(|w| seg(w[0].0, w[0].1, w[1].0, w[1].1));
        let mut chain = VectorChain::from_segment(iter.next().unwrap());
        for s in iter {
            chain.push_segment(s);
        }
        chain
    }

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn build_follows_start_to_end_only() {
        // Second segment is reversed: the build phase must not attach it.
        let chains = build_chains(
            store(&[seg(0.0, 0.0, 1.0, 0.0), seg(2.0, 0.0, 1.0, 0.0)]),
            &TOL,
        );
        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn build_scans_in_sorted_order() {
        // Sorted by start row first: the (0,0) start is popped first even
        // though it was pushed last, and the chain grows through (1,0).
        let chains = build_chains(
            store(&[
                seg(2.0, 1.0, 3.0, 1.0),
                seg(1.0, 0.0, 2.0, 1.0),
                seg(0.0, 0.0, 1.0, 0.0),
            ]),
            &TOL,
        );
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].begin(), Point::new(0.0, 0.0));
        assert_eq!(chains[0].end(), Point::new(3.0, 1.0));
        assert_eq!(chains[0].vectors().len(), 3);
    }

    #[test]
    fn anchors_match_vector_sum() {
        let c = chain(&[(0.0, 0.0), (1.0, 0.5), (2.5, 0.5), (3.0, 2.0)]);
        let walked = c.to_polyline();
        assert_eq!(walked.first(), Some(&c.begin()));
        assert!(approx(*walked.last().unwrap(), c.end()));
    }

    #[test]
    fn merge_tail_to_head() {
        let mut chains = vec![chain(&[(0.0, 0.0), (1.0, 0.0)]), chain(&[(1.0, 0.0), (1.0, 1.0)])];
        assert_eq!(merge_chains(&mut chains, &TOL), 1);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].begin(), Point::new(0.0, 0.0));
        assert_eq!(chains[0].end(), Point::new(1.0, 1.0));
    }

    #[test]
    fn merge_head_to_tail() {
        let mut chains = vec![chain(&[(1.0, 0.0), (1.0, 1.0)]), chain(&[(0.0, 0.0), (1.0, 0.0)])];
        assert_eq!(merge_chains(&mut chains, &TOL), 1);
        assert_eq!(chains[0].begin(), Point::new(0.0, 0.0));
        assert_eq!(chains[0].end(), Point::new(1.0, 1.0));
    }

    #[test]
    fn merge_tail_to_tail_reverses_second() {
        let mut chains = vec![chain(&[(0.0, 0.0), (1.0, 0.0)]), chain(&[(1.0, 1.0), (1.0, 0.0)])];
        assert_eq!(merge_chains(&mut chains, &TOL), 1);
        assert_eq!(chains[0].begin(), Point::new(0.0, 0.0));
        assert_eq!(chains[0].end(), Point::new(1.0, 1.0));
        let points = chains[0].to_polyline();
        assert!(approx(points.points()[2], Point::new(1.0, 1.0)));
    }

    #[test]
    fn merge_head_to_head_reverses_first() {
        let mut chains = vec![chain(&[(1.0, 0.0), (0.0, 0.0)]), chain(&[(1.0, 0.0), (1.0, 1.0)])];
        assert_eq!(merge_chains(&mut chains, &TOL), 1);
        assert_eq!(chains[0].begin(), Point::new(0.0, 0.0));
        assert_eq!(chains[0].end(), Point::new(1.0, 1.0));
    }

    #[test]
    fn merges_cascade_into_closed_loop() {
        // Unit square split into four chains with mixed directions.
        let mut chains = vec![
            chain(&[(0.0, 0.0), (1.0, 0.0)]),
            chain(&[(1.0, 1.0), (0.0, 1.0)]),
            chain(&[(0.0, 0.0), (0.0, 1.0)]),
            chain(&[(1.0, 1.0), (1.0, 0.0)]),
        ];
        let merges = merge_chains(&mut chains, &TOL);
        assert_eq!(merges, 3);
        assert_eq!(chains.len(), 1);
        assert!(TOL.coincident(chains[0].begin(), chains[0].end()));
        assert_eq!(chains[0].vectors().len(), 4);
    }

    #[test]
    fn reverse_negates_and_reorders() {
        let mut c = chain(&[(0.0, 0.0), (1.0, 0.0), (1.0, 2.0)]);
        c.reverse();
        assert_eq!(c.begin(), Point::new(1.0, 2.0));
        assert_eq!(c.end(), Point::new(0.0, 0.0));
        assert_eq!(c.vectors(), &[Vector::new(0.0, -2.0), Vector::new(-1.0, 0.0)]);
    }

    #[test]
    fn reversed_closed_loop_remerges_to_same_point_set() {
        let square = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)];
        let original = chain(&square);
        let mut reversed = original.clone();
        reversed.reverse();
        assert_eq!(reversed.begin(), original.end());
        assert_eq!(reversed.end(), original.begin());

        // Split the reversed loop and merge it back.
        let half = chain(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let other_half = chain(&[(1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        let mut chains = vec![other_half, half];
        merge_chains(&mut chains, &TOL);
        assert_eq!(chains.len(), 1);
        let remerged = chains[0].to_polyline();
        let expected = reversed.to_polyline();
        for p in expected.points() {
            assert!(remerged.points().iter().any(|q| approx(*p, *q)));
        }
        assert!(TOL.coincident(chains[0].begin(), chains[0].end()));
    }

    #[test]
    fn condense_merges_straight_runs() {
        let mut c = chain(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (3.0, 4.0)]);
        let removed = c.condense(1e-9);
        assert_eq!(removed, 2);
        assert_eq!(c.vectors(), &[Vector::new(3.0, 3.0), Vector::new(0.0, 1.0)]);
    }

    #[test]
    fn condense_uses_row_axis_for_vertical_runs() {
        let mut c = chain(&[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)]);
        assert_eq!(c.condense(1e-9), 1);
        assert_eq!(c.vectors(), &[Vector::new(0.0, 2.0)]);
    }

    #[test]
    fn condense_skips_pairs_without_shared_axis() {
        // Horizontal then vertical: no axis is non-zero in both.
        let mut c = chain(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert_eq!(c.condense(1e-9), 0);
        assert_eq!(c.vectors().len(), 2);
    }

    #[test]
    fn condense_does_not_fold_backtracking() {
        let mut c = chain(&[(0.0, 0.0), (2.0, 0.0), (1.0, 0.0)]);
        assert_eq!(c.condense(1e-9), 0);
    }

    #[test]
    fn condense_is_idempotent() {
        let mut c = chain(&[
            (0.0, 0.0),
            (1.0, 0.5),
            (2.0, 1.0),
            (2.5, 2.0),
            (3.0, 3.0),
            (3.0, 4.0),
            (3.0, 5.0),
        ]);
        c.condense(1e-9);
        let once = c.clone();
        assert_eq!(c.condense(1e-9), 0);
        assert_eq!(c, once);
        assert_eq!(c.vectors().len(), 3);
    }

    #[test]
    fn stitch_square_outline_condenses_to_corners() {
        // A 2x2 square traced as eight unit edges, shuffled and flipped.
        let segments = [
            seg(1.0, 0.0, 2.0, 0.0),
            seg(2.0, 2.0, 2.0, 1.0),
            seg(0.0, 0.0, 1.0, 0.0),
            seg(0.0, 2.0, 1.0, 2.0),
            seg(2.0, 0.0, 2.0, 1.0),
            seg(0.0, 1.0, 0.0, 0.0),
            seg(2.0, 2.0, 1.0, 2.0),
            seg(0.0, 2.0, 0.0, 1.0),
        ];
        let result = stitch_vector_chains(store(&segments), &CTX);
        assert_eq!(result.len(), 1);
        let square = &result[0];
        assert!(square.is_closed(&TOL));
        // Four corners plus the repeated closing point, at most one extra
        // point where the loop starts mid-edge.
        assert!(square.len() <= 6, "got {} points", square.len());
        assert!(square.len() >= 5);
    }

    #[test]
    fn every_segment_contributes_before_condensing() {
        let segments = [
            seg(0.0, 0.0, 1.0, 0.0),
            seg(2.0, 0.5, 1.0, 0.0),
            seg(5.0, 5.0, 6.0, 6.0),
            seg(2.0, 0.5, 3.0, 3.0),
        ];
        let mut chains = build_chains(store(&segments), &TOL);
        merge_chains(&mut chains, &TOL);
        let vectors: usize = chains.iter().map(|c| c.vectors().len()).sum();
        assert_eq!(vectors, segments.len());
        assert_eq!(chains.len(), 2);
    }
}
