//! Per-level segment store: the tracer's raw output for one contour level.
//!
//! Segments are removed as they are absorbed into chains, so once a
//! stitcher has drained a store every segment has been used exactly once.
//! All lookups scan from the front of the store and remove what they
//! return; callers that want "restart the scan after every removal"
//! semantics get them by simply calling again.

use crate::types::{Point, Segment, Tolerance};

/// Mutable collection of not-yet-consumed segments for one level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelSegmentStore {
    segments: Vec<Segment>,
}

impl LevelSegmentStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Append a segment.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Number of remaining segments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if every segment has been consumed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Remaining segments in store order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Consume the store, returning the remaining segments.
    #[must_use]
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Remove and return the first available segment.
    ///
    /// Returns `None` only when the store is exhausted.
    pub fn consume_any(&mut self) -> Option<Segment> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self.segments.remove(0))
        }
    }

    /// Remove and return the first segment with either endpoint coincident
    /// with `endpoint`.
    ///
    /// When several segments match, the one earliest in store order wins.
    pub fn find_match(&mut self, endpoint: Point, tolerance: &Tolerance) -> Option<Segment> {
        self.take_first_map(|seg| {
            (tolerance.coincident(seg.start, endpoint) || tolerance.coincident(seg.end, endpoint))
                .then_some(())
        })
        .map(|(seg, ())| seg)
    }

    /// Scan from the front and remove the first segment for which `f`
    /// returns `Some`, returning the segment together with that value.
    ///
    /// Segments before the match keep their relative order, so repeated
    /// calls see the same prefix again.
    pub fn take_first_map<T, F>(&mut self, mut f: F) -> Option<(Segment, T)>
    where
        F: FnMut(&Segment) -> Option<T>,
    {
        let (idx, value) = self
            .segments
            .iter()
            .enumerate()
            .find_map(|(idx, seg)| f(seg).map(|value| (idx, value)))?;
        Some((self.segments.remove(idx), value))
    }

    /// Stable-sort the remaining segments by [`Segment::sort_key`].
    pub fn sort_by_anchor(&mut self) {
        self.segments
            .sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
    }
}

impl FromIterator<Segment> for LevelSegmentStore {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl Extend<Segment> for LevelSegmentStore {
    fn extend<I: IntoIterator<Item = Segment>>(&mut self, iter: I) {
        self.segments.extend(iter);
    }
}
