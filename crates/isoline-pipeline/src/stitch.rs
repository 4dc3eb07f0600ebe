//! Stitching: reconstruct ordered polylines from unordered segments.
//!
//! The cell tracer emits each level's contour as a bag of disconnected
//! two-point segments. This module defines the [`ChainStitcher`] trait for
//! pluggable stitching algorithms and the [`StitcherKind`] enum for
//! selecting one at runtime.
//!
//! # Strategy pattern
//!
//! Both algorithms consume every segment of a level exactly once and
//! differ only in how they grow chains and in how many points they emit.
//! The trait/enum split keeps the choice a configuration value while the
//! algorithms themselves live in [`crate::greedy`] and
//! [`crate::vector_chain`].

use serde::{Deserialize, Serialize};

use crate::store::LevelSegmentStore;
use crate::types::{Polyline, Tolerance};
use crate::{greedy, vector_chain};

/// Selects which stitching algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StitcherKind {
    /// Grow each chain at both ends by rescanning the remaining segments
    /// for an endpoint match.
    ///
    /// Correctness-first: every output point is an original segment
    /// endpoint. Quadratic in the segment count of a level.
    #[default]
    Greedy,

    /// Build chains of displacement vectors from a sorted scan, merge
    /// chains that share an endpoint, then condense collinear vectors.
    ///
    /// Emits fewer points on straight runs. Also quadratic in the worst
    /// case.
    VectorChain,
}

impl StitcherKind {
    /// Short human-readable name, used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::VectorChain => "vector-chain",
        }
    }
}

/// Per-invocation parameters shared by every stitching call.
///
/// Built once at the pipeline entry point and passed by reference, so all
/// levels of one invocation compare points the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StitchContext {
    /// Coincidence thresholds for endpoint matching.
    pub tolerance: Tolerance,
    /// Slope tolerance for vector condensation.
    pub collinear_tolerance: f64,
}

/// Trait for stitching strategies.
///
/// Input: the segment store of one level (consumed).
/// Output: polylines such that every input segment contributes exactly
/// one edge. A polyline whose first and last points coincide is closed.
pub trait ChainStitcher {
    /// Stitch one level's segments into polylines.
    fn stitch(&self, store: LevelSegmentStore, ctx: &StitchContext) -> Vec<Polyline>;
}

impl ChainStitcher for StitcherKind {
    fn stitch(&self, store: LevelSegmentStore, ctx: &StitchContext) -> Vec<Polyline> {
        match *self {
            Self::Greedy => greedy::stitch_greedy(store, &ctx.tolerance),
            Self::VectorChain => vector_chain::stitch_vector_chains(store, ctx),
        }
    }
}

/// Stitch every level, preserving level order.
///
/// Empty stores yield empty polyline lists.
pub fn stitch_levels<S: ChainStitcher + ?Sized>(
    stitcher: &S,
    stores: Vec<LevelSegmentStore>,
    ctx: &StitchContext,
) -> Vec<Vec<Polyline>> {
    stores
        .into_iter()
        .enumerate()
        .map(|(level, store)| {
            let segment_count = store.len();
            let polylines = stitcher.stitch(store, ctx);
            log::debug!(
                "level {level}: stitched {segment_count} segments into {} polylines",
                polylines.len()
            );
            polylines
        })
        .collect()
}
