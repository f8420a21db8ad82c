//! # Coverage interval index
//!
//! Per-identifier index of the time windows for which exact ephemeris data is
//! loaded. Two structures are kept in lockstep for every identifier:
//!
//! - the **windows** themselves, in arrival order — windows are never merged,
//!   deduplicated, or pruned, even when overlapping or contiguous;
//! - the **boundary set**, a sorted set of every window start and end
//!   instant, used for nearest-boundary and bracketing-boundary search by the
//!   estimation path.
//!
//! Containment is **strict-open**: an instant exactly equal to a window
//! boundary is not covered by that window, but it is a legitimate evaluation
//! anchor for the estimation path.
//!
//! Entries accumulate for the lifetime of the index; unloading the kernel
//! that produced them does not remove them. Callers that want a clean slate
//! for an identifier use [`CoverageIndex::forget`].

use std::collections::{BTreeSet, HashMap};
use std::ops::Bound::{Excluded, Unbounded};

use ahash::RandomState;
use ordered_float::OrderedFloat;

use crate::constants::{BodyId, Et};
use crate::ephemerist_errors::EphemeristError;

/// Position of a requested instant relative to an identifier's full boundary
/// set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryNeighbors {
    /// The instant precedes (or equals) every boundary; carries the first
    /// boundary.
    BeforeAll(Et),
    /// The instant follows (or equals) every boundary; carries the last
    /// boundary.
    AfterAll(Et),
    /// The instant falls strictly between two boundaries: the closest one
    /// below and the closest one above.
    Bracketed(Et, Et),
}

#[derive(Debug, Clone, Default)]
pub struct CoverageIndex {
    windows: HashMap<BodyId, Vec<(Et, Et)>, RandomState>,
    boundaries: HashMap<BodyId, BTreeSet<OrderedFloat<Et>>, RandomState>,
}

impl CoverageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a coverage window for `id` and index both of its endpoints.
    pub fn record_window(&mut self, id: BodyId, start: Et, end: Et) {
        self.windows.entry(id).or_default().push((start, end));
        let set = self.boundaries.entry(id).or_default();
        set.insert(OrderedFloat(start));
        set.insert(OrderedFloat(end));
    }

    /// True iff some window for `id` strictly contains `t`.
    pub fn has_coverage(&self, id: BodyId, t: Et) -> bool {
        self.windows
            .get(&id)
            .is_some_and(|windows| windows.iter().any(|&(start, end)| start < t && t < end))
    }

    /// All recorded windows for `id`, in insertion order.
    pub fn windows(&self, id: BodyId) -> &[(Et, Et)] {
        self.windows.get(&id).map_or(&[], Vec::as_slice)
    }

    /// True iff at least one window was ever recorded for `id`.
    pub fn is_indexed(&self, id: BodyId) -> bool {
        self.boundaries.get(&id).is_some_and(|set| !set.is_empty())
    }

    /// Classify `t` against the boundary set of `id`.
    ///
    /// `BeforeAll` when `t` is at or before the first boundary, `AfterAll`
    /// when at or after the last, otherwise the closest boundary strictly
    /// below and the closest strictly above. A `t` equal to an interior
    /// boundary therefore brackets *across* it.
    ///
    /// Return
    /// ----------
    /// * The [`BoundaryNeighbors`] classification, or
    ///   [`EphemeristError::NoCoverageData`] if `id` has no recorded
    ///   boundaries at all.
    pub fn nearest_boundaries(
        &self,
        id: BodyId,
        t: Et,
    ) -> Result<BoundaryNeighbors, EphemeristError> {
        let set = self
            .boundaries
            .get(&id)
            .ok_or(EphemeristError::NoCoverageData(id))?;
        let (Some(&first), Some(&last)) = (set.first(), set.last()) else {
            return Err(EphemeristError::NoCoverageData(id));
        };

        let key = OrderedFloat(t);
        if key <= first {
            return Ok(BoundaryNeighbors::BeforeAll(first.into_inner()));
        }
        if key >= last {
            return Ok(BoundaryNeighbors::AfterAll(last.into_inner()));
        }

        let below = set.range(..key).next_back();
        let above = set.range((Excluded(key), Unbounded)).next();
        match (below, above) {
            (Some(&lo), Some(&hi)) => {
                Ok(BoundaryNeighbors::Bracketed(lo.into_inner(), hi.into_inner()))
            }
            // first < t < last guarantees a neighbor on each side
            _ => Err(EphemeristError::NoCoverageData(id)),
        }
    }

    /// Drop every window and boundary recorded for `id`. Returns whether
    /// anything was removed.
    pub fn forget(&mut self, id: BodyId) -> bool {
        let had_windows = self.windows.remove(&id).is_some();
        let had_boundaries = self.boundaries.remove(&id).is_some();
        had_windows || had_boundaries
    }
}
