//! The [`DataSource`] trait: the boundary between storage backends and
//! the render-side view pipeline.

use crate::id::{Sequence, SourceId};
use crate::snapshot::SnapshotResult;

/// A series' backing store, exposed as one or more LOD levels.
///
/// Level 0 is full resolution. Level `i` holds samples that each stand
/// for [`lod_scale(i)`](DataSource::lod_scale) level-0 samples.
///
/// Implementations must never block the render thread for longer than a
/// bounded copy. If a consistent snapshot cannot be produced right now,
/// [`try_snapshot`](DataSource::try_snapshot) answers
/// [`SnapshotResult::Busy`] instead of waiting.
pub trait DataSource: Send + Sync {
    /// Stable identity for the lifetime of this conceptual source.
    ///
    /// View caches reset whenever the identity they saw last changes.
    /// A source that discards its contents must take its new identity
    /// before any replacement data can appear in a snapshot, so a reader
    /// that checks the identity after `try_snapshot` never attributes
    /// new data to the old identity.
    fn identity(&self) -> SourceId;

    /// Produce a consistent snapshot of `level`.
    ///
    /// Levels at or beyond [`lod_levels`](DataSource::lod_levels) yield
    /// [`SnapshotResult::Failed`].
    fn try_snapshot(&self, level: usize) -> SnapshotResult;

    /// Number of LOD levels. At least 1 for any source with data.
    fn lod_levels(&self) -> usize {
        1
    }

    /// How many level-0 samples one sample of `level` represents.
    ///
    /// Always at least 1; level 0 is 1 by convention.
    fn lod_scale(&self, level: usize) -> usize {
        let _ = level;
        1
    }

    /// Lock-free peek at the sequence of `level`.
    ///
    /// [`Sequence::ZERO`] when unknown or unsupported.
    fn current_sequence(&self, level: usize) -> Sequence {
        let _ = level;
        Sequence::ZERO
    }

    /// Whether [`value_range`](DataSource::value_range) is maintained.
    fn has_value_range(&self) -> bool {
        false
    }

    /// Incrementally maintained `(min, max)` of the live data.
    ///
    /// `None` when unsupported or when no data has been seen.
    fn value_range(&self) -> Option<(f64, f64)> {
        None
    }

    /// Whether the cached range is stale and consumers should scan.
    fn value_range_needs_rescan(&self) -> bool {
        false
    }
}

/// Collect every level's scale factor.
///
/// Scales are clamped to at least 1. The result is what the LOD
/// selector consumes.
pub fn lod_scales(source: &dyn DataSource) -> smallvec::SmallVec<[usize; 8]> {
    (0..source.lod_levels())
        .map(|level| source.lod_scale(level).max(1))
        .collect()
}
