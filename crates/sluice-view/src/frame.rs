//! Frame-scoped snapshot cache.
//!
//! Main and preview views of one series usually ask the same source for
//! the same level within a frame. [`FrameSnapshotCache`] makes the
//! second request free and guarantees both views draw from the same
//! instant. Entries never survive a frame change.

use indexmap::IndexMap;
use sluice_core::{DataSource, FrameId, SnapshotResult, SourceId};

/// Snapshots fetched during the current frame, keyed by
/// `(source identity, level)`.
///
/// Every status is cached, including `Busy` and `Failed`, so a source is
/// asked at most once per level per frame.
#[derive(Debug, Default)]
pub struct FrameSnapshotCache {
    frame: Option<FrameId>,
    entries: IndexMap<(SourceId, usize), SnapshotResult>,
    hits: u64,
    misses: u64,
}

impl FrameSnapshotCache {
    /// An empty cache not yet bound to any frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the cache to `frame`, discarding entries from any other
    /// frame. Calling it again with the same frame keeps the entries.
    pub fn begin_frame(&mut self, frame: FrameId) {
        if self.frame == Some(frame) {
            return;
        }
        if !self.entries.is_empty() {
            log::debug!(
                "frame {frame}: dropping {} cached snapshots",
                self.entries.len()
            );
        }
        self.entries.clear();
        self.frame = Some(frame);
    }

    /// The cached result for `(identity, level)`, fetching it from
    /// `source` on a miss.
    ///
    /// `identity` is the identity the caller resolved for `source`. If the
    /// source has taken a different identity by the time the snapshot is
    /// in hand, its contents may belong to the new identity: the fetch
    /// reports `Busy` and nothing is cached.
    ///
    /// Returns the result and whether it came from the cache.
    pub fn get_or_fetch(
        &mut self,
        source: &dyn DataSource,
        identity: SourceId,
        level: usize,
    ) -> (SnapshotResult, bool) {
        let key = (identity, level);
        if let Some(result) = self.entries.get(&key) {
            self.hits += 1;
            log::trace!("snapshot cache hit: source {} level {level}", key.0);
            return (result.clone(), true);
        }
        self.misses += 1;
        let result = source.try_snapshot(level);
        let current = source.identity();
        if current != identity {
            log::debug!("source {identity} became {current} during fetch of level {level}");
            return (SnapshotResult::Busy, false);
        }
        self.entries.insert(key, result.clone());
        (result, false)
    }

    /// The frame the cache is bound to.
    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lifetime cache hits.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lifetime cache misses (actual fetches).
    pub fn misses(&self) -> u64 {
        self.misses
    }
}
