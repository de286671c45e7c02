//! Strongly-typed identifiers for sources, series, frames and sequences.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`SourceId`] allocation.
static SOURCE_INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a data source.
///
/// Allocated from a monotonic atomic counter via [`SourceId::next`].
/// Two distinct sources always have different IDs, even if they wrap
/// identical data. View caches key on this value to detect source swaps
/// without ABA reuse when a source is dropped and a new one is allocated
/// at the same address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    /// Allocate a fresh, unique source ID.
    ///
    /// Each call returns a new ID that has never been returned before
    /// within this process. Thread-safe.
    pub fn next() -> Self {
        Self(SOURCE_INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a plotted series.
///
/// Assigned by the caller; stable for as long as the series is shown.
/// Used as the deduplication key for failure diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(pub u64);

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SeriesId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Monotonically increasing render frame counter.
///
/// Frame-scoped caches are discarded whenever the frame ID changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

impl FrameId {
    /// The frame after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FrameId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Generation counter of a data source or one of its LOD levels.
///
/// Incremented on every committed mutation. Two snapshots with equal
/// sequence from the same source identity have identical contents.
/// `Sequence(0)` means "nothing committed yet" or "unknown".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sequence(pub u64);

impl Sequence {
    /// The "nothing committed" sequence.
    pub const ZERO: Self = Self(0);
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Sequence {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Which view of a series is being rendered.
///
/// Each kind owns its own GPU buffer and upload cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewKind {
    /// The main plot area.
    Main,
    /// The overview strip showing a wider time range.
    Preview,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Preview => write!(f, "preview"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_ids_are_unique() {
        let a = SourceId::next();
        let b = SourceId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn frame_next_increments() {
        assert_eq!(FrameId(7).next(), FrameId(8));
    }

    #[test]
    fn sequence_default_is_zero() {
        assert_eq!(Sequence::default(), Sequence::ZERO);
    }
}
