//! Point-in-time, read-only views of source contents.
//!
//! A [`Snapshot`] is a pair of byte segments (primary then secondary)
//! interpreted as fixed-stride records, plus the [`Sequence`] it was
//! taken at. The memory is kept alive by a reference-counted
//! [`LifetimeGuard`], so a snapshot can outlive the call that produced it
//! for as long as one frame needs it. Consumers do not know whether the
//! guard owns a private copy or shares the producer's storage.
//!
//! # Index resolution
//!
//! With `len` total records of which `secondary_len` live in the
//! secondary segment, logical index `i` resolves to the primary segment
//! when `i < len - secondary_len` and to the secondary segment otherwise.
//! This is the shape of a wrapped ring buffer: `[tail, capacity)` then
//! `[0, head)`.

use std::fmt;
use std::sync::Arc;

use bytemuck::Pod;
use smallvec::SmallVec;

use crate::error::SourceError;
use crate::id::Sequence;
use crate::sample::{SampleAccessors, SampleRecord};

/// Backing memory of a snapshot.
///
/// Returns `(primary, secondary)`. The secondary segment is empty for
/// contiguous memory. Both lengths must be multiples of the record
/// stride the snapshot is built with.
pub trait SnapshotMemory: Send + Sync {
    /// The primary and secondary byte segments, in logical order.
    fn segments(&self) -> (&[u8], &[u8]);
}

impl<T: Pod + Send + Sync> SnapshotMemory for Vec<T> {
    fn segments(&self) -> (&[u8], &[u8]) {
        (bytemuck::cast_slice(self.as_slice()), &[])
    }
}

/// Shared owner of a snapshot's memory.
pub type LifetimeGuard = Arc<dyn SnapshotMemory>;

/// A consistent, read-only view of a source at one instant.
///
/// Cloning is cheap: it bumps the guard's reference count.
#[derive(Clone)]
pub struct Snapshot {
    guard: Option<LifetimeGuard>,
    stride: usize,
    sequence: Sequence,
}

impl Snapshot {
    /// A snapshot with no memory behind it.
    pub fn empty(stride: usize) -> Self {
        Self {
            guard: None,
            stride,
            sequence: Sequence::ZERO,
        }
    }

    /// Wrap shared memory as a snapshot of `stride`-byte records.
    pub fn new(guard: LifetimeGuard, stride: usize, sequence: Sequence) -> Self {
        Self {
            guard: Some(guard),
            stride,
            sequence,
        }
    }

    /// Take ownership of a vector of records.
    pub fn from_vec<T: SampleRecord>(samples: Vec<T>, sequence: Sequence) -> Self {
        Self::new(Arc::new(samples), std::mem::size_of::<T>(), sequence)
    }

    fn segments(&self) -> (&[u8], &[u8]) {
        match &self.guard {
            Some(guard) => guard.segments(),
            None => (&[], &[]),
        }
    }

    /// Size of one record in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Sequence of the source at the instant this snapshot was taken.
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// Total number of records across both segments.
    pub fn len(&self) -> usize {
        if self.stride == 0 {
            return 0;
        }
        let (primary, secondary) = self.segments();
        (primary.len() + secondary.len()) / self.stride
    }

    /// Number of records that live in the secondary segment.
    pub fn secondary_len(&self) -> usize {
        if self.stride == 0 {
            return 0;
        }
        self.segments().1.len() / self.stride
    }

    /// Whether the snapshot has no memory or no records.
    pub fn is_empty(&self) -> bool {
        self.guard.is_none() || self.len() == 0
    }

    /// The primary segment as bytes.
    pub fn primary_bytes(&self) -> &[u8] {
        self.segments().0
    }

    /// The secondary segment as bytes (empty for contiguous memory).
    pub fn secondary_bytes(&self) -> &[u8] {
        self.segments().1
    }

    /// The lifetime guard, if the snapshot has memory.
    pub fn guard(&self) -> Option<&LifetimeGuard> {
        self.guard.as_ref()
    }

    /// Bytes of the record at logical index `index`.
    pub fn sample(&self, index: usize) -> Option<&[u8]> {
        let len = self.len();
        if index >= len {
            return None;
        }
        let (primary, secondary) = self.segments();
        let head = len - self.secondary_len();
        let s = self.stride;
        if index < head {
            Some(&primary[index * s..(index + 1) * s])
        } else {
            let j = index - head;
            Some(&secondary[j * s..(j + 1) * s])
        }
    }

    /// Bytes covering records `[first, first + count)`, clamped to the
    /// snapshot, as at most two slices in logical order.
    pub fn byte_range(&self, first: usize, count: usize) -> SmallVec<[&[u8]; 2]> {
        let mut out = SmallVec::new();
        let len = self.len();
        let first = first.min(len);
        let end = first.saturating_add(count).min(len);
        if first == end {
            return out;
        }
        let (primary, secondary) = self.segments();
        let head = len - self.secondary_len();
        let s = self.stride;
        if first < head {
            out.push(&primary[first * s..end.min(head) * s]);
        }
        if end > head {
            let from = first.max(head) - head;
            out.push(&secondary[from * s..(end - head) * s]);
        }
        out
    }

    /// Timestamps of all records in logical order.
    pub fn timestamps<'a>(
        &'a self,
        accessors: &'a SampleAccessors,
    ) -> impl Iterator<Item = i64> + 'a {
        (0..self.len()).filter_map(move |i| self.sample(i).map(accessors.timestamp))
    }

    /// Full linear scan for the low/high bounds of all records.
    ///
    /// The fallback when a source's incremental range needs a rescan.
    /// NaN bounds are skipped. Returns `None` for an empty snapshot.
    pub fn scan_value_range(&self, accessors: &SampleAccessors) -> Option<(f64, f64)> {
        let mut bounds: Option<(f64, f64)> = None;
        for i in 0..self.len() {
            let Some(bytes) = self.sample(i) else { break };
            let (lo, hi) = (accessors.range)(bytes);
            if lo.is_nan() || hi.is_nan() {
                continue;
            }
            bounds = Some(match bounds {
                None => (lo, hi),
                Some((min, max)) => (min.min(lo), max.max(hi)),
            });
        }
        bounds
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("len", &self.len())
            .field("secondary_len", &self.secondary_len())
            .field("stride", &self.stride)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Coarse outcome of a snapshot request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SnapshotStatus {
    /// A non-empty snapshot was produced.
    Ready,
    /// The source holds no data yet. Expected, not an error.
    Empty,
    /// Transient contention or aggregation not yet available.
    Busy,
    /// The level does not exist or the backend failed.
    Failed,
}

/// Result of [`DataSource::try_snapshot`](crate::DataSource::try_snapshot).
#[derive(Clone, Debug)]
pub enum SnapshotResult {
    /// A consistent, non-empty snapshot.
    Ready(Snapshot),
    /// The source holds no data yet.
    Empty,
    /// The source could not produce a consistent snapshot right now.
    Busy,
    /// The request cannot succeed.
    Failed(SourceError),
}

impl SnapshotResult {
    /// `Ready` for a non-empty snapshot, `Empty` otherwise.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        if snapshot.is_empty() {
            Self::Empty
        } else {
            Self::Ready(snapshot)
        }
    }

    /// The status without the payload.
    pub fn status(&self) -> SnapshotStatus {
        match self {
            Self::Ready(_) => SnapshotStatus::Ready,
            Self::Empty => SnapshotStatus::Empty,
            Self::Busy => SnapshotStatus::Busy,
            Self::Failed(_) => SnapshotStatus::Failed,
        }
    }

    /// The snapshot, if ready.
    pub fn ready(self) -> Option<Snapshot> {
        match self {
            Self::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::TradeSample;

    /// Two owned segments, for exercising wrapped index resolution.
    struct Split {
        primary: Vec<TradeSample>,
        secondary: Vec<TradeSample>,
    }

    impl SnapshotMemory for Split {
        fn segments(&self) -> (&[u8], &[u8]) {
            (
                bytemuck::cast_slice(&self.primary),
                bytemuck::cast_slice(&self.secondary),
            )
        }
    }

    fn trades(range: std::ops::Range<i64>) -> Vec<TradeSample> {
        range.map(|t| TradeSample::new(t, t as f32, 1.0)).collect()
    }

    fn split_snapshot() -> Snapshot {
        let memory = Split {
            primary: trades(0..3),
            secondary: trades(3..5),
        };
        Snapshot::new(Arc::new(memory), 16, Sequence(9))
    }

    #[test]
    fn empty_snapshot_has_no_records() {
        let snap = Snapshot::empty(16);
        assert!(snap.is_empty());
        assert_eq!(snap.len(), 0);
        assert!(snap.sample(0).is_none());
        assert!(snap.byte_range(0, 10).is_empty());
    }

    #[test]
    fn from_vec_is_contiguous() {
        let snap = Snapshot::from_vec(trades(0..4), Sequence(4));
        assert_eq!(snap.len(), 4);
        assert_eq!(snap.secondary_len(), 0);
        assert_eq!(snap.stride(), 16);
        assert_eq!(snap.sequence(), Sequence(4));
    }

    #[test]
    fn wrapped_index_resolution() {
        let snap = split_snapshot();
        let acc = SampleAccessors::of::<TradeSample>();
        assert_eq!(snap.len(), 5);
        assert_eq!(snap.secondary_len(), 2);
        let ts: Vec<i64> = snap.timestamps(&acc).collect();
        assert_eq!(ts, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn byte_range_spans_both_segments() {
        let snap = split_snapshot();
        let parts = snap.byte_range(2, 2);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 16);
        assert_eq!(parts[1].len(), 16);

        let only_secondary = snap.byte_range(3, 10);
        assert_eq!(only_secondary.len(), 1);
        assert_eq!(only_secondary[0].len(), 32);

        let only_primary = snap.byte_range(0, 3);
        assert_eq!(only_primary.len(), 1);
        assert_eq!(only_primary[0].len(), 48);
    }

    #[test]
    fn scan_value_range_covers_all_records() {
        let snap = split_snapshot();
        let acc = SampleAccessors::of::<TradeSample>();
        assert_eq!(snap.scan_value_range(&acc), Some((0.0, 4.0)));
        assert_eq!(Snapshot::empty(16).scan_value_range(&acc), None);
    }

    #[test]
    fn guard_keeps_memory_alive_after_clone() {
        let snap = Snapshot::from_vec(trades(0..2), Sequence(2));
        let copy = snap.clone();
        drop(snap);
        assert_eq!(copy.len(), 2);
        assert_eq!(Arc::strong_count(copy.guard().unwrap()), 1);
    }

    #[test]
    fn from_snapshot_maps_empty() {
        let result = SnapshotResult::from_snapshot(Snapshot::from_vec(Vec::<TradeSample>::new(), Sequence(0)));
        assert_eq!(result.status(), SnapshotStatus::Empty);
        let ready = SnapshotResult::from_snapshot(Snapshot::from_vec(trades(0..1), Sequence(1)));
        assert_eq!(ready.status(), SnapshotStatus::Ready);
        assert!(ready.ready().is_some());
    }

    // ── proptest ───────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn byte_range_length_matches_clamped_count(
                head in 0i64..20,
                tail in 0i64..20,
                first in 0usize..48,
                count in 0usize..48,
            ) {
                let memory = Split {
                    primary: trades(0..head),
                    secondary: trades(head..head + tail),
                };
                let snap = Snapshot::new(Arc::new(memory), 16, Sequence(1));
                let len = (head + tail) as usize;
                let expected = first.min(len).saturating_add(count).min(len) - first.min(len);
                let total: usize = snap.byte_range(first, count).iter().map(|s| s.len()).sum();
                prop_assert_eq!(total, expected * 16);

                // Records come back in logical order.
                let acc = SampleAccessors::of::<TradeSample>();
                let ts: Vec<i64> = snap.timestamps(&acc).collect();
                let want: Vec<i64> = (0..head + tail).collect();
                prop_assert_eq!(ts, want);
            }
        }
    }
}
