//! Single-level [`DataSource`] over a [`SampleRing`].

use std::mem::size_of;
use std::sync::{Arc, Mutex, MutexGuard};

use sluice_core::{
    DataSource, SampleRecord, Sequence, Snapshot, SnapshotResult, SourceError, SourceId,
};

use crate::config::{RingConfig, SnapshotMode};
use crate::error::ConfigError;
use crate::range::ValueRangeTracker;
use crate::ring::SampleRing;

/// Anything a producer can append samples to.
///
/// Implemented by [`RingSource`] and [`LodSource`](crate::LodSource) so
/// the [`feed`](crate::feed) pump can drive either.
pub trait SampleSink<T>: Send + Sync {
    /// Append `samples` in order.
    fn push_samples(&self, samples: &[T]);
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Snapshot one ring according to `mode`, mapping lock contention to
/// [`SnapshotResult::Busy`].
pub(crate) fn snapshot_ring<T: SampleRecord>(
    ring: &SampleRing<T>,
    mode: SnapshotMode,
) -> SnapshotResult {
    let snapshot = match mode {
        SnapshotMode::Copy => {
            let mut buf = Vec::with_capacity(ring.capacity());
            match ring.try_copy_to(&mut buf) {
                Some(copied) => Snapshot::from_vec(buf, copied.sequence),
                None => return SnapshotResult::Busy,
            }
        }
        SnapshotMode::Shared => match ring.try_share() {
            Some(view) => {
                let sequence = view.sequence();
                Snapshot::new(Arc::new(view), size_of::<T>(), sequence)
            }
            None => return SnapshotResult::Busy,
        },
    };
    SnapshotResult::from_snapshot(snapshot)
}

/// A one-level data source backed by a [`SampleRing`].
///
/// Maintains an incremental value range alongside the ring. The
/// producer side ([`push`](Self::push), [`push_batch`](Self::push_batch),
/// [`clear`](Self::clear)) takes the range lock before the ring lock.
///
/// The ring itself is not reachable from outside, so every mutation goes
/// through the source and keeps its identity and value range in step:
///
/// ```compile_fail
/// use sluice_buffer::{RingSource, SnapshotMode};
/// use sluice_core::TradeSample;
///
/// let source = RingSource::<TradeSample>::new(8, SnapshotMode::Copy);
/// source.ring().clear();
/// ```
pub struct RingSource<T> {
    ring: SampleRing<T>,
    range: Mutex<ValueRangeTracker>,
    identity: Mutex<SourceId>,
    mode: SnapshotMode,
}

impl<T: SampleRecord> RingSource<T> {
    /// Create a source holding at most `capacity` samples (0 is coerced
    /// to 1).
    pub fn new(capacity: usize, mode: SnapshotMode) -> Self {
        Self {
            ring: SampleRing::new(capacity),
            range: Mutex::new(ValueRangeTracker::new()),
            identity: Mutex::new(SourceId::next()),
            mode,
        }
    }

    /// Create a source from a validated configuration.
    pub fn from_config(config: &RingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config.capacity, config.snapshot_mode))
    }

    /// Append one sample, returning the one it displaced.
    pub fn push(&self, sample: T) -> Option<T> {
        let mut range = lock(&self.range);
        range.include(sample.value_bounds());
        let evicted = self.ring.push(sample);
        if let Some(old) = &evicted {
            range.evict(old.value_bounds());
        }
        evicted
    }

    /// Append `samples` in order under one ring critical section.
    /// Returns the number of samples overwritten.
    pub fn push_batch(&self, samples: &[T]) -> usize {
        let mut range = lock(&self.range);
        for s in samples {
            range.include(s.value_bounds());
        }
        self.ring
            .push_batch_with(samples, |old| range.evict(old.value_bounds()))
    }

    /// Drop all samples and take a fresh identity.
    ///
    /// The sequence restarts at zero, so views must not compare it with
    /// sequences observed before the clear; the new identity makes them
    /// reset instead.
    pub fn clear(&self) {
        let mut range = lock(&self.range);
        let mut identity = lock(&self.identity);
        let old = *identity;
        *identity = SourceId::next();
        drop(identity);
        self.ring.clear();
        range.reset();
        log::debug!("ring source {old} cleared, new identity {}", self.identity());
    }

    /// Recompute the value range from the live contents.
    pub fn rescan_value_range(&self) -> Option<(f64, f64)> {
        let mut range = lock(&self.range);
        let mut live = Vec::new();
        self.ring.copy_to(&mut live);
        range.rescan(live.iter().map(SampleRecord::value_bounds));
        range.bounds()
    }

    /// Number of samples currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Maximum number of samples kept.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Snapshot strategy in use.
    pub fn snapshot_mode(&self) -> SnapshotMode {
        self.mode
    }
}

impl<T: SampleRecord> DataSource for RingSource<T> {
    fn identity(&self) -> SourceId {
        *lock(&self.identity)
    }

    fn try_snapshot(&self, level: usize) -> SnapshotResult {
        if level != 0 {
            return SnapshotResult::Failed(SourceError::LevelOutOfRange { level, levels: 1 });
        }
        snapshot_ring(&self.ring, self.mode)
    }

    fn current_sequence(&self, level: usize) -> Sequence {
        if level == 0 {
            self.ring.sequence()
        } else {
            Sequence::ZERO
        }
    }

    fn has_value_range(&self) -> bool {
        true
    }

    fn value_range(&self) -> Option<(f64, f64)> {
        lock(&self.range).bounds()
    }

    fn value_range_needs_rescan(&self) -> bool {
        lock(&self.range).needs_rescan()
    }
}

impl<T: SampleRecord> SampleSink<T> for RingSource<T> {
    fn push_samples(&self, samples: &[T]) {
        self.push_batch(samples);
    }
}
