//! Fixed-capacity circular sample buffer with overwrite-on-full.
//!
//! [`SampleRing`] stores plain-old-data records behind a single `Mutex`
//! and mirrors its generation counter into an `AtomicU64` so readers can
//! ask "did anything change" without taking the lock. Writers and
//! readers are mutually exclusive only for the duration of one bounded
//! copy, so a reader always observes the ring either before or after any
//! given push.
//!
//! # Cursor layout
//!
//! `head` is the next write position, `tail` the oldest live sample.
//! `head == tail` is ambiguous on its own: it means empty when nothing
//! has been committed (`sequence == 0`) and full otherwise.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use bytemuck::Pod;
use sluice_core::{Sequence, SnapshotMemory};

struct RingState<T> {
    /// Backing array. Shared with outstanding [`RingView`]s and cloned
    /// on the next write if any are alive.
    storage: Arc<Vec<T>>,
    head: usize,
    tail: usize,
    sequence: u64,
}

impl<T: Pod> RingState<T> {
    fn ranges(&self) -> (Range<usize>, Range<usize>) {
        valid_ranges(self.head, self.tail, self.sequence, self.storage.len())
    }

    fn len(&self) -> usize {
        let (a, b) = self.ranges();
        a.len() + b.len()
    }

    /// Write one sample, returning the one it displaced.
    fn push_into(buf: &mut [T], head: &mut usize, tail: &mut usize, sequence: &mut u64, sample: T) -> Option<T> {
        let was_full = *head == *tail && *sequence > 0;
        let evicted = was_full.then(|| buf[*head]);
        buf[*head] = sample;
        *head = (*head + 1) % buf.len();
        if was_full {
            *tail = *head;
        }
        *sequence += 1;
        evicted
    }
}

/// Live index ranges of a ring in logical (oldest first) order.
fn valid_ranges(head: usize, tail: usize, sequence: u64, capacity: usize) -> (Range<usize>, Range<usize>) {
    if sequence == 0 {
        (0..0, 0..0)
    } else if head > tail {
        (tail..head, 0..0)
    } else {
        // head == tail (full) or head < tail (wrapped).
        (tail..capacity, 0..head)
    }
}

/// Result of [`SampleRing::copy_to`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CopyResult {
    /// Number of samples copied.
    pub count: usize,
    /// Sequence observed at the instant of the copy.
    pub sequence: Sequence,
}

/// A fixed-capacity, overwrite-on-full ring of `T` records.
///
/// One producer calls [`push`](Self::push) or
/// [`push_batch`](Self::push_batch); any number of readers call
/// [`copy_to`](Self::copy_to), [`share`](Self::share) or
/// [`sequence`](Self::sequence) concurrently.
pub struct SampleRing<T> {
    state: Mutex<RingState<T>>,
    /// Mirror of `RingState::sequence`, stored with `Release` after
    /// every committed mutation.
    sequence: AtomicU64,
    capacity: usize,
}

// Compile-time assertion: SampleRing must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SampleRing<sluice_core::TradeSample>>();
};

impl<T: Pod> SampleRing<T> {
    /// Create a ring holding at most `capacity` samples.
    ///
    /// A capacity of 0 is coerced to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(RingState {
                storage: Arc::new(vec![T::zeroed(); capacity]),
                head: 0,
                tail: 0,
                sequence: 0,
            }),
            sequence: AtomicU64::new(0),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RingState<T>> {
        // Every critical section leaves the cursors consistent, so a
        // poisoned lock is still safe to use.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn try_lock(&self) -> Option<MutexGuard<'_, RingState<T>>> {
        match self.state.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Append one sample. Single-producer only.
    ///
    /// Returns the oldest sample if the ring was full and it had to be
    /// overwritten.
    pub fn push(&self, sample: T) -> Option<T> {
        let mut state = self.lock();
        let RingState {
            storage,
            head,
            tail,
            sequence,
        } = &mut *state;
        let buf = Arc::make_mut(storage).as_mut_slice();
        let evicted = RingState::push_into(buf, head, tail, sequence, sample);
        self.sequence.store(*sequence, Ordering::Release);
        evicted
    }

    /// Append `samples` in order under one critical section.
    ///
    /// Equivalent to calling [`push`](Self::push) for each sample.
    /// Returns the number of previously stored samples that were
    /// overwritten.
    pub fn push_batch(&self, samples: &[T]) -> usize {
        self.push_batch_with(samples, |_| {})
    }

    /// Like [`push_batch`](Self::push_batch), calling `on_evict` for every
    /// sample that gets overwritten, oldest first.
    pub fn push_batch_with(&self, samples: &[T], mut on_evict: impl FnMut(&T)) -> usize {
        if samples.is_empty() {
            return 0;
        }
        let mut state = self.lock();
        let RingState {
            storage,
            head,
            tail,
            sequence,
        } = &mut *state;
        let buf = Arc::make_mut(storage).as_mut_slice();
        let mut evicted = 0;
        for &sample in samples {
            if let Some(old) = RingState::push_into(buf, head, tail, sequence, sample) {
                on_evict(&old);
                evicted += 1;
            }
        }
        // One fence for the whole batch: a reader that observes the new
        // sequence observes every sample in it.
        self.sequence.store(*sequence, Ordering::Release);
        evicted
    }

    /// Copy the live contents, oldest first, into `dest` (cleared first).
    pub fn copy_to(&self, dest: &mut Vec<T>) -> CopyResult {
        let state = self.lock();
        Self::copy_locked(&state, dest)
    }

    /// Non-blocking [`copy_to`](Self::copy_to). `None` if a writer holds
    /// the lock right now.
    pub fn try_copy_to(&self, dest: &mut Vec<T>) -> Option<CopyResult> {
        let state = self.try_lock()?;
        Some(Self::copy_locked(&state, dest))
    }

    fn copy_locked(state: &RingState<T>, dest: &mut Vec<T>) -> CopyResult {
        let (primary, secondary) = state.ranges();
        dest.clear();
        dest.reserve(primary.len() + secondary.len());
        dest.extend_from_slice(&state.storage[primary]);
        dest.extend_from_slice(&state.storage[secondary]);
        CopyResult {
            count: dest.len(),
            sequence: Sequence(state.sequence),
        }
    }

    /// Zero-copy view of the live contents.
    ///
    /// The view keeps the current storage alive; the producer's next
    /// push copies the storage once instead of mutating it in place.
    pub fn share(&self) -> RingView<T> {
        let state = self.lock();
        Self::share_locked(&state)
    }

    /// Non-blocking [`share`](Self::share).
    pub fn try_share(&self) -> Option<RingView<T>> {
        let state = self.try_lock()?;
        Some(Self::share_locked(&state))
    }

    fn share_locked(state: &RingState<T>) -> RingView<T> {
        let (primary, secondary) = state.ranges();
        RingView {
            storage: Arc::clone(&state.storage),
            primary,
            secondary,
            sequence: Sequence(state.sequence),
        }
    }

    /// Lock-free read of the generation counter.
    ///
    /// Observing `N` implies the data of all `N` pushes is visible.
    pub fn sequence(&self) -> Sequence {
        Sequence(self.sequence.load(Ordering::Acquire))
    }

    /// Number of live samples (at most [`capacity`](Self::capacity)).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the ring holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of live samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recently pushed sample.
    pub fn last(&self) -> Option<T> {
        let state = self.lock();
        if state.sequence == 0 {
            return None;
        }
        let idx = (state.head + self.capacity - 1) % self.capacity;
        Some(state.storage[idx])
    }

    /// Drop all samples and reset the sequence to zero. Capacity is kept.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.head = 0;
        state.tail = 0;
        state.sequence = 0;
        self.sequence.store(0, Ordering::Release);
    }
}

impl<T> std::fmt::Debug for SampleRing<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleRing")
            .field("capacity", &self.capacity)
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish()
    }
}

// ── RingView ───────────────────────────────────────────────────────

/// A shared, read-only view of a ring's storage at one instant.
///
/// Implements [`SnapshotMemory`] with the wrapped layout: `[tail, end)`
/// as the primary segment and `[0, head)` as the secondary one.
#[derive(Clone)]
pub struct RingView<T> {
    storage: Arc<Vec<T>>,
    primary: Range<usize>,
    secondary: Range<usize>,
    sequence: Sequence,
}

impl<T: Pod> RingView<T> {
    /// Number of samples in the view.
    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sequence at the instant the view was taken.
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// Samples in logical order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.storage[self.primary.clone()]
            .iter()
            .chain(self.storage[self.secondary.clone()].iter())
    }
}

impl<T: Pod + Send + Sync> SnapshotMemory for RingView<T> {
    fn segments(&self) -> (&[u8], &[u8]) {
        (
            bytemuck::cast_slice(&self.storage[self.primary.clone()]),
            bytemuck::cast_slice(&self.storage[self.secondary.clone()]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(ring: &SampleRing<u64>) -> Vec<u64> {
        let mut out = Vec::new();
        ring.copy_to(&mut out);
        out
    }

    #[test]
    fn overwrite_keeps_newest_five() {
        let ring = SampleRing::<u64>::new(5);
        for v in 0..=6 {
            ring.push(v);
        }
        let mut out = Vec::new();
        let result = ring.copy_to(&mut out);
        assert_eq!(out, vec![2, 3, 4, 5, 6]);
        assert_eq!(result.count, 5);
        assert_eq!(result.sequence, Sequence(7));
        assert_eq!(ring.sequence(), Sequence(7));
    }

    #[test]
    fn never_pushed_is_empty() {
        let ring = SampleRing::<u64>::new(8);
        let mut out = vec![99];
        let result = ring.copy_to(&mut out);
        assert_eq!(result.count, 0);
        assert_eq!(result.sequence, Sequence::ZERO);
        assert!(out.is_empty());
        assert!(ring.is_empty());
        assert_eq!(ring.last(), None);
    }

    #[test]
    fn zero_capacity_coerced_to_one() {
        let ring = SampleRing::<u64>::new(0);
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), Some(1));
        assert_eq!(contents(&ring), vec![2]);
        assert_eq!(ring.sequence(), Sequence(2));
    }

    #[test]
    fn push_returns_evicted_oldest() {
        let ring = SampleRing::<u64>::new(3);
        assert_eq!(ring.push(10), None);
        assert_eq!(ring.push(11), None);
        assert_eq!(ring.push(12), None);
        assert_eq!(ring.push(13), Some(10));
        assert_eq!(ring.push(14), Some(11));
        assert_eq!(ring.last(), Some(14));
    }

    #[test]
    fn exactly_full_is_not_empty() {
        let ring = SampleRing::<u64>::new(4);
        ring.push_batch(&[1, 2, 3, 4]);
        assert_eq!(ring.len(), 4);
        assert_eq!(contents(&ring), vec![1, 2, 3, 4]);
    }

    #[test]
    fn push_batch_reports_evictions_oldest_first() {
        let ring = SampleRing::<u64>::new(4);
        ring.push_batch(&[0, 1, 2]);
        let mut seen = Vec::new();
        let evicted = ring.push_batch_with(&[3, 4, 5, 6, 7, 8, 9], |v| seen.push(*v));
        assert_eq!(evicted, 6);
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(contents(&ring), vec![6, 7, 8, 9]);
        assert_eq!(ring.sequence(), Sequence(10));
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let ring = SampleRing::<u64>::new(4);
        ring.push(1);
        assert_eq!(ring.push_batch(&[]), 0);
        assert_eq!(ring.sequence(), Sequence(1));
    }

    #[test]
    fn clear_resets_cursors_and_sequence() {
        let ring = SampleRing::<u64>::new(3);
        ring.push_batch(&[1, 2, 3, 4]);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.sequence(), Sequence::ZERO);
        assert_eq!(ring.capacity(), 3);
        ring.push(7);
        assert_eq!(contents(&ring), vec![7]);
    }

    #[test]
    fn share_is_stable_across_later_pushes() {
        let ring = SampleRing::<u64>::new(4);
        ring.push_batch(&[1, 2, 3, 4, 5]);
        let view = ring.share();
        ring.push_batch(&[6, 7]);
        let seen: Vec<u64> = view.iter().copied().collect();
        assert_eq!(seen, vec![2, 3, 4, 5]);
        assert_eq!(view.sequence(), Sequence(5));
        assert_eq!(contents(&ring), vec![4, 5, 6, 7]);
    }

    #[test]
    fn single_push_after_share_leaves_view_intact() {
        let ring = SampleRing::<u64>::new(3);
        ring.push_batch(&[1, 2, 3]);
        let view = ring.share();
        assert_eq!(ring.push(4), Some(1));
        assert_eq!(view.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(contents(&ring), vec![2, 3, 4]);
        assert_eq!(ring.sequence(), Sequence(4));
    }

    #[test]
    fn shared_view_exposes_wrapped_segments() {
        let ring = SampleRing::<u64>::new(4);
        ring.push_batch(&[1, 2, 3, 4, 5, 6]);
        let view = ring.share();
        let (primary, secondary) = view.segments();
        assert_eq!(bytemuck::cast_slice::<u8, u64>(primary), &[3, 4]);
        assert_eq!(bytemuck::cast_slice::<u8, u64>(secondary), &[5, 6]);
    }

    #[test]
    fn try_variants_report_contention() {
        let ring = SampleRing::<u64>::new(4);
        ring.push(1);
        let held = ring.lock();
        let mut out = Vec::new();
        assert!(ring.try_copy_to(&mut out).is_none());
        assert!(ring.try_share().is_none());
        drop(held);
        assert_eq!(ring.try_copy_to(&mut out).map(|r| r.count), Some(1));
    }

    #[test]
    fn valid_ranges_cases() {
        assert_eq!(valid_ranges(0, 0, 0, 5), (0..0, 0..0));
        assert_eq!(valid_ranges(3, 1, 2, 5), (1..3, 0..0));
        assert_eq!(valid_ranges(2, 4, 8, 5), (4..5, 0..2));
        assert_eq!(valid_ranges(2, 2, 9, 5), (2..5, 0..2));
    }

    // ── proptest ───────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn size_never_exceeds_capacity(
                capacity in 1usize..32,
                batches in prop::collection::vec(prop::collection::vec(any::<u64>(), 0..40), 0..10),
            ) {
                let ring = SampleRing::<u64>::new(capacity);
                for batch in &batches {
                    ring.push_batch(batch);
                    prop_assert!(ring.len() <= capacity);
                    let mut out = Vec::new();
                    prop_assert!(ring.copy_to(&mut out).count <= capacity);
                }
            }

            #[test]
            fn sequence_counts_every_sample(
                capacity in 1usize..16,
                singles in prop::collection::vec(any::<u64>(), 0..50),
                batch in prop::collection::vec(any::<u64>(), 0..50),
            ) {
                let ring = SampleRing::<u64>::new(capacity);
                for (i, &v) in singles.iter().enumerate() {
                    ring.push(v);
                    prop_assert_eq!(ring.sequence(), Sequence(i as u64 + 1));
                }
                let before = ring.sequence().0;
                ring.push_batch(&batch);
                prop_assert_eq!(ring.sequence().0, before + batch.len() as u64);
            }

            #[test]
            fn batch_matches_sequential_pushes(
                capacity in 1usize..16,
                values in prop::collection::vec(any::<u64>(), 0..64),
            ) {
                let a = SampleRing::<u64>::new(capacity);
                let b = SampleRing::<u64>::new(capacity);
                let mut evicted_a = 0;
                for &v in &values {
                    evicted_a += usize::from(a.push(v).is_some());
                }
                let evicted_b = b.push_batch(&values);
                prop_assert_eq!(evicted_a, evicted_b);
                prop_assert_eq!(contents(&a), contents(&b));

                let keep = values.len().min(capacity);
                prop_assert_eq!(contents(&a), values[values.len() - keep..].to_vec());
            }
        }
    }
}
