//! Multi-resolution data source built from cascaded sample rings.
//!
//! Level 0 stores raw samples. Each coarser level `i` stores completed
//! aggregates of `ratio` level-`(i - 1)` samples, so one level-`i`
//! sample stands for `ratio^i` raw samples. Aggregation happens on the
//! producer thread as samples arrive; readers only ever see completed
//! buckets.
//!
//! ```text
//! push ─▶ level 0 ring
//!           └─▶ bucket[1] ──(ratio full)──▶ level 1 ring
//!                              └─▶ bucket[2] ──▶ level 2 ring ...
//! ```

use std::sync::Mutex;

use sluice_core::{DataSource, SampleRecord, Sequence, SnapshotResult, SourceError, SourceId};

use crate::config::{LodConfig, SnapshotMode};
use crate::error::ConfigError;
use crate::range::ValueRangeTracker;
use crate::ring::SampleRing;
use crate::source::{lock, snapshot_ring, SampleSink};

/// A partially filled aggregate.
#[derive(Clone, Copy)]
struct Bucket<T> {
    acc: T,
    count: usize,
}

/// Producer-side state guarded by one lock.
struct Aggregation<T> {
    /// `buckets[i]` feeds level `i + 1`.
    buckets: Vec<Option<Bucket<T>>>,
    range: ValueRangeTracker,
}

/// Fold `input` into `bucket`, returning every bucket that completed.
fn aggregate<T: SampleRecord>(bucket: &mut Option<Bucket<T>>, ratio: usize, input: &[T]) -> Vec<T> {
    let mut done = Vec::with_capacity(input.len() / ratio + 1);
    for sample in input {
        let next = match bucket.take() {
            None => Bucket {
                acc: *sample,
                count: 1,
            },
            Some(b) => Bucket {
                acc: b.acc.merge(sample),
                count: b.count + 1,
            },
        };
        if next.count == ratio {
            done.push(next.acc);
        } else {
            *bucket = Some(next);
        }
    }
    done
}

/// A [`DataSource`] exposing several LOD levels.
///
/// Each level is its own [`SampleRing`] with its own sequence. Level `i`
/// has capacity `ceil(capacity / ratio^i)` so all levels span roughly
/// the same stretch of time.
pub struct LodSource<T> {
    levels: Vec<SampleRing<T>>,
    scales: Vec<usize>,
    ratio: usize,
    aggregation: Mutex<Aggregation<T>>,
    identity: Mutex<SourceId>,
    mode: SnapshotMode,
}

// Compile-time assertion: LodSource must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<LodSource<sluice_core::PriceBar>>();
};

impl<T: SampleRecord> LodSource<T> {
    /// Build a source from a validated configuration.
    pub fn new(config: &LodConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let levels = (0..config.levels)
            .map(|level| SampleRing::new(config.level_capacity(level)))
            .collect();
        let scales = (0..config.levels).map(|level| config.scale(level)).collect();
        Ok(Self {
            levels,
            scales,
            ratio: config.ratio,
            aggregation: Mutex::new(Aggregation {
                buckets: vec![None; config.levels - 1],
                range: ValueRangeTracker::new(),
            }),
            identity: Mutex::new(SourceId::next()),
            mode: config.ring.snapshot_mode,
        })
    }

    /// Append one raw sample and cascade it through the coarser levels.
    pub fn push(&self, sample: T) -> Option<T> {
        let mut agg = lock(&self.aggregation);
        agg.range.include(sample.value_bounds());
        let evicted = self.levels[0].push(sample);
        if let Some(old) = &evicted {
            agg.range.evict(old.value_bounds());
        }
        self.cascade(&mut agg.buckets, std::slice::from_ref(&sample));
        evicted
    }

    /// Append raw samples in order. One critical section per level.
    /// Returns the number of level-0 samples overwritten.
    pub fn push_batch(&self, samples: &[T]) -> usize {
        if samples.is_empty() {
            return 0;
        }
        let mut agg = lock(&self.aggregation);
        let Aggregation { buckets, range } = &mut *agg;
        for s in samples {
            range.include(s.value_bounds());
        }
        let evicted = self.levels[0].push_batch_with(samples, |old| range.evict(old.value_bounds()));
        self.cascade(buckets, samples);
        evicted
    }

    /// Feed freshly stored level-0 samples into levels 1 and up.
    fn cascade(&self, buckets: &mut [Option<Bucket<T>>], raw: &[T]) {
        let mut input = raw.to_vec();
        for (i, bucket) in buckets.iter_mut().enumerate() {
            let completed = aggregate(bucket, self.ratio, &input);
            if completed.is_empty() {
                break;
            }
            self.levels[i + 1].push_batch(&completed);
            input = completed;
        }
    }

    /// Drop all samples at every level and take a fresh identity.
    pub fn clear(&self) {
        let mut agg = lock(&self.aggregation);
        let mut identity = lock(&self.identity);
        let old = *identity;
        *identity = SourceId::next();
        drop(identity);
        for ring in &self.levels {
            ring.clear();
        }
        agg.buckets.iter_mut().for_each(|b| *b = None);
        agg.range.reset();
        log::debug!("lod source {old} cleared, new identity {}", self.identity());
    }

    /// Recompute the value range from the live level-0 contents.
    pub fn rescan_value_range(&self) -> Option<(f64, f64)> {
        let mut agg = lock(&self.aggregation);
        let mut live = Vec::new();
        self.levels[0].copy_to(&mut live);
        agg.range.rescan(live.iter().map(SampleRecord::value_bounds));
        agg.range.bounds()
    }

    /// The ring backing `level`. Crate-private: writing to a level ring
    /// directly would bypass aggregation and identity renewal.
    pub(crate) fn level(&self, level: usize) -> Option<&SampleRing<T>> {
        self.levels.get(level)
    }

    /// Samples currently stored at `level`.
    pub fn level_len(&self, level: usize) -> Option<usize> {
        self.level(level).map(SampleRing::len)
    }

    /// Capacity of `level`.
    pub fn level_capacity(&self, level: usize) -> Option<usize> {
        self.level(level).map(SampleRing::capacity)
    }

    /// Subdivision ratio between adjacent levels.
    pub fn ratio(&self) -> usize {
        self.ratio
    }
}

impl<T: SampleRecord> DataSource for LodSource<T> {
    fn identity(&self) -> SourceId {
        *lock(&self.identity)
    }

    fn try_snapshot(&self, level: usize) -> SnapshotResult {
        let Some(ring) = self.levels.get(level) else {
            return SnapshotResult::Failed(SourceError::LevelOutOfRange {
                level,
                levels: self.levels.len(),
            });
        };
        match snapshot_ring(ring, self.mode) {
            // Raw data exists but no bucket at this level has completed.
            SnapshotResult::Empty if level > 0 && self.levels[0].sequence() > Sequence::ZERO => {
                SnapshotResult::Busy
            }
            other => other,
        }
    }

    fn lod_levels(&self) -> usize {
        self.levels.len()
    }

    fn lod_scale(&self, level: usize) -> usize {
        self.scales.get(level).copied().unwrap_or(1)
    }

    fn current_sequence(&self, level: usize) -> Sequence {
        self.levels
            .get(level)
            .map_or(Sequence::ZERO, SampleRing::sequence)
    }

    fn has_value_range(&self) -> bool {
        true
    }

    fn value_range(&self) -> Option<(f64, f64)> {
        lock(&self.aggregation).range.bounds()
    }

    fn value_range_needs_rescan(&self) -> bool {
        lock(&self.aggregation).range.needs_rescan()
    }
}

impl<T: SampleRecord> SampleSink<T> for LodSource<T> {
    fn push_samples(&self, samples: &[T]) {
        self.push_batch(samples);
    }
}
