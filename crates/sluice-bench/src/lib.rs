//! Benchmark profiles for the Sluice streaming chart pipeline.
//!
//! - [`trade_stream`]: a seeded tick stream with jittered spacing
//! - [`reference_ring`]: 65K-sample ring source, full
//! - [`reference_lod`]: 4-level LOD source over 1M raw samples

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sluice_buffer::{LodConfig, LodSource, RingConfig, RingSource, SnapshotMode};
use sluice_core::TradeSample;

/// Raw samples pushed into [`reference_lod`].
pub const LOD_SAMPLES: usize = 1 << 20;

/// `n` trades with 1-3 ms spacing and a random-walk price.
///
/// The same seed always yields the same stream.
pub fn trade_stream(seed: u64, n: usize) -> Vec<TradeSample> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut t = 0i64;
    let mut price = 100.0f32;
    (0..n)
        .map(|_| {
            t += 1 + (rng.next_u32() % 3) as i64;
            let step = (rng.next_u32() % 201) as f32 / 100.0 - 1.0;
            price = (price + step).max(1.0);
            let quantity = 1.0 + (rng.next_u32() % 50) as f32;
            TradeSample::new(t, price, quantity)
        })
        .collect()
}

/// A full 65 536-sample ring source.
pub fn reference_ring(seed: u64, mode: SnapshotMode) -> RingSource<TradeSample> {
    let config = RingConfig {
        snapshot_mode: mode,
        ..RingConfig::default()
    };
    let source = RingSource::new(config.capacity, config.snapshot_mode);
    source.push_batch(&trade_stream(seed, config.capacity));
    source
}

/// A 4-level LOD source (ratio 4) that has seen [`LOD_SAMPLES`] trades.
///
/// Level 0 keeps the default 65 536 samples, so the coarse levels span
/// the same time as the raw ring.
pub fn reference_lod(seed: u64) -> LodSource<TradeSample> {
    let source = LodSource::new(&LodConfig::default()).unwrap();
    for chunk in trade_stream(seed, LOD_SAMPLES).chunks(4096) {
        source.push_batch(chunk);
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::DataSource;

    #[test]
    fn stream_is_deterministic_and_increasing() {
        let a = trade_stream(3, 1000);
        assert_eq!(a, trade_stream(3, 1000));
        assert!(a.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn reference_ring_is_full() {
        let source = reference_ring(1, SnapshotMode::Copy);
        assert_eq!(source.current_sequence(0).0, 65_536);
    }
}
