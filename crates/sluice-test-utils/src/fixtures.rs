//! Deterministic sample fixtures.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sluice_core::{PriceBar, TradeSample};

/// `n` trades with timestamps `0..n` and price equal to the timestamp.
pub fn ramp_trades(n: usize) -> Vec<TradeSample> {
    (0..n as i64)
        .map(|t| TradeSample::new(t, t as f32, 1.0))
        .collect()
}

/// `n` trades with timestamps `start, start + step, ...`.
pub fn spaced_trades(start: i64, step: i64, n: usize) -> Vec<TradeSample> {
    (0..n as i64)
        .map(|i| TradeSample::new(start + i * step, i as f32, 1.0))
        .collect()
}

/// Uniform float in `[-1, 1)`.
fn unit(rng: &mut ChaCha8Rng) -> f32 {
    (rng.next_u32() >> 8) as f32 / (1u32 << 23) as f32 - 1.0
}

/// `n` one-second OHLCV bars following a seeded random walk from 100.0.
///
/// The same seed always yields the same bars.
pub fn random_walk_bars(seed: u64, n: usize) -> Vec<PriceBar> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut price = 100.0f32;
    (0..n as i64)
        .map(|t| {
            let open = price;
            let close = (open + unit(&mut rng)).max(1.0);
            let high = open.max(close) + unit(&mut rng).abs() * 0.5;
            let low = open.min(close) - unit(&mut rng).abs() * 0.5;
            let volume = 1.0 + (rng.next_u32() % 100) as f32;
            price = close;
            PriceBar::new(t, open, high, low, close, volume)
        })
        .collect()
}
