//! LOD level selection with hysteresis.
//!
//! Level `i` draws `base_pps × scale(i)` pixels per sample, where
//! `base_pps` is the density level 0 would have. The selector looks for
//! the level whose density is closest to the target on a log scale, so
//! being 2x too dense and 2x too sparse count the same.

/// Screen pixels per sample for `samples` samples across `width_px`.
///
/// Infinite when there are no samples.
pub fn pixels_per_sample(width_px: f64, samples: usize) -> f64 {
    if samples == 0 {
        f64::INFINITY
    } else {
        width_px / samples as f64
    }
}

/// Choose the level to render.
///
/// Starting from `current`, walks toward finer or coarser levels while
/// that strictly reduces `|ln(pps / target_pps)|`. The result is only
/// adopted if it improves on `current`'s deviation by more than
/// `margin × deviation(current)`; otherwise `current` is kept.
///
/// `current` is clamped to the available levels. A non-finite or
/// non-positive `base_pps` keeps the clamped current level.
pub fn choose_level(
    scales: &[usize],
    current: usize,
    target_pps: f64,
    base_pps: f64,
    margin: f64,
) -> usize {
    if scales.is_empty() {
        return 0;
    }
    let current = current.min(scales.len() - 1);
    if !base_pps.is_finite() || base_pps <= 0.0 || !target_pps.is_finite() || target_pps <= 0.0 {
        return current;
    }
    let deviation = |level: usize| {
        let pps = base_pps * scales[level].max(1) as f64;
        (pps / target_pps).ln().abs()
    };

    let mut candidate = current;
    loop {
        let here = deviation(candidate);
        if candidate > 0 && deviation(candidate - 1) < here {
            candidate -= 1;
        } else if candidate + 1 < scales.len() && deviation(candidate + 1) < here {
            candidate += 1;
        } else {
            break;
        }
    }

    if candidate == current {
        return current;
    }
    let current_dev = deviation(current);
    let improvement = current_dev - deviation(candidate);
    if improvement > margin * current_dev {
        candidate
    } else {
        current
    }
}
