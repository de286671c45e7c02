//! Visible-window binary search over a snapshot.

use sluice_core::Snapshot;

/// First logical index in `0..len` for which `pred` is false, assuming
/// `pred` is true for a prefix and false for the rest.
fn partition_point(len: usize, mut pred: impl FnMut(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Records of `snapshot` to draw for the window `[t_min, t_max]`.
///
/// Returns `(first, count)`. The range starts one record before the
/// first timestamp `>= t_min` so that the line segment entering the
/// window is drawn, and ends at the first timestamp `> t_max`
/// (exclusive), both clamped to the snapshot. No record past `t_max` is
/// included. Timestamps are assumed sorted in logical order.
pub fn visible_range(
    snapshot: &Snapshot,
    timestamp: fn(&[u8]) -> i64,
    t_min: i64,
    t_max: i64,
) -> (usize, usize) {
    let len = snapshot.len();
    let ts = |i: usize| snapshot.sample(i).map_or(i64::MAX, timestamp);
    let lower = partition_point(len, |i| ts(i) < t_min);
    let upper = partition_point(len, |i| ts(i) <= t_max);
    let first = lower.saturating_sub(1);
    let end = upper.min(len).max(first);
    (first, end - first)
}
