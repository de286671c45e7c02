//! Incrementally maintained value bounds for axis auto-ranging.

/// Running `(min, max)` of the values a source currently holds.
///
/// Inserts only ever widen the bounds. An eviction that touches the
/// current min or max cannot be undone incrementally, so the tracker
/// keeps the (now possibly too wide) bounds and flags itself stale until
/// the owner calls [`rescan`](Self::rescan).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueRangeTracker {
    bounds: Option<(f64, f64)>,
    stale: bool,
}

impl ValueRangeTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Widen the bounds to cover `(lo, hi)`. NaN bounds are ignored.
    pub fn include(&mut self, (lo, hi): (f64, f64)) {
        if lo.is_nan() || hi.is_nan() {
            return;
        }
        self.bounds = Some(match self.bounds {
            None => (lo, hi),
            Some((min, max)) => (min.min(lo), max.max(hi)),
        });
    }

    /// Record that a sample with bounds `(lo, hi)` left the source.
    pub fn evict(&mut self, (lo, hi): (f64, f64)) {
        if let Some((min, max)) = self.bounds {
            if lo <= min || hi >= max {
                self.stale = true;
            }
        }
    }

    /// Recompute from scratch over the live contents and clear the
    /// stale flag.
    pub fn rescan(&mut self, live: impl IntoIterator<Item = (f64, f64)>) {
        self.bounds = None;
        self.stale = false;
        for bounds in live {
            self.include(bounds);
        }
    }

    /// Current bounds, `None` if nothing has been included.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }

    /// Whether an eviction may have narrowed the true range.
    pub fn needs_rescan(&self) -> bool {
        self.stale
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_widens() {
        let mut t = ValueRangeTracker::new();
        assert_eq!(t.bounds(), None);
        t.include((2.0, 3.0));
        t.include((1.0, 1.5));
        t.include((f64::NAN, 9.0));
        assert_eq!(t.bounds(), Some((1.0, 3.0)));
        assert!(!t.needs_rescan());
    }

    #[test]
    fn interior_eviction_stays_fresh() {
        let mut t = ValueRangeTracker::new();
        t.rescan([(1.0, 1.0), (5.0, 5.0), (3.0, 3.0)]);
        t.evict((3.0, 3.0));
        assert!(!t.needs_rescan());
    }

    #[test]
    fn extreme_eviction_marks_stale_until_rescan() {
        let mut t = ValueRangeTracker::new();
        t.rescan([(1.0, 1.0), (5.0, 5.0)]);
        t.evict((5.0, 5.0));
        assert!(t.needs_rescan());
        assert_eq!(t.bounds(), Some((1.0, 5.0)));
        t.rescan([(1.0, 1.0)]);
        assert!(!t.needs_rescan());
        assert_eq!(t.bounds(), Some((1.0, 1.0)));
    }
}
