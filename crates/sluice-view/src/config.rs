//! View pipeline configuration.

use crate::error::ViewConfigError;

// ── StalePolicy ────────────────────────────────────────────────────

/// What to draw when a fresh snapshot is unavailable.
#[derive(Clone, Debug, PartialEq)]
pub struct StalePolicy {
    /// Keep drawing the previously uploaded slice. Default: true.
    pub allow_stale: bool,
    /// Consecutive stale frames tolerated before the series stops
    /// drawing. Default: 30.
    pub max_stale_frames: u32,
}

impl Default for StalePolicy {
    fn default() -> Self {
        Self {
            allow_stale: true,
            max_stale_frames: 30,
        }
    }
}

impl StalePolicy {
    /// Never reuse stale data.
    pub fn strict() -> Self {
        Self {
            allow_stale: false,
            max_stale_frames: 0,
        }
    }

    /// Whether a view that has already been stale for `stale_frames`
    /// frames may be stale for one more.
    pub fn permits(&self, stale_frames: u32) -> bool {
        self.allow_stale && stale_frames < self.max_stale_frames
    }
}

// ── ViewConfig ─────────────────────────────────────────────────────

/// Tuning for LOD selection and GPU buffer management.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
    /// Desired screen pixels per rendered sample. Default: 2.0.
    pub target_pixels_per_sample: f64,
    /// A LOD switch must cut the deviation from the target by more than
    /// this fraction of the current deviation. Default: 0.5.
    pub hysteresis_margin: f64,
    /// Extra capacity allocated on GPU buffer growth, as a fraction of
    /// the required size. Default: 0.25.
    pub capacity_headroom: f64,
    /// Stale-data continuation policy.
    pub stale_policy: StalePolicy,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            target_pixels_per_sample: 2.0,
            hysteresis_margin: 0.5,
            capacity_headroom: 0.25,
            stale_policy: StalePolicy::default(),
        }
    }
}

impl ViewConfig {
    /// Check that every numeric knob is in range.
    pub fn validate(&self) -> Result<(), ViewConfigError> {
        let target = self.target_pixels_per_sample;
        if !target.is_finite() || target <= 0.0 {
            return Err(ViewConfigError::InvalidTargetDensity { value: target });
        }
        let margin = self.hysteresis_margin;
        if !(0.0..1.0).contains(&margin) {
            return Err(ViewConfigError::InvalidHysteresis { value: margin });
        }
        let headroom = self.capacity_headroom;
        if !headroom.is_finite() || headroom < 0.0 {
            return Err(ViewConfigError::InvalidHeadroom { value: headroom });
        }
        Ok(())
    }

    /// GPU buffer size to allocate when `required` bytes no longer fit.
    pub fn grown_capacity(&self, required: usize) -> usize {
        let grown = (required as f64 * (1.0 + self.capacity_headroom)).ceil();
        if grown.is_finite() && grown < usize::MAX as f64 {
            (grown as usize).max(required)
        } else {
            required
        }
    }
}
