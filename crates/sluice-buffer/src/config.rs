//! Buffer and LOD source configuration.
//!
//! [`RingConfig`] sizes a single sample ring. [`LodConfig`] adds the
//! subdivision ratio and level count for
//! [`LodSource`](crate::LodSource). Both validate eagerly so that
//! construction never has to guess at a bad value.

use crate::error::ConfigError;

/// Upper bound on LOD levels per source.
pub const MAX_LOD_LEVELS: usize = 16;

// ── SnapshotMode ───────────────────────────────────────────────────

/// How a source materialises snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SnapshotMode {
    /// Copy the live contents into an owned `Vec` per snapshot.
    #[default]
    Copy,
    /// Hand out a zero-copy view of the ring's storage. The next push
    /// after a view is taken copies the storage once (copy-on-write).
    Shared,
}

// ── RingConfig ─────────────────────────────────────────────────────

/// Configuration for a single-level ring source.
#[derive(Clone, Debug)]
pub struct RingConfig {
    /// Maximum number of live samples. Default: 65 536.
    pub capacity: usize,
    /// Snapshot strategy. Default: [`SnapshotMode::Copy`].
    pub snapshot_mode: SnapshotMode,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity: 65_536,
            snapshot_mode: SnapshotMode::Copy,
        }
    }
}

impl RingConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

// ── LodConfig ──────────────────────────────────────────────────────

/// Configuration for a multi-level source.
///
/// Level `i` aggregates `ratio^i` level-0 samples. Level 0 uses
/// `ring.capacity`; level `i` uses `ceil(capacity / ratio^i)` so every
/// level covers roughly the same time span.
#[derive(Clone, Debug)]
pub struct LodConfig {
    /// Level-0 ring configuration.
    pub ring: RingConfig,
    /// Subdivision ratio between adjacent levels. Default: 4.
    pub ratio: usize,
    /// Number of levels including level 0. Default: 4.
    pub levels: usize,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            ring: RingConfig::default(),
            ratio: 4,
            levels: 4,
        }
    }
}

impl LodConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ring.validate()?;
        if self.ratio < 2 {
            return Err(ConfigError::RatioTooSmall { ratio: self.ratio });
        }
        if self.levels == 0 || self.levels > MAX_LOD_LEVELS {
            return Err(ConfigError::InvalidLevels {
                levels: self.levels,
            });
        }
        if self.ratio.checked_pow((self.levels - 1) as u32).is_none() {
            return Err(ConfigError::ScaleOverflow {
                ratio: self.ratio,
                levels: self.levels,
            });
        }
        Ok(())
    }

    /// Scale factor of `level`. Saturates for levels beyond the
    /// configured range.
    pub fn scale(&self, level: usize) -> usize {
        self.ratio.saturating_pow(level as u32)
    }

    /// Ring capacity of `level`, never below 1.
    pub fn level_capacity(&self, level: usize) -> usize {
        self.ring.capacity.div_ceil(self.scale(level)).max(1)
    }
}
