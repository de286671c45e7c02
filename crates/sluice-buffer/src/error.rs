//! Error types for buffer configuration and the producer feed.

use std::error::Error;
use std::fmt;

/// Errors detected by [`RingConfig::validate`](crate::RingConfig::validate)
/// and [`LodConfig::validate`](crate::LodConfig::validate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Buffer capacity is zero.
    ZeroCapacity,
    /// LOD subdivision ratio is below the minimum of 2.
    RatioTooSmall {
        /// The configured ratio.
        ratio: usize,
    },
    /// LOD level count is zero or above [`MAX_LOD_LEVELS`](crate::config::MAX_LOD_LEVELS).
    InvalidLevels {
        /// The configured level count.
        levels: usize,
    },
    /// The coarsest level's scale factor does not fit in `usize`.
    ScaleOverflow {
        /// The configured ratio.
        ratio: usize,
        /// The configured level count.
        levels: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "buffer capacity must be at least 1"),
            Self::RatioTooSmall { ratio } => {
                write!(f, "lod ratio {ratio} is below minimum of 2")
            }
            Self::InvalidLevels { levels } => {
                write!(
                    f,
                    "lod level count {levels} outside 1..={}",
                    crate::config::MAX_LOD_LEVELS
                )
            }
            Self::ScaleOverflow { ratio, levels } => {
                write!(f, "lod scale {ratio}^{} overflows usize", levels - 1)
            }
        }
    }
}

impl Error for ConfigError {}

/// Errors from the producer feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedError {
    /// The other end of the channel has been dropped.
    Disconnected,
    /// The bounded channel is full (non-blocking send only).
    Full,
    /// The pump thread could not be spawned.
    SpawnFailed {
        /// Description of the spawn failure.
        reason: String,
    },
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "feed channel disconnected"),
            Self::Full => write!(f, "feed channel full"),
            Self::SpawnFailed { reason } => write!(f, "feed thread spawn failed: {reason}"),
        }
    }
}

impl Error for FeedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_levels_names_bound() {
        let e = ConfigError::InvalidLevels { levels: 0 };
        assert_eq!(e.to_string(), "lod level count 0 outside 1..=16");
    }

    #[test]
    fn display_scale_overflow() {
        let e = ConfigError::ScaleOverflow {
            ratio: 1024,
            levels: 8,
        };
        assert_eq!(e.to_string(), "lod scale 1024^7 overflows usize");
    }
}
