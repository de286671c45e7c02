//! View configuration errors.

use std::error::Error;
use std::fmt;

/// Errors detected by [`ViewConfig::validate`](crate::ViewConfig::validate).
#[derive(Clone, Debug, PartialEq)]
pub enum ViewConfigError {
    /// Target pixels-per-sample is NaN, infinite, zero, or negative.
    InvalidTargetDensity {
        /// The invalid value.
        value: f64,
    },
    /// Hysteresis margin is outside `[0, 1)`.
    InvalidHysteresis {
        /// The invalid value.
        value: f64,
    },
    /// Capacity headroom is NaN, infinite, or negative.
    InvalidHeadroom {
        /// The invalid value.
        value: f64,
    },
}

impl fmt::Display for ViewConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTargetDensity { value } => {
                write!(f, "target_pixels_per_sample must be finite and positive, got {value}")
            }
            Self::InvalidHysteresis { value } => {
                write!(f, "hysteresis_margin must be in [0, 1), got {value}")
            }
            Self::InvalidHeadroom { value } => {
                write!(f, "capacity_headroom must be finite and non-negative, got {value}")
            }
        }
    }
}

impl Error for ViewConfigError {}
