//! Error types shared between storage backends and the view pipeline.
//!
//! `Empty` and `Busy` are not errors: they are snapshot statuses
//! (see [`SnapshotResult`](crate::SnapshotResult)). The enums here cover
//! the `Failed` path and the GPU upload boundary.

use std::error::Error;
use std::fmt;

/// Hard failures reported by a [`DataSource`](crate::DataSource).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceError {
    /// The requested LOD level does not exist on this source.
    LevelOutOfRange {
        /// The level that was requested.
        level: usize,
        /// Number of levels the source exposes.
        levels: usize,
    },
    /// The snapshot's record stride does not match the accessors the
    /// series was set up with.
    StrideMismatch {
        /// Stride the accessors read.
        expected: usize,
        /// Stride of the snapshot.
        actual: usize,
    },
    /// The backing store failed for an implementation-specific reason.
    Backend {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LevelOutOfRange { level, levels } => {
                write!(f, "lod level {level} out of range (source has {levels})")
            }
            Self::StrideMismatch { expected, actual } => {
                write!(f, "record stride {actual} does not match accessor stride {expected}")
            }
            Self::Backend { reason } => write!(f, "backend failure: {reason}"),
        }
    }
}

impl Error for SourceError {}

/// Failures at the GPU buffer boundary.
///
/// Treated exactly like a failed snapshot for the affected series: the
/// series is skipped for the frame, never the whole pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadError {
    /// The buffer could not be created or grown to the requested size.
    AllocationFailed {
        /// Number of bytes requested.
        requested: usize,
    },
    /// Writing bytes into the buffer failed.
    UploadFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { requested } => {
                write!(f, "gpu buffer allocation of {requested} bytes failed")
            }
            Self::UploadFailed { reason } => write!(f, "gpu upload failed: {reason}"),
        }
    }
}

impl Error for UploadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_stride_mismatch() {
        let e = SourceError::StrideMismatch {
            expected: 32,
            actual: 16,
        };
        assert_eq!(e.to_string(), "record stride 16 does not match accessor stride 32");
    }

    #[test]
    fn display_level_out_of_range() {
        let e = SourceError::LevelOutOfRange { level: 3, levels: 2 };
        assert_eq!(e.to_string(), "lod level 3 out of range (source has 2)");
    }

    #[test]
    fn display_allocation_failed() {
        let e = UploadError::AllocationFailed { requested: 4096 };
        assert_eq!(e.to_string(), "gpu buffer allocation of 4096 bytes failed");
    }
}
