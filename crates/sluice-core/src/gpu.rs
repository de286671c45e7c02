//! The GPU buffer boundary.
//!
//! The view pipeline decides what to upload; an implementation of
//! [`GpuUploader`] owned by the render thread does the actual work.
//! Draw calls are never issued through this interface.

use std::fmt;

use crate::error::UploadError;

/// Opaque handle to a GPU-side byte buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuBufferId(pub u64);

impl fmt::Display for GpuBufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpu#{}", self.0)
    }
}

/// Allocates and fills GPU buffers on behalf of the view pipeline.
///
/// Called from the render thread only, one operation at a time.
pub trait GpuUploader {
    /// Return a buffer of at least `bytes` bytes.
    ///
    /// `current` is the buffer the caller already owns, if any. The
    /// returned handle may differ from it; the caller then owns the new
    /// one and must not use `current` again. Contents are not preserved
    /// across growth.
    fn ensure_capacity(
        &mut self,
        current: Option<GpuBufferId>,
        bytes: usize,
    ) -> Result<GpuBufferId, UploadError>;

    /// Write `data` into `buffer` starting at byte `offset`.
    fn upload_subrange(
        &mut self,
        buffer: GpuBufferId,
        offset: usize,
        data: &[u8],
    ) -> Result<(), UploadError>;

    /// Free a buffer that is no longer needed.
    fn release(&mut self, buffer: GpuBufferId);
}
