//! Test utilities and mock types for Sluice development.
//!
//! Provides a scripted [`MockSource`] implementing [`DataSource`] that
//! counts snapshot requests, a [`MockGpu`] implementing [`GpuUploader`]
//! that counts uploaded bytes, and deterministic sample fixtures.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use sluice_core::{
    DataSource, GpuBufferId, GpuUploader, SampleRecord, Sequence, Snapshot, SnapshotResult,
    SourceError, SourceId, UploadError,
};

/// Mock implementation of [`DataSource`].
///
/// Each level returns a scripted [`SnapshotResult`] (initially
/// `Empty`). Every `try_snapshot` call is counted per level so tests can
/// assert how often the pipeline actually fetched.
pub struct MockSource {
    identity: Mutex<SourceId>,
    scales: Vec<usize>,
    results: Vec<Mutex<SnapshotResult>>,
    calls: Vec<AtomicUsize>,
}

impl MockSource {
    /// A source with one level per entry of `scales`.
    pub fn new(scales: &[usize]) -> Self {
        Self {
            identity: Mutex::new(SourceId::next()),
            scales: scales.to_vec(),
            results: scales.iter().map(|_| Mutex::new(SnapshotResult::Empty)).collect(),
            calls: scales.iter().map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    /// A single-level source already holding `records`.
    pub fn with_records<T: SampleRecord>(records: Vec<T>, sequence: u64) -> Self {
        let source = Self::new(&[1]);
        source.set_records(0, records, sequence);
        source
    }

    /// Script `level` to return `result`.
    pub fn set_result(&self, level: usize, result: SnapshotResult) {
        *self.results[level].lock().unwrap() = result;
    }

    /// Script `level` to return a ready snapshot of `records`.
    pub fn set_records<T: SampleRecord>(&self, level: usize, records: Vec<T>, sequence: u64) {
        let snapshot = Snapshot::from_vec(records, Sequence(sequence));
        self.set_result(level, SnapshotResult::from_snapshot(snapshot));
    }

    /// Number of `try_snapshot` calls made for `level`.
    pub fn snapshot_calls(&self, level: usize) -> usize {
        self.calls[level].load(Ordering::Relaxed)
    }

    /// Number of `try_snapshot` calls across all levels.
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Simulate swapping in a different conceptual source.
    pub fn renew_identity(&self) -> SourceId {
        let mut id = self.identity.lock().unwrap();
        *id = SourceId::next();
        *id
    }
}

impl DataSource for MockSource {
    fn identity(&self) -> SourceId {
        *self.identity.lock().unwrap()
    }

    fn try_snapshot(&self, level: usize) -> SnapshotResult {
        let Some(result) = self.results.get(level) else {
            return SnapshotResult::Failed(SourceError::LevelOutOfRange {
                level,
                levels: self.results.len(),
            });
        };
        self.calls[level].fetch_add(1, Ordering::Relaxed);
        result.lock().unwrap().clone()
    }

    fn lod_levels(&self) -> usize {
        self.scales.len()
    }

    fn lod_scale(&self, level: usize) -> usize {
        self.scales.get(level).copied().unwrap_or(1)
    }

    fn current_sequence(&self, level: usize) -> Sequence {
        match self.results.get(level).map(|r| r.lock().unwrap().clone()) {
            Some(SnapshotResult::Ready(snap)) => snap.sequence(),
            _ => Sequence::ZERO,
        }
    }
}

/// Mock implementation of [`GpuUploader`].
///
/// Buffers are plain byte vectors. Counters record every allocation and
/// upload; failures can be injected for either operation.
#[derive(Default)]
pub struct MockGpu {
    next_id: u64,
    buffers: HashMap<GpuBufferId, Vec<u8>>,
    uploaded_bytes: usize,
    upload_calls: usize,
    allocations: usize,
    released: Vec<GpuBufferId>,
    fail_allocation: bool,
    fail_upload: bool,
}

impl MockGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes written through `upload_subrange`.
    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }

    /// Number of successful `upload_subrange` calls.
    pub fn upload_calls(&self) -> usize {
        self.upload_calls
    }

    /// Number of times a buffer was created or grown.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Buffers not yet released.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Contents of a live buffer.
    pub fn buffer(&self, id: GpuBufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|b| b.as_slice())
    }

    /// Buffers released so far, in order.
    pub fn released(&self) -> &[GpuBufferId] {
        &self.released
    }

    pub fn set_fail_allocation(&mut self, fail: bool) {
        self.fail_allocation = fail;
    }

    pub fn set_fail_upload(&mut self, fail: bool) {
        self.fail_upload = fail;
    }
}

impl GpuUploader for MockGpu {
    fn ensure_capacity(
        &mut self,
        current: Option<GpuBufferId>,
        bytes: usize,
    ) -> Result<GpuBufferId, UploadError> {
        if let Some(id) = current {
            if self.buffers.get(&id).is_some_and(|b| b.len() >= bytes) {
                return Ok(id);
            }
        }
        if self.fail_allocation {
            return Err(UploadError::AllocationFailed { requested: bytes });
        }
        let id = match current.filter(|id| self.buffers.contains_key(id)) {
            Some(id) => id,
            None => {
                self.next_id += 1;
                GpuBufferId(self.next_id)
            }
        };
        self.buffers.insert(id, vec![0; bytes]);
        self.allocations += 1;
        Ok(id)
    }

    fn upload_subrange(
        &mut self,
        buffer: GpuBufferId,
        offset: usize,
        data: &[u8],
    ) -> Result<(), UploadError> {
        if self.fail_upload {
            return Err(UploadError::UploadFailed {
                reason: "injected failure".into(),
            });
        }
        let target = self.buffers.get_mut(&buffer).ok_or_else(|| UploadError::UploadFailed {
            reason: format!("unknown buffer {buffer}"),
        })?;
        let end = offset + data.len();
        if end > target.len() {
            return Err(UploadError::UploadFailed {
                reason: format!("write of {end} bytes exceeds {} byte buffer", target.len()),
            });
        }
        target[offset..end].copy_from_slice(data);
        self.uploaded_bytes += data.len();
        self.upload_calls += 1;
        Ok(())
    }

    fn release(&mut self, buffer: GpuBufferId) {
        self.buffers.remove(&buffer);
        self.released.push(buffer);
    }
}
