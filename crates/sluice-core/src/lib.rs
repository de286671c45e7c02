//! Core types and traits for the Sluice streaming chart pipeline.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared by storage backends and the
//! render-side view pipeline: identifiers, fixed-stride sample records,
//! snapshots with shared lifetime, the [`DataSource`] trait, the
//! [`GpuUploader`] boundary, and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod gpu;
pub mod id;
pub mod sample;
pub mod snapshot;
pub mod source;

pub use error::{SourceError, UploadError};
pub use gpu::{GpuBufferId, GpuUploader};
pub use id::{FrameId, Sequence, SeriesId, SourceId, ViewKind};
pub use sample::{PriceBar, SampleAccessors, SampleRecord, TradeSample};
pub use snapshot::{LifetimeGuard, Snapshot, SnapshotMemory, SnapshotResult, SnapshotStatus};
pub use source::{lod_scales, DataSource};
