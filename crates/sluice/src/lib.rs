//! Sluice: a streaming chart data pipeline.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Sluice sub-crates. Producers push samples into ring-backed sources;
//! the render thread asks a [`view::ViewPipeline`] each frame what to draw
//! and uploads to the GPU only when the drawn data actually changed.
//!
//! # Quick start
//!
//! ```rust
//! use sluice::prelude::*;
//!
//! // An uploader that hands out ids and discards the bytes.
//! struct NullGpu {
//!     next: u64,
//! }
//! impl GpuUploader for NullGpu {
//!     fn ensure_capacity(
//!         &mut self,
//!         current: Option<GpuBufferId>,
//!         _bytes: usize,
//!     ) -> Result<GpuBufferId, UploadError> {
//!         Ok(current.unwrap_or_else(|| {
//!             self.next += 1;
//!             GpuBufferId(self.next)
//!         }))
//!     }
//!     fn upload_subrange(
//!         &mut self,
//!         _buffer: GpuBufferId,
//!         _offset: usize,
//!         _data: &[u8],
//!     ) -> Result<(), UploadError> {
//!         Ok(())
//!     }
//!     fn release(&mut self, _buffer: GpuBufferId) {}
//! }
//!
//! let source = RingSource::<TradeSample>::new(1024, SnapshotMode::Copy);
//! let trades: Vec<TradeSample> = (0..100).map(|t| TradeSample::new(t, 100.0, 1.0)).collect();
//! source.push_batch(&trades);
//!
//! let accessors = SampleAccessors::of::<TradeSample>();
//! let scales = lod_scales(&source);
//! let mut pipeline = ViewPipeline::new(ViewConfig::default()).unwrap();
//! let mut gpu = NullGpu { next: 0 };
//!
//! pipeline.begin_frame();
//! let outcome = pipeline.process(
//!     &mut gpu,
//!     &ViewRequest {
//!         series: SeriesId(1),
//!         kind: ViewKind::Main,
//!         source: &source,
//!         accessors: &accessors,
//!         scales: &scales[..],
//!         window: TimeWindow::new(10, 50),
//!         width_px: 800.0,
//!     },
//! );
//! assert!(outcome.can_draw);
//! // One sample of context before the window start.
//! assert_eq!((outcome.first, outcome.count), (9, 42));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sluice-core` | IDs, records, snapshots, the `DataSource` and `GpuUploader` traits |
//! | [`buffer`] | `sluice-buffer` | Sample rings, ring and LOD sources, producer feeds |
//! | [`view`] | `sluice-view` | LOD selection, windowing, per-view upload caching |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`sluice-core`).
///
/// Contains the record types, [`types::Snapshot`], and the two seams of
/// the pipeline: [`types::DataSource`] and [`types::GpuUploader`].
pub use sluice_core as types;

/// Concurrent sample storage (`sluice-buffer`).
///
/// [`buffer::RingSource`] for raw series, [`buffer::LodSource`] for
/// multi-resolution series, and [`buffer::feed`] for multi-threaded
/// producers.
pub use sluice_buffer as buffer;

/// Per-frame view decisions (`sluice-view`).
pub use sluice_view as view;

/// Common imports for typical Sluice usage.
///
/// ```rust
/// use sluice::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use sluice_core::{
        lod_scales, DataSource, GpuBufferId, GpuUploader, PriceBar, SampleAccessors,
        SampleRecord, SeriesId, Snapshot, SnapshotResult, TradeSample, ViewKind,
    };

    // Errors
    pub use sluice_core::{SourceError, UploadError};
    pub use sluice_buffer::{ConfigError, FeedError};
    pub use sluice_view::{SeriesFailure, ViewConfigError};

    // Sources
    pub use sluice_buffer::{LodConfig, LodSource, RingConfig, RingSource, SnapshotMode};

    // View pipeline
    pub use sluice_view::{
        StalePolicy, TimeWindow, ViewConfig, ViewOutcome, ViewPipeline, ViewRequest,
    };
}
