//! Render-side view pipeline for the Sluice streaming chart pipeline.
//!
//! Every frame, for every `(series, view kind)` pair:
//!
//! 1. fetch a snapshot through the [`FrameSnapshotCache`] so main and
//!    preview views share one fetch per `(source, level)`;
//! 2. pick a LOD level with [`choose_level`];
//! 3. binary-search the visible window with [`visible_range`];
//! 4. let [`ViewState`] decide whether the GPU buffer must be refilled.
//!
//! All state is explicit and caller-owned. [`ViewPipeline`] bundles it
//! for the common case of one render thread.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod diag;
pub mod error;
pub mod frame;
pub mod lod;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod view;
pub mod window;

pub use config::{StalePolicy, ViewConfig};
pub use diag::{FailureLog, SeriesFailure};
pub use error::ViewConfigError;
pub use frame::FrameSnapshotCache;
pub use lod::{choose_level, pixels_per_sample};
pub use metrics::PipelineMetrics;
pub use pipeline::ViewPipeline;
pub use registry::SeriesViews;
pub use view::{FrameContext, TimeWindow, ViewOutcome, ViewRequest, ViewState};
pub use window::visible_range;
