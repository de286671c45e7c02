//! Concurrent sample storage for the Sluice streaming chart pipeline.
//!
//! The producer side of the pipeline:
//!
//! ```text
//! FeedSender ──(crossbeam channel)──▶ FeedPump
//!                                        │ push_batch
//!                                        ▼
//!                          RingSource / LodSource  (DataSource)
//!                          └── SampleRing × levels (Mutex + AtomicU64 sequence)
//!                                        │ try_snapshot
//!                                        ▼
//!                              render thread (sluice-view)
//! ```
//!
//! One producer thread writes; any number of readers take snapshots.
//! Every snapshot reflects the buffer either before or after a given
//! push, never a mix.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod feed;
pub mod lod;
pub mod range;
pub mod ring;
pub mod source;

pub use config::{LodConfig, RingConfig, SnapshotMode};
pub use error::{ConfigError, FeedError};
pub use feed::{FeedPump, FeedSender, FeedStats};
pub use lod::LodSource;
pub use range::ValueRangeTracker;
pub use ring::{CopyResult, RingView, SampleRing};
pub use source::{RingSource, SampleSink};
