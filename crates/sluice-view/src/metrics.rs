//! Cumulative counters for the view pipeline.

/// Counters updated by [`ViewState::process_view`](crate::ViewState::process_view).
///
/// All fields are cumulative since the metrics were created or last
/// reset. Consumers diff successive reads for per-frame rates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineMetrics {
    /// Snapshots actually requested from a data source.
    pub fetches: u64,
    /// Snapshot requests served by the frame cache.
    pub cache_hits: u64,
    /// GPU uploads performed (one per refilled view, not per slice).
    pub uploads: u64,
    /// Bytes sent to the GPU.
    pub uploaded_bytes: u64,
    /// GPU buffer allocations or growths.
    pub buffer_grows: u64,
    /// LOD level changes on views that already had data.
    pub level_switches: u64,
    /// Frames drawn from stale data.
    pub stale_frames: u64,
    /// Views skipped because of a fetch or upload failure.
    pub failures: u64,
}

impl PipelineMetrics {
    /// Zero every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
