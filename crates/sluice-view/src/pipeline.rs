//! One render thread's complete view pipeline state.

use sluice_core::{FrameId, GpuUploader, SeriesId};

use crate::config::ViewConfig;
use crate::diag::FailureLog;
use crate::error::ViewConfigError;
use crate::frame::FrameSnapshotCache;
use crate::metrics::PipelineMetrics;
use crate::registry::SeriesViews;
use crate::view::{FrameContext, ViewOutcome, ViewRequest};

/// Owns the frame cache, view registry, failure log and metrics.
///
/// Call [`begin_frame`](Self::begin_frame) once per rendered frame, then
/// [`process`](Self::process) for each visible view. The GPU uploader is
/// passed in per call so the caller keeps ownership of the device.
#[derive(Debug)]
pub struct ViewPipeline {
    config: ViewConfig,
    frame: FrameId,
    cache: FrameSnapshotCache,
    views: SeriesViews,
    failures: FailureLog,
    metrics: PipelineMetrics,
}

impl ViewPipeline {
    /// Build a pipeline from a validated configuration.
    pub fn new(config: ViewConfig) -> Result<Self, ViewConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            frame: FrameId(0),
            cache: FrameSnapshotCache::new(),
            views: SeriesViews::new(),
            failures: FailureLog::new(),
            metrics: PipelineMetrics::default(),
        })
    }

    /// Advance to the next frame, invalidating the snapshot cache.
    pub fn begin_frame(&mut self) -> FrameId {
        self.frame = self.frame.next();
        self.cache.begin_frame(self.frame);
        self.frame
    }

    /// Decide what to draw for one view in the current frame.
    pub fn process(&mut self, gpu: &mut dyn GpuUploader, req: &ViewRequest<'_>) -> ViewOutcome {
        let mut ctx = FrameContext {
            cache: &mut self.cache,
            gpu,
            config: &self.config,
            failures: &mut self.failures,
            metrics: &mut self.metrics,
        };
        self.views.process(&mut ctx, req)
    }

    /// Forget a series and release its GPU buffers.
    pub fn remove_series(&mut self, series: SeriesId, gpu: &mut dyn GpuUploader) -> usize {
        self.views.remove_series(series, gpu, &mut self.failures)
    }

    /// The current frame.
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    /// Pipeline tuning.
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Per-view state.
    pub fn views(&self) -> &SeriesViews {
        &self.views
    }

    /// Currently failing series.
    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Zero the counters.
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }
}
