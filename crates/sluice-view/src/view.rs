//! Per-view state and the per-frame upload decision.
//!
//! A [`ViewState`] belongs to one `(series, view kind)` pair and owns
//! that pair's GPU buffer. Each frame,
//! [`process_view`](ViewState::process_view) picks a LOD level, finds
//! the visible records, and refills the GPU buffer only when what it
//! holds can no longer serve the frame.
//!
//! # Upload rule
//!
//! The buffer is refilled when any of these hold:
//!
//! - nothing valid has been uploaded yet;
//! - the snapshot sequence differs from the uploaded one;
//! - the applied LOD level changed;
//! - the visible records need more bytes than the buffer holds;
//! - the visible records are not all inside the uploaded range.
//!
//! Otherwise the frame draws from the existing buffer at
//! [`ViewOutcome::buffer_first`].
//!
//! # States
//!
//! `Empty` until the first successful upload, then `Populated` for
//! good. [`reset`](ViewState::reset) is the only way back, used when the
//! source identity changes or the series is removed.

use std::ops::Range;

use sluice_core::{
    DataSource, GpuBufferId, GpuUploader, SampleAccessors, Sequence, SeriesId, Snapshot,
    SnapshotResult, SourceError, SourceId, UploadError, ViewKind,
};

use crate::config::ViewConfig;
use crate::diag::{FailureLog, SeriesFailure};
use crate::frame::FrameSnapshotCache;
use crate::lod::{choose_level, pixels_per_sample};
use crate::metrics::PipelineMetrics;
use crate::window::visible_range;

/// Visible time range, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    /// Earliest visible timestamp.
    pub t_min: i64,
    /// Latest visible timestamp.
    pub t_max: i64,
}

impl TimeWindow {
    /// A window covering `[t_min, t_max]`.
    pub fn new(t_min: i64, t_max: i64) -> Self {
        Self { t_min, t_max }
    }
}

/// Everything `process_view` needs to know about one view this frame.
#[derive(Clone, Copy)]
pub struct ViewRequest<'a> {
    /// Series key, used for failure deduplication.
    pub series: SeriesId,
    /// Which view of the series is being drawn.
    pub kind: ViewKind,
    /// The series' data.
    pub source: &'a dyn DataSource,
    /// Field readers for the source's record type.
    pub accessors: &'a SampleAccessors,
    /// Scale of every LOD level, finest first.
    pub scales: &'a [usize],
    /// Visible time range.
    pub window: TimeWindow,
    /// Plot width in pixels.
    pub width_px: f64,
}

/// Frame-wide collaborators shared by every view.
pub struct FrameContext<'a> {
    /// Snapshot cache for the current frame.
    pub cache: &'a mut FrameSnapshotCache,
    /// GPU buffer allocator and uploader.
    pub gpu: &'a mut dyn GpuUploader,
    /// Pipeline tuning.
    pub config: &'a ViewConfig,
    /// Deduplicated failure diagnostics.
    pub failures: &'a mut FailureLog,
    /// Cumulative counters.
    pub metrics: &'a mut PipelineMetrics,
}

impl FrameContext<'_> {
    fn fetch(&mut self, source: &dyn DataSource, identity: SourceId, level: usize) -> SnapshotResult {
        let (result, hit) = self.cache.get_or_fetch(source, identity, level);
        if hit {
            self.metrics.cache_hits += 1;
        } else {
            self.metrics.fetches += 1;
        }
        result
    }
}

/// Accessors decode `stride`-sized records; any other stride would read
/// past the record or misalign every field.
fn check_stride(snap: &Snapshot, req: &ViewRequest<'_>) -> Result<(), SourceError> {
    let expected = req.accessors.stride;
    let actual = snap.stride();
    if expected == actual {
        Ok(())
    } else {
        Err(SourceError::StrideMismatch { expected, actual })
    }
}

/// What to draw for one view this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewOutcome {
    /// Whether the view has anything to draw.
    pub can_draw: bool,
    /// First visible record, as a logical index into the level's snapshot.
    pub first: usize,
    /// Number of visible records.
    pub count: usize,
    /// LOD level the records come from.
    pub level: usize,
    /// Index of `first` within the GPU buffer.
    pub buffer_first: usize,
    /// Whether the records were reused from an earlier frame.
    pub stale: bool,
    /// Bytes uploaded this frame.
    pub uploaded_bytes: usize,
}

/// Mutable per-view cache. See the [module docs](self).
#[derive(Debug, Default)]
pub struct ViewState {
    /// Source identity resolved by the owning registry for this frame.
    source: Option<SourceId>,
    gpu_buffer: Option<GpuBufferId>,
    gpu_capacity: usize,
    last_sequence: Sequence,
    last_level: Option<usize>,
    last_first: usize,
    last_count: usize,
    /// Logical record range currently held by the GPU buffer.
    uploaded: Range<usize>,
    stale_frames: u32,
    has_valid: bool,
}

impl ViewState {
    /// A view that has never drawn.
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the GPU buffer and return to the empty state.
    pub fn reset(&mut self, gpu: &mut dyn GpuUploader) {
        if let Some(buffer) = self.gpu_buffer.take() {
            gpu.release(buffer);
        }
        *self = Self::default();
    }

    /// Pin the source identity used for fetches until the next reset.
    pub(crate) fn bind_source(&mut self, identity: SourceId) {
        self.source = Some(identity);
    }

    /// Whether a previous frame left drawable data in the GPU buffer.
    pub fn is_populated(&self) -> bool {
        self.has_valid
    }

    /// The GPU buffer this view owns.
    pub fn gpu_buffer(&self) -> Option<GpuBufferId> {
        self.gpu_buffer
    }

    /// Size of the owned GPU buffer in bytes.
    pub fn gpu_capacity(&self) -> usize {
        self.gpu_capacity
    }

    /// Sequence of the uploaded data.
    pub fn last_sequence(&self) -> Sequence {
        self.last_sequence
    }

    /// Level of the uploaded data.
    pub fn last_level(&self) -> Option<usize> {
        self.last_level
    }

    /// Consecutive frames drawn from stale data.
    pub fn stale_frames(&self) -> u32 {
        self.stale_frames
    }

    /// Decide what to draw for this frame and refill the GPU buffer if
    /// needed.
    pub fn process_view(
        &mut self,
        ctx: &mut FrameContext<'_>,
        req: &ViewRequest<'_>,
    ) -> ViewOutcome {
        let identity = self.source.unwrap_or_else(|| req.source.identity());
        let levels = req.scales.len().max(1);
        let scale = |level: usize| req.scales.get(level).copied().unwrap_or(1).max(1);

        // Read the level drawn last frame (or level 0) to learn how
        // many raw samples the window spans.
        let mut measured_level = self.last_level.unwrap_or(0).min(levels - 1);
        let mut measured = ctx.fetch(req.source, identity, measured_level);
        if !matches!(measured, SnapshotResult::Ready(_)) && measured_level != 0 {
            measured_level = 0;
            measured = ctx.fetch(req.source, identity, 0);
        }
        let measured_snap = match measured {
            SnapshotResult::Ready(snap) => {
                if let Err(e) = check_stride(&snap, req) {
                    return self.fail(ctx, req, e.into());
                }
                snap
            }
            SnapshotResult::Failed(e) => return self.unavailable(ctx, req, Some(e.into())),
            SnapshotResult::Empty | SnapshotResult::Busy => return self.unavailable(ctx, req, None),
        };
        let measured_window = self.window_of(&measured_snap, req);

        let level0_samples = measured_window.1.saturating_mul(scale(measured_level));
        let base_pps = pixels_per_sample(req.width_px, level0_samples);
        let target = choose_level(
            req.scales,
            measured_level,
            ctx.config.target_pixels_per_sample,
            base_pps,
            ctx.config.hysteresis_margin,
        );

        // Fall back to the measured level when the target level has nothing to offer.
        let (level, snap, (first, count)) = if target == measured_level {
            (measured_level, measured_snap, measured_window)
        } else {
            match ctx.fetch(req.source, identity, target) {
                SnapshotResult::Ready(snap) => {
                    if let Err(e) = check_stride(&snap, req) {
                        return self.fail(ctx, req, e.into());
                    }
                    let window = self.window_of(&snap, req);
                    (target, snap, window)
                }
                other => {
                    log::trace!(
                        "series {} ({}): level {target} {:?}, staying on {measured_level}",
                        req.series,
                        req.kind,
                        other.status()
                    );
                    (measured_level, measured_snap, measured_window)
                }
            }
        };

        if count == 0 {
            // Window is outside the data. Nothing to draw, nothing wrong.
            ctx.failures.recover(req.series, req.kind);
            self.stale_frames = 0;
            return ViewOutcome {
                level,
                ..ViewOutcome::default()
            };
        }

        let uploaded_bytes = match self.upload_if_needed(ctx, req, level, &snap, first, count) {
            Ok(bytes) => bytes,
            Err(e) => {
                // Buffer contents are unknown now; force a full refill.
                self.has_valid = false;
                self.uploaded = 0..0;
                return self.fail(ctx, req, e.into());
            }
        };

        self.last_first = first;
        self.last_count = count;
        self.stale_frames = 0;
        self.has_valid = true;
        ctx.failures.recover(req.series, req.kind);

        ViewOutcome {
            can_draw: true,
            first,
            count,
            level,
            buffer_first: first - self.uploaded.start,
            stale: false,
            uploaded_bytes,
        }
    }

    fn window_of(&self, snap: &Snapshot, req: &ViewRequest<'_>) -> (usize, usize) {
        visible_range(snap, req.accessors.timestamp, req.window.t_min, req.window.t_max)
    }

    fn upload_if_needed(
        &mut self,
        ctx: &mut FrameContext<'_>,
        req: &ViewRequest<'_>,
        level: usize,
        snap: &Snapshot,
        first: usize,
        count: usize,
    ) -> Result<usize, UploadError> {
        let sequence = snap.sequence();
        let required = count * snap.stride();
        let level_changed = self.last_level != Some(level);
        let grow = self.gpu_buffer.is_none() || required > self.gpu_capacity;
        let contained = self.uploaded.start <= first && first + count <= self.uploaded.end;

        let needed = !self.has_valid
            || sequence != self.last_sequence
            || level_changed
            || grow
            || !contained;
        if !needed {
            return Ok(0);
        }

        if level_changed && self.last_level.is_some() {
            ctx.metrics.level_switches += 1;
            log::debug!(
                "series {} ({}): lod level {:?} -> {level}",
                req.series,
                req.kind,
                self.last_level
            );
        }

        if grow {
            let capacity = ctx.config.grown_capacity(required);
            let buffer = ctx.gpu.ensure_capacity(self.gpu_buffer, capacity)?;
            log::debug!(
                "series {} ({}): gpu buffer {buffer} grown {} -> {capacity} bytes",
                req.series,
                req.kind,
                self.gpu_capacity
            );
            self.gpu_buffer = Some(buffer);
            self.gpu_capacity = capacity;
            ctx.metrics.buffer_grows += 1;
        }
        let buffer = self
            .gpu_buffer
            .ok_or(UploadError::AllocationFailed { requested: required })?;

        let mut offset = 0;
        for slice in snap.byte_range(first, count) {
            ctx.gpu.upload_subrange(buffer, offset, slice)?;
            offset += slice.len();
        }

        self.uploaded = first..first + count;
        self.last_sequence = sequence;
        self.last_level = Some(level);
        ctx.metrics.uploads += 1;
        ctx.metrics.uploaded_bytes += offset as u64;
        Ok(offset)
    }

    /// No snapshot this frame: reuse the previous slice if the stale
    /// policy allows it.
    fn unavailable(
        &mut self,
        ctx: &mut FrameContext<'_>,
        req: &ViewRequest<'_>,
        failure: Option<SeriesFailure>,
    ) -> ViewOutcome {
        if let Some(failure) = failure {
            return self.fail(ctx, req, failure);
        }
        self.stale_or_skip(ctx)
    }

    fn fail(
        &mut self,
        ctx: &mut FrameContext<'_>,
        req: &ViewRequest<'_>,
        failure: SeriesFailure,
    ) -> ViewOutcome {
        ctx.metrics.failures += 1;
        ctx.failures.record(req.series, req.kind, failure);
        self.stale_or_skip(ctx)
    }

    fn stale_or_skip(&mut self, ctx: &mut FrameContext<'_>) -> ViewOutcome {
        let level = self.last_level.unwrap_or(0);
        if !self.has_valid || !ctx.config.stale_policy.permits(self.stale_frames) {
            return ViewOutcome {
                level,
                ..ViewOutcome::default()
            };
        }
        self.stale_frames += 1;
        ctx.metrics.stale_frames += 1;
        ViewOutcome {
            can_draw: true,
            first: self.last_first,
            count: self.last_count,
            level,
            buffer_first: self.last_first - self.uploaded.start,
            stale: true,
            uploaded_bytes: 0,
        }
    }
}

