//! Lazily created view state for every `(series, view kind)` pair.

use indexmap::IndexMap;
use sluice_core::{GpuUploader, SeriesId, SourceId, ViewKind};

use crate::diag::FailureLog;
use crate::view::{FrameContext, ViewOutcome, ViewRequest, ViewState};

/// All view states, plus the source identity each series was last
/// drawn from.
///
/// A change of identity resets every view of that series, releasing its
/// GPU buffers, before the new source is drawn.
#[derive(Debug, Default)]
pub struct SeriesViews {
    views: IndexMap<(SeriesId, ViewKind), ViewState>,
    sources: IndexMap<SeriesId, SourceId>,
}

impl SeriesViews {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The view state for `(series, kind)`, created on first use and
    /// reset if `source` is not the identity seen last time.
    pub fn view_mut(
        &mut self,
        series: SeriesId,
        kind: ViewKind,
        source: SourceId,
        gpu: &mut dyn GpuUploader,
    ) -> &mut ViewState {
        match self.sources.insert(series, source) {
            Some(previous) if previous != source => {
                log::debug!("series {series}: source {previous} replaced by {source}, resetting views");
                for ((s, _), view) in self.views.iter_mut() {
                    if *s == series {
                        view.reset(gpu);
                    }
                }
            }
            _ => {}
        }
        let view = self.views.entry((series, kind)).or_default();
        view.bind_source(source);
        view
    }

    /// Run [`ViewState::process_view`] for the request's view.
    pub fn process(&mut self, ctx: &mut FrameContext<'_>, req: &ViewRequest<'_>) -> ViewOutcome {
        let identity = req.source.identity();
        let view = self.view_mut(req.series, req.kind, identity, &mut *ctx.gpu);
        view.process_view(ctx, req)
    }

    /// Drop every view of `series`, releasing its GPU buffers and any
    /// pending failure entry.
    pub fn remove_series(
        &mut self,
        series: SeriesId,
        gpu: &mut dyn GpuUploader,
        failures: &mut FailureLog,
    ) -> usize {
        let mut removed = 0;
        self.views.retain(|(s, _), view| {
            if *s == series {
                view.reset(gpu);
                removed += 1;
                false
            } else {
                true
            }
        });
        self.sources.shift_remove(&series);
        failures.forget(series);
        removed
    }

    /// Release every buffer and forget every series.
    pub fn clear(&mut self, gpu: &mut dyn GpuUploader) {
        for view in self.views.values_mut() {
            view.reset(gpu);
        }
        self.views.clear();
        self.sources.clear();
    }

    /// The view state for `(series, kind)`, if it exists.
    pub fn get(&self, series: SeriesId, kind: ViewKind) -> Option<&ViewState> {
        self.views.get(&(series, kind))
    }

    /// Source identity `series` was last drawn from.
    pub fn source_of(&self, series: SeriesId) -> Option<SourceId> {
        self.sources.get(&series).copied()
    }

    /// Number of view states.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether no view state exists.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
