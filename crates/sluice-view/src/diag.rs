//! Per-series failure diagnostics.
//!
//! A failing series is skipped for the frame, never escalated. The
//! failure is logged once when it starts and once more when the series
//! recovers, no matter how many frames it spans.

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;
use sluice_core::{SeriesId, SourceError, UploadError, ViewKind};

/// Why a view was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeriesFailure {
    /// No usable snapshot at any fallback level.
    Source(SourceError),
    /// The GPU buffer could not be allocated or filled.
    Upload(UploadError),
}

impl fmt::Display for SeriesFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(e) => write!(f, "source: {e}"),
            Self::Upload(e) => write!(f, "upload: {e}"),
        }
    }
}

impl Error for SeriesFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(e) => Some(e),
            Self::Upload(e) => Some(e),
        }
    }
}

impl From<SourceError> for SeriesFailure {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

impl From<UploadError> for SeriesFailure {
    fn from(e: UploadError) -> Self {
        Self::Upload(e)
    }
}

/// Currently failing series, deduplicated by [`SeriesId`].
///
/// The view that first failed owns the entry: only its recovery clears
/// it, so a series whose preview keeps failing while its main view
/// succeeds is not logged every frame.
#[derive(Debug, Default)]
pub struct FailureLog {
    active: IndexMap<SeriesId, (ViewKind, SeriesFailure)>,
    reported: u64,
}

impl FailureLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. Returns `true` if it was newly reported.
    pub fn record(&mut self, series: SeriesId, kind: ViewKind, failure: SeriesFailure) -> bool {
        if self.active.contains_key(&series) {
            return false;
        }
        log::warn!("series {series} ({kind}) skipped: {failure}");
        self.active.insert(series, (kind, failure));
        self.reported += 1;
        true
    }

    /// Record a successful frame for `(series, kind)`.
    pub fn recover(&mut self, series: SeriesId, kind: ViewKind) {
        if matches!(self.active.get(&series), Some((k, _)) if *k == kind) {
            self.active.shift_remove(&series);
            log::debug!("series {series} ({kind}) recovered");
        }
    }

    /// Drop any entry for a removed series without logging.
    pub fn forget(&mut self, series: SeriesId) {
        self.active.shift_remove(&series);
    }

    /// The active failure for `series`, if any.
    pub fn get(&self, series: SeriesId) -> Option<&SeriesFailure> {
        self.active.get(&series).map(|(_, f)| f)
    }

    /// Whether `series` is currently failing.
    pub fn is_failing(&self, series: SeriesId) -> bool {
        self.active.contains_key(&series)
    }

    /// Number of currently failing series.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no series is failing.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Failures reported over the log's lifetime.
    pub fn reported(&self) -> u64 {
        self.reported
    }
}
