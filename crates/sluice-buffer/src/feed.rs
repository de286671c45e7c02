//! Producer feed: a bounded channel from sample producers to one sink.
//!
//! Any number of [`FeedSender`]s hand batches to a single [`FeedPump`],
//! which is the only thread that writes to the sink. This keeps the
//! single-producer contract of [`SampleRing`](crate::SampleRing) intact
//! even when samples originate on several threads.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::error::FeedError;
use crate::source::SampleSink;

/// Create a feed whose channel holds at most `bound` pending batches
/// (0 is coerced to 1).
pub fn channel<T>(bound: usize) -> (FeedSender<T>, FeedPump<T>) {
    let (tx, rx) = crossbeam_channel::bounded(bound.max(1));
    (FeedSender { tx }, FeedPump { rx })
}

/// Counters returned by the pump.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Non-empty batches written to the sink.
    pub batches: u64,
    /// Samples written to the sink.
    pub samples: u64,
}

/// Sending half of a feed. Cheap to clone.
pub struct FeedSender<T> {
    tx: Sender<Vec<T>>,
}

impl<T> Clone for FeedSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> FeedSender<T> {
    /// Send one sample, blocking while the channel is full.
    pub fn send(&self, sample: T) -> Result<(), FeedError> {
        self.send_batch(vec![sample])
    }

    /// Send a batch, blocking while the channel is full.
    pub fn send_batch(&self, batch: Vec<T>) -> Result<(), FeedError> {
        self.tx.send(batch).map_err(|_| FeedError::Disconnected)
    }

    /// Send a batch without blocking.
    pub fn try_send_batch(&self, batch: Vec<T>) -> Result<(), FeedError> {
        self.tx.try_send(batch).map_err(|e| match e {
            TrySendError::Full(_) => FeedError::Full,
            TrySendError::Disconnected(_) => FeedError::Disconnected,
        })
    }
}

/// Receiving half of a feed. Writes every batch into a [`SampleSink`].
pub struct FeedPump<T> {
    rx: Receiver<Vec<T>>,
}

impl<T> FeedPump<T> {
    /// Drain batches into `sink` until every sender is dropped.
    pub fn run<S: SampleSink<T> + ?Sized>(&self, sink: &S) -> FeedStats {
        let mut stats = FeedStats::default();
        for batch in self.rx.iter() {
            Self::deliver(sink, &batch, &mut stats);
        }
        stats
    }

    /// Drain whatever is queued right now without blocking.
    pub fn pump_pending<S: SampleSink<T> + ?Sized>(&self, sink: &S) -> FeedStats {
        let mut stats = FeedStats::default();
        for batch in self.rx.try_iter() {
            Self::deliver(sink, &batch, &mut stats);
        }
        stats
    }

    fn deliver<S: SampleSink<T> + ?Sized>(sink: &S, batch: &[T], stats: &mut FeedStats) {
        if batch.is_empty() {
            return;
        }
        sink.push_samples(batch);
        stats.batches += 1;
        stats.samples += batch.len() as u64;
    }

    /// Number of batches waiting in the channel.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl<T: Send + 'static> FeedPump<T> {
    /// Run the pump on a dedicated `sluice-feed` thread.
    ///
    /// The thread exits once every sender is dropped and returns its
    /// counters through the join handle.
    pub fn spawn<S>(self, sink: Arc<S>) -> Result<JoinHandle<FeedStats>, FeedError>
    where
        S: SampleSink<T> + 'static,
    {
        thread::Builder::new()
            .name("sluice-feed".into())
            .spawn(move || {
                let stats = self.run(&*sink);
                log::debug!(
                    "feed pump finished: {} batches, {} samples",
                    stats.batches,
                    stats.samples
                );
                stats
            })
            .map_err(|e| FeedError::SpawnFailed {
                reason: e.to_string(),
            })
    }
}
