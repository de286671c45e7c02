//! Integration test: one producer, several readers, no torn reads.
//!
//! The producer writes the values `0, 1, 2, ...` in order. Every copy a
//! reader takes must therefore be a run of consecutive values ending at
//! `sequence - 1`, with length `min(sequence, capacity)`. Any violation
//! means a reader observed a partially applied push.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use sluice_buffer::{RingSource, SampleRing, SnapshotMode};
use sluice_core::{DataSource, SampleAccessors, SnapshotResult, TradeSample};

const CAPACITY: usize = 257;
const TOTAL: u64 = 200_000;

fn check_consistent(values: &[u64], sequence: u64) {
    assert!(values.len() <= CAPACITY);
    assert_eq!(values.len() as u64, sequence.min(CAPACITY as u64));
    if let Some(&last) = values.last() {
        assert_eq!(last, sequence - 1);
    }
    for pair in values.windows(2) {
        assert_eq!(pair[1], pair[0] + 1, "torn read at sequence {sequence}");
    }
}

#[test]
fn readers_never_observe_partial_pushes() {
    let ring = Arc::new(SampleRing::<u64>::new(CAPACITY));
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let ring = Arc::clone(&ring);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut buf = Vec::new();
                let mut reads = 0u64;
                let mut last_seq = 0;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    let result = ring.copy_to(&mut buf);
                    check_consistent(&buf, result.sequence.0);
                    assert!(result.sequence.0 >= last_seq, "sequence went backwards");
                    last_seq = result.sequence.0;

                    let view = ring.share();
                    let shared: Vec<u64> = view.iter().copied().collect();
                    check_consistent(&shared, view.sequence().0);
                    reads += 1;
                    if finished {
                        break;
                    }
                }
                reads
            })
        })
        .collect();

    // Mix single pushes with batches of varying size, some larger than
    // the capacity.
    let mut next = 0u64;
    let mut batch_len = 1usize;
    while next < TOTAL {
        if batch_len == 1 {
            ring.push(next);
            next += 1;
        } else {
            let end = (next + batch_len as u64).min(TOTAL);
            let batch: Vec<u64> = (next..end).collect();
            ring.push_batch(&batch);
            next = end;
        }
        batch_len = batch_len % 300 + 1;
    }
    done.store(true, Ordering::Release);

    for r in readers {
        let reads = r.join().unwrap();
        assert!(reads > 0);
    }
    assert_eq!(ring.sequence().0, TOTAL);
    let mut buf = Vec::new();
    ring.copy_to(&mut buf);
    check_consistent(&buf, TOTAL);
}

#[test]
fn sequence_observation_implies_data_visible() {
    let ring = Arc::new(SampleRing::<u64>::new(CAPACITY));
    let producer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            for v in 0..TOTAL / 4 {
                ring.push(v);
            }
        })
    };

    let mut buf = Vec::new();
    loop {
        let seen = ring.sequence().0;
        let result = ring.copy_to(&mut buf);
        assert!(result.sequence.0 >= seen);
        if seen > 0 {
            assert!(buf.last().copied().unwrap_or(0) >= seen - 1);
        }
        if seen == TOTAL / 4 {
            break;
        }
    }
    producer.join().unwrap();
}

#[test]
fn source_snapshots_are_consistent_under_load() {
    for mode in [SnapshotMode::Copy, SnapshotMode::Shared] {
        let source = Arc::new(RingSource::<TradeSample>::new(CAPACITY, mode));
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let source = Arc::clone(&source);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let acc = SampleAccessors::of::<TradeSample>();
                let mut ready = 0u64;
                while !done.load(Ordering::Acquire) {
                    match source.try_snapshot(0) {
                        SnapshotResult::Ready(snap) => {
                            let ts: Vec<u64> = snap.timestamps(&acc).map(|t| t as u64).collect();
                            check_consistent(&ts, snap.sequence().0);
                            ready += 1;
                        }
                        SnapshotResult::Empty | SnapshotResult::Busy => {}
                        SnapshotResult::Failed(e) => panic!("unexpected failure: {e}"),
                    }
                }
                ready
            })
        };

        for chunk in 0..500i64 {
            let batch: Vec<TradeSample> = (chunk * 20..chunk * 20 + 20)
                .map(|t| TradeSample::new(t, t as f32, 1.0))
                .collect();
            source.push_batch(&batch);
        }
        done.store(true, Ordering::Release);
        reader.join().unwrap();
        assert_eq!(source.current_sequence(0).0, 10_000);
    }
}
