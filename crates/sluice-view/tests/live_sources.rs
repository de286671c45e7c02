//! End-to-end: real ring-backed sources feeding the view pipeline.

use std::sync::Arc;
use std::thread;

use sluice_buffer::{feed, LodConfig, LodSource, RingConfig, RingSource, SnapshotMode};
use sluice_core::{
    lod_scales, DataSource, PriceBar, SampleAccessors, SeriesId, TradeSample, ViewKind,
};
use sluice_test_utils::fixtures::{random_walk_bars, ramp_trades};
use sluice_test_utils::MockGpu;
use sluice_view::{TimeWindow, ViewConfig, ViewPipeline, ViewRequest};

#[test]
fn zooming_moves_between_lod_levels() {
    let config = LodConfig {
        ring: RingConfig {
            capacity: 4096,
            snapshot_mode: SnapshotMode::Copy,
        },
        ratio: 4,
        levels: 3,
    };
    let source = LodSource::<PriceBar>::new(&config).unwrap();
    source.push_batch(&random_walk_bars(7, 4096));

    let scales = lod_scales(&source);
    let acc = SampleAccessors::of::<PriceBar>();
    let mut gpu = MockGpu::new();
    let mut pipe = ViewPipeline::new(ViewConfig::default()).unwrap();
    let mut req = ViewRequest {
        series: SeriesId(7),
        kind: ViewKind::Main,
        source: &source,
        accessors: &acc,
        scales: &scales[..],
        window: TimeWindow::new(0, 4095),
        width_px: 512.0,
    };

    // 4096 bars over 512 px: level 2 (scale 16) lands on 2 px/sample.
    pipe.begin_frame();
    let wide = pipe.process(&mut gpu, &req);
    assert!(wide.can_draw);
    assert_eq!(wide.level, 2);
    assert_eq!((wide.first, wide.count), (0, 256));
    assert_eq!(wide.uploaded_bytes, 256 * 32);

    // A ~100 s window is sparse enough for raw bars.
    req.window = TimeWindow::new(1000, 1100);
    pipe.begin_frame();
    let narrow = pipe.process(&mut gpu, &req);
    assert!(narrow.can_draw);
    assert_eq!(narrow.level, 0);
    assert_eq!((narrow.first, narrow.count), (999, 102));
    assert_eq!(pipe.metrics().level_switches, 1);
    assert!(pipe.failures().is_empty());
}

#[test]
fn rendering_while_a_feed_writes() {
    const CAPACITY: usize = 1024;
    let source = Arc::new(RingSource::<TradeSample>::new(CAPACITY, SnapshotMode::Shared));
    let (tx, pump) = feed::channel(16);
    let pump = pump.spawn(Arc::clone(&source)).unwrap();

    let producer = thread::spawn(move || {
        let all = ramp_trades(20_000);
        for chunk in all.chunks(50) {
            tx.send_batch(chunk.to_vec()).unwrap();
        }
    });

    let acc = SampleAccessors::of::<TradeSample>();
    let scales = lod_scales(&*source);
    let mut gpu = MockGpu::new();
    let mut pipe = ViewPipeline::new(ViewConfig::default()).unwrap();
    let request = |kind, width_px| ViewRequest {
        series: SeriesId(1),
        kind,
        source: &*source,
        accessors: &acc,
        scales: &scales[..],
        window: TimeWindow::new(i64::MIN, i64::MAX),
        width_px,
    };

    for _ in 0..200 {
        pipe.begin_frame();
        for (kind, width) in [(ViewKind::Main, 1600.0), (ViewKind::Preview, 400.0)] {
            let outcome = pipe.process(&mut gpu, &request(kind, width));
            if outcome.can_draw {
                assert!(outcome.count <= CAPACITY);
                assert!(outcome.first + outcome.count <= CAPACITY);
            }
        }
    }

    producer.join().unwrap();
    let stats = pump.join().unwrap();
    assert_eq!(stats.samples, 20_000);

    pipe.begin_frame();
    let last = pipe.process(&mut gpu, &request(ViewKind::Main, 1600.0));
    assert!(last.can_draw);
    assert!(!last.stale);
    assert_eq!((last.first, last.count), (0, CAPACITY));
    assert!(pipe.failures().is_empty());

    let view = pipe.views().get(SeriesId(1), ViewKind::Main).unwrap();
    assert_eq!(view.last_sequence().0, 20_000);
}

#[test]
fn cleared_and_refilled_source_is_uploaded_again() {
    let source = RingSource::<TradeSample>::new(64, SnapshotMode::Copy);
    let acc = SampleAccessors::of::<TradeSample>();
    let scales = lod_scales(&source);
    let mut gpu = MockGpu::new();
    let mut pipe = ViewPipeline::new(ViewConfig::default()).unwrap();
    let req = ViewRequest {
        series: SeriesId(3),
        kind: ViewKind::Main,
        source: &source,
        accessors: &acc,
        scales: &scales[..],
        window: TimeWindow::new(0, 9),
        width_px: 400.0,
    };

    let flat = |price: f32| (0..10).map(|t| TradeSample::new(t, price, 1.0)).collect::<Vec<_>>();
    source.push_batch(&flat(1.0));
    pipe.begin_frame();
    assert_eq!(pipe.process(&mut gpu, &req).uploaded_bytes, 160);

    // Same sample count, so the sequence after the refill matches the old one.
    let refill = flat(999.0);
    source.clear();
    source.push_batch(&refill);
    pipe.begin_frame();
    let outcome = pipe.process(&mut gpu, &req);
    assert!(outcome.can_draw);
    assert_eq!(outcome.uploaded_bytes, 160);
    assert_eq!(source.value_range(), Some((999.0, 999.0)));

    let buffer = pipe
        .views()
        .get(SeriesId(3), ViewKind::Main)
        .and_then(|v| v.gpu_buffer())
        .unwrap();
    let expected: &[u8] = bytemuck::cast_slice(&refill);
    assert_eq!(&gpu.buffer(buffer).unwrap()[..160], expected);
}
