//! Fixed-stride sample records and per-sample accessors.
//!
//! Samples cross the GPU boundary as raw bytes, so every record is
//! `#[repr(C)]` with byte-exact field offsets: an 8-byte timestamp
//! followed by 4-byte float fields. Vertex attribute setup elsewhere
//! reads the uploaded range at these offsets.
//!
//! The render side never dispatches on the record type per sample.
//! Instead a [`SampleAccessors`] record of plain function pointers is
//! resolved once per series with [`SampleAccessors::of`] and applied to
//! opaque byte slices.

use std::mem::size_of;

use bytemuck::{Pod, Zeroable};

/// A fixed-layout record that can live in a sample buffer.
///
/// Implementors must be `#[repr(C)]` plain-old-data so that the byte
/// view handed to the GPU matches the declared layout.
pub trait SampleRecord: Pod + Send + Sync {
    /// Timestamp used for windowing. Expected to be non-decreasing in
    /// insertion order.
    fn timestamp(&self) -> i64;

    /// The primary plotted value.
    fn value(&self) -> f64;

    /// Low/high bounds covered by this sample, used for axis ranging.
    ///
    /// Point samples return `(value, value)`.
    fn value_bounds(&self) -> (f64, f64) {
        let v = self.value();
        (v, v)
    }

    /// Optional auxiliary metric (volume, quantity).
    fn aux(&self) -> Option<f64> {
        None
    }

    /// Combine this sample with a later one into a single coarser sample.
    ///
    /// Used to build LOD levels. Must be associative so that aggregates
    /// of aggregates equal aggregates of the raw samples.
    fn merge(&self, later: &Self) -> Self;
}

// ── Records ────────────────────────────────────────────────────────

/// A single trade print (16 bytes).
///
/// | offset | field     | type |
/// |--------|-----------|------|
/// | 0      | timestamp | i64  |
/// | 8      | price     | f32  |
/// | 12     | quantity  | f32  |
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TradeSample {
    /// Trade time.
    pub timestamp: i64,
    /// Execution price.
    pub price: f32,
    /// Traded quantity.
    pub quantity: f32,
}

impl TradeSample {
    /// Create a trade sample.
    pub fn new(timestamp: i64, price: f32, quantity: f32) -> Self {
        Self {
            timestamp,
            price,
            quantity,
        }
    }
}

impl SampleRecord for TradeSample {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn value(&self) -> f64 {
        f64::from(self.price)
    }

    fn aux(&self) -> Option<f64> {
        Some(f64::from(self.quantity))
    }

    fn merge(&self, later: &Self) -> Self {
        Self {
            timestamp: self.timestamp,
            price: later.price,
            quantity: self.quantity + later.quantity,
        }
    }
}

/// An OHLCV price bar (32 bytes).
///
/// | offset | field     | type |
/// |--------|-----------|------|
/// | 0      | timestamp | i64  |
/// | 8      | open      | f32  |
/// | 12     | high      | f32  |
/// | 16     | low       | f32  |
/// | 20     | close     | f32  |
/// | 24     | volume    | f32  |
/// | 28     | padding   | u32  |
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PriceBar {
    /// Bar open time.
    pub timestamp: i64,
    /// First price in the bar.
    pub open: f32,
    /// Highest price in the bar.
    pub high: f32,
    /// Lowest price in the bar.
    pub low: f32,
    /// Last price in the bar.
    pub close: f32,
    /// Total traded volume.
    pub volume: f32,
    /// Keeps the record 8-byte aligned without implicit padding.
    pub _pad: u32,
}

impl PriceBar {
    /// Create a bar from its OHLCV components.
    pub fn new(timestamp: i64, open: f32, high: f32, low: f32, close: f32, volume: f32) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            _pad: 0,
        }
    }
}

impl SampleRecord for PriceBar {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn value(&self) -> f64 {
        f64::from(self.close)
    }

    fn value_bounds(&self) -> (f64, f64) {
        (f64::from(self.low), f64::from(self.high))
    }

    fn aux(&self) -> Option<f64> {
        Some(f64::from(self.volume))
    }

    fn merge(&self, later: &Self) -> Self {
        Self {
            timestamp: self.timestamp,
            open: self.open,
            high: self.high.max(later.high),
            low: self.low.min(later.low),
            close: later.close,
            volume: self.volume + later.volume,
            _pad: 0,
        }
    }
}

// ── Accessors ──────────────────────────────────────────────────────

/// Reads fields out of an opaque, `stride`-sized byte slice.
///
/// Resolved once per series at setup time. Each function expects a
/// slice of at least `stride` bytes starting at a record boundary and
/// panics on a shorter one.
#[derive(Clone, Copy, Debug)]
pub struct SampleAccessors {
    /// Size of one record in bytes.
    pub stride: usize,
    /// Reads the timestamp.
    pub timestamp: fn(&[u8]) -> i64,
    /// Reads the primary value.
    pub value: fn(&[u8]) -> f64,
    /// Reads the low/high bounds.
    pub range: fn(&[u8]) -> (f64, f64),
    /// Reads the auxiliary metric, if the record has one.
    pub aux: fn(&[u8]) -> Option<f64>,
}

impl SampleAccessors {
    /// Build the accessor set for record type `T`.
    pub fn of<T: SampleRecord>() -> Self {
        Self {
            stride: size_of::<T>(),
            timestamp: read_timestamp::<T>,
            value: read_value::<T>,
            range: read_range::<T>,
            aux: read_aux::<T>,
        }
    }
}

fn decode<T: SampleRecord>(bytes: &[u8]) -> T {
    bytemuck::pod_read_unaligned(&bytes[..size_of::<T>()])
}

fn read_timestamp<T: SampleRecord>(bytes: &[u8]) -> i64 {
    decode::<T>(bytes).timestamp()
}

fn read_value<T: SampleRecord>(bytes: &[u8]) -> f64 {
    decode::<T>(bytes).value()
}

fn read_range<T: SampleRecord>(bytes: &[u8]) -> (f64, f64) {
    decode::<T>(bytes).value_bounds()
}

fn read_aux<T: SampleRecord>(bytes: &[u8]) -> Option<f64> {
    decode::<T>(bytes).aux()
}
