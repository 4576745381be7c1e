use serde::{Deserialize, Serialize};

/// A price value.
///
/// Semantic alias for [`f64`]. Documents intent in function signatures
/// without introducing newtype construction overhead.
pub type Price = f64;

/// Bar time in unix seconds.
///
/// Bars are keyed by this value: equal times identify the same bar, a larger
/// time starts a new one.
pub type Timestamp = i64;

/// OHLCV bar data accepted by the streaming indicators.
///
/// Implement this on your own kline/candle type to avoid per-tick
/// conversion. [`Bar`] is the engine's own implementation.
///
/// # Bar boundaries
///
/// Indicators detect new bars by comparing [`time`](Ohlcv::time) values: the
/// same timestamp updates (repaints) the current bar, a newer timestamp
/// advances the window.
///
/// # Example
///
/// ```
/// use chartstream_ta::{Ohlcv, Price, Timestamp};
///
/// struct MyKline {
///     o: f64, h: f64, l: f64, c: f64,
///     ts: i64,
/// }
///
/// impl Ohlcv for MyKline {
///     fn open(&self) -> Price { self.o }
///     fn high(&self) -> Price { self.h }
///     fn low(&self) -> Price { self.l }
///     fn close(&self) -> Price { self.c }
///     fn time(&self) -> Timestamp { self.ts }
/// }
/// ```
pub trait Ohlcv {
    /// Opening price of the bar.
    fn open(&self) -> Price;

    /// Highest price during the bar.
    fn high(&self) -> Price;

    /// Lowest price during the bar.
    fn low(&self) -> Price;

    /// Closing (or latest) price of the bar.
    fn close(&self) -> Price;

    /// Bar open time in unix seconds.
    ///
    /// Values must be non-decreasing between calls to a streaming indicator.
    fn time(&self) -> Timestamp;

    /// Trade volume during the bar. Defaults to `0.0`.
    fn volume(&self) -> f64 {
        0.0
    }
}

/// One OHLCV interval.
///
/// The engine does not check `low <= open, close <= high`. Malformed bars flow
/// through the arithmetic and may produce NaN or infinite outputs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: Timestamp,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    #[must_use]
    pub fn new(time: Timestamp, open: Price, high: Price, low: Price, close: Price) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume: 0.0,
        }
    }
}

impl Ohlcv for Bar {
    fn open(&self) -> Price {
        self.open
    }

    fn high(&self) -> Price {
        self.high
    }

    fn low(&self) -> Price {
        self.low
    }

    fn close(&self) -> Price {
        self.close
    }

    fn time(&self) -> Timestamp {
        self.time
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

/// A single output sample of an indicator channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub time: Timestamp,
    pub value: f64,
}

impl Point {
    #[inline]
    #[must_use]
    pub fn new(time: Timestamp, value: f64) -> Self {
        Self { time, value }
    }
}

/// True range of `bar` against the previous bar's close:
/// `max(high - low, |high - prev_close|, |low - prev_close|)`.
#[inline]
pub(crate) fn true_range(bar: &impl Ohlcv, prev_close: Price) -> Price {
    let hl = bar.high() - bar.low();
    let hc = (bar.high() - prev_close).abs();
    let lc = (bar.low() - prev_close).abs();
    hl.max(hc).max(lc)
}
