use std::{fmt::Display, num::NonZero};

use crate::{
    Bar, Indicator, Ohlcv, Point, Price,
    indicator::{BarClock, align_tail, closes},
    reducer,
    window::RollingWindow,
};

/// Batch Bollinger Bands: three channels with identical timestamps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BbSeries {
    pub upper: Vec<Point>,
    pub middle: Vec<Point>,
    pub lower: Vec<Point>,
}

/// Bollinger Bands over closing prices.
///
/// `middle` is the SMA; `upper` and `lower` are offset by
/// `std_dev × σ`, with `σ` the population standard deviation of the same
/// window.
#[must_use]
pub fn bollinger_bands(bars: &[Bar], period: usize, std_dev: f64) -> BbSeries {
    let closes = closes(bars);
    let middle = align_tail(bars, reducer::mean(&closes, period));
    let sigmas = reducer::variance(&closes, period)
        .into_iter()
        .map(f64::sqrt);

    let (upper, lower) = middle
        .iter()
        .zip(sigmas)
        .map(|(m, sigma)| {
            let offset = std_dev * sigma;
            (
                Point::new(m.time, m.value + offset),
                Point::new(m.time, m.value - offset),
            )
        })
        .unzip();

    BbSeries {
        upper,
        middle,
        lower,
    }
}

/// Bollinger Bands output: upper, middle, and lower bands.
///
/// ```text
/// upper  = SMA + k × σ
/// middle = SMA
/// lower  = SMA − k × σ
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BbValue {
    upper: Price,
    middle: Price,
    lower: Price,
}

impl BbValue {
    /// Upper band: `SMA + k × σ`.
    #[inline]
    #[must_use]
    pub fn upper(&self) -> Price {
        self.upper
    }

    /// Middle band: SMA of the window.
    #[inline]
    #[must_use]
    pub fn middle(&self) -> Price {
        self.middle
    }

    /// Lower band: `SMA − k × σ`.
    #[inline]
    #[must_use]
    pub fn lower(&self) -> Price {
        self.lower
    }

    /// Band width: `upper − lower`.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl Display for BbValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BB(u: {}, m: {}, l: {})",
            self.upper, self.middle, self.lower
        )
    }
}

/// Bollinger Bands (BB).
///
/// The middle band comes from a running sum. The standard deviation is
/// recomputed over the window on every tick (two passes, O(period)), which
/// keeps it exact at high price levels where a running sum of squares would
/// cancel to zero.
///
/// Supports live repainting: feeding a bar with the same `time` replaces
/// the current value without advancing the window.
///
/// The multiplier is not validated here; the registry rejects non-positive
/// values before building one.
#[derive(Clone, Debug)]
pub struct Bb {
    period: usize,
    std_dev: f64,
    clock: BarClock,
    window: RollingWindow,
    current: Option<BbValue>,
}

impl Bb {
    #[must_use]
    pub fn new(period: NonZero<usize>, std_dev: f64) -> Self {
        Self {
            period: period.get(),
            std_dev,
            clock: BarClock::default(),
            window: RollingWindow::new(period.get()),
            current: None,
        }
    }
}

impl Indicator for Bb {
    type Output = BbValue;

    #[inline]
    fn compute(&mut self, bar: &impl Ohlcv) -> Option<BbValue> {
        let step = self.clock.tick(bar.time());
        self.window.apply(step, bar.close());

        self.current = self
            .window
            .mean()
            .zip(self.window.variance())
            .map(|(mean, variance)| {
                let offset = variance.sqrt() * self.std_dev;
                BbValue {
                    upper: mean + offset,
                    middle: mean,
                    lower: mean - offset,
                }
            });
        self.current
    }

    #[inline]
    fn value(&self) -> Option<BbValue> {
        self.current
    }
}

impl Display for Bb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BB({}, {})", self.period, self.std_dev)
    }
}
