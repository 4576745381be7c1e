use std::{fmt::Display, num::NonZero};

use crate::{
    Bar, Indicator, Ohlcv, Point, Price,
    indicator::{BarClock, align_tail, closes},
    reducer,
    window::RollingWindow,
};

/// Simple moving average of closing prices.
///
/// `output[i] = mean(close[i - period + 1 ..= i])`, stamped with the time of
/// the window's last bar. Returns an empty vec when `bars` is shorter than
/// `period` or `period` is zero.
///
/// ```
/// use chartstream_ta::{Bar, Point, sma};
///
/// let bars = [
///     Bar::new(0, 10.0, 12.0, 9.0, 11.0),
///     Bar::new(1, 11.0, 13.0, 10.0, 12.0),
///     Bar::new(2, 12.0, 12.0, 10.0, 10.0),
/// ];
/// assert_eq!(sma(&bars, 2), vec![Point::new(1, 11.5), Point::new(2, 11.0)]);
/// ```
#[must_use]
pub fn sma(bars: &[Bar], period: usize) -> Vec<Point> {
    align_tail(bars, reducer::mean(&closes(bars), period))
}

/// Simple Moving Average (SMA).
///
/// Computes the unweighted mean of the last *n* closes, where *n* is the
/// configured period. Returns `None` until the window is full.
///
/// Uses a running sum for O(1) updates per bar. Supports live repainting:
/// feeding a bar with the same `time` replaces the current value without
/// advancing the window.
#[derive(Clone, Debug)]
pub struct Sma {
    period: usize,
    clock: BarClock,
    window: RollingWindow,
    current: Option<Price>,
}

impl Sma {
    #[must_use]
    pub fn new(period: NonZero<usize>) -> Self {
        Self {
            period: period.get(),
            clock: BarClock::default(),
            window: RollingWindow::new(period.get()),
            current: None,
        }
    }
}

impl Indicator for Sma {
    type Output = Price;

    #[inline]
    fn compute(&mut self, bar: &impl Ohlcv) -> Option<Price> {
        let step = self.clock.tick(bar.time());
        self.window.apply(step, bar.close());

        self.current = self.window.mean();
        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Display for Sma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SMA({})", self.period)
    }
}
