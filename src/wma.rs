use std::{fmt::Display, num::NonZero};

use crate::{
    Bar, Indicator, Ohlcv, Point, Price,
    indicator::{BarClock, align_tail, closes},
    reducer,
    window::RollingWindow,
};

/// Linearly weighted moving average of closing prices.
///
/// The j-th most recent close (j = 0 is the current bar) weighs
/// `period - j`; the sum is normalised by the sum of weights.
#[must_use]
pub fn wma(bars: &[Bar], period: usize) -> Vec<Point> {
    align_tail(bars, reducer::weighted_mean(&closes(bars), period))
}

/// Weighted Moving Average (WMA).
///
/// Keeps a running weighted sum so each tick is O(1): on advance every
/// weight in the window drops by one, which subtracts the plain window sum.
#[derive(Clone, Debug)]
pub struct Wma {
    period: usize,
    clock: BarClock,
    window: RollingWindow,
    current: Option<Price>,
}

impl Wma {
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

impl Indicator for Wma {
    type Output = Price;

    #[inline]
    fn compute(&mut self, bar: &impl Ohlcv) -> Option<Price> {
        let step = self.clock.tick(bar.time());
        self.window.apply(step, bar.close());

        self.current = self.window.weighted_mean();
        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Display for Wma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WMA({})", self.period)
    }
}
