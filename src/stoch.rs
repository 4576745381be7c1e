use std::{fmt::Display, num::NonZero};

use crate::{
    Bar, Indicator, Ohlcv, Point, Price,
    indicator::{BarClock, align_tail},
    reducer,
    window::RollingWindow,
};

/// %K reported for a window whose highest high equals its lowest low.
pub const ZERO_RANGE_K: f64 = 50.0;

#[inline]
fn percent_k(close: Price, lowest: Price, highest: Price) -> Price {
    let range = highest - lowest;
    if range == 0.0 {
        ZERO_RANGE_K
    } else {
        (close - lowest) / range * 100.0
    }
}

/// Stochastic oscillator %K.
///
/// `(close − lowest low) / (highest high − lowest low) × 100` over each
/// window of `period` bars. A flat window reports [`ZERO_RANGE_K`].
#[must_use]
pub fn stochastic(bars: &[Bar], period: usize) -> Vec<Point> {
    let highs: Vec<Price> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<Price> = bars.iter().map(|b| b.low).collect();
    let offset = period.saturating_sub(1);

    let values = reducer::min(&lows, period)
        .into_iter()
        .zip(reducer::max(&highs, period))
        .zip(&bars[offset.min(bars.len())..])
        .map(|((lowest, highest), bar)| percent_k(bar.close, lowest, highest))
        .collect();

    align_tail(bars, values)
}

/// Stochastic Oscillator %K.
///
/// Keeps the last `period` highs and lows; the extremes are rescanned on every
/// tick, O(period).
#[derive(Clone, Debug)]
pub struct Stochastic {
    period: usize,
    clock: BarClock,
    highs: RollingWindow,
    lows: RollingWindow,
    current: Option<Price>,
}

impl Stochastic {
    #[must_use]
    pub fn new(period: NonZero<usize>) -> Self {
        Self {
            period: period.get(),
            clock: BarClock::default(),
            highs: RollingWindow::new(period.get()),
            lows: RollingWindow::new(period.get()),
            current: None,
        }
    }
}

impl Indicator for Stochastic {
    type Output = Price;

    fn compute(&mut self, bar: &impl Ohlcv) -> Option<Price> {
        let step = self.clock.tick(bar.time());
        self.highs.apply(step, bar.high());
        self.lows.apply(step, bar.low());

        self.current = self
            .lows
            .min()
            .zip(self.highs.max())
            .map(|(lowest, highest)| percent_k(bar.close(), lowest, highest));
        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Display for Stochastic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "STOCH({})", self.period)
    }
}
