use std::{fmt::Display, num::NonZero};

use crate::{
    Bar, Indicator, Ohlcv, Point, Price,
    indicator::{BarClock, Step, align_tail},
    reducer,
    window::RollingWindow,
};

#[inline]
fn gain_and_loss(change: Price) -> (Price, Price) {
    (change.max(0.0), (-change).max(0.0))
}

/// `100 - 100 / (1 + avg_gain / avg_loss)`, saturating at 100 when there
/// are no losses in the window.
#[inline]
fn rsi_from_averages(avg_gain: Price, avg_loss: Price) -> Price {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Relative Strength Index with simple (non-Wilder) averaging.
///
/// Gains and losses come from bar-to-bar close changes. Each window of
/// `period` changes is averaged arithmetically. The point is stamped with the
/// bar that closes the last change, so the first point lands on bar
/// `period`.
#[must_use]
pub fn rsi(bars: &[Bar], period: usize) -> Vec<Point> {
    let (gains, losses): (Vec<Price>, Vec<Price>) = bars
        .windows(2)
        .map(|pair| gain_and_loss(pair[1].close - pair[0].close))
        .unzip();

    let values = reducer::mean(&gains, period)
        .into_iter()
        .zip(reducer::mean(&losses, period))
        .map(|(avg_gain, avg_loss)| rsi_from_averages(avg_gain, avg_loss))
        .collect();

    align_tail(bars, values)
}

/// Relative Strength Index (RSI).
///
/// Momentum oscillator in `[0, 100]`. Keeps rolling windows of the last
/// `period` gains and losses; each tick is O(1).
///
/// The close of the previous bar is fixed once a bar advances, so repainting
/// the current bar only replaces its own change.
///
/// # Example
///
/// ```
/// use chartstream_ta::{Bar, Indicator, Rsi};
/// use std::num::NonZero;
///
/// let bar = |close, time| Bar::new(time, close, close, close, close);
/// let mut rsi = Rsi::new(NonZero::new(3).unwrap());
///
/// // Need 3 price changes (4 bars)
/// assert_eq!(rsi.compute(&bar(10.0, 1)), None);
/// assert_eq!(rsi.compute(&bar(12.0, 2)), None);
/// assert_eq!(rsi.compute(&bar(11.0, 3)), None);
///
/// // changes = +2, −1, +2 → avg_gain = 4/3, avg_loss = 1/3 → RSI = 80
/// let value = rsi.compute(&bar(13.0, 4)).unwrap();
/// assert!((value - 80.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct Rsi {
    period: usize,
    clock: BarClock,
    prev_close: Option<Price>,
    cur_close: Option<Price>,
    gains: RollingWindow,
    losses: RollingWindow,
    current: Option<Price>,
}

impl Rsi {
    #[must_use]
    pub fn new(period: NonZero<usize>) -> Self {
        Self {
            period: period.get(),
            clock: BarClock::default(),
            prev_close: None,
            cur_close: None,
            gains: RollingWindow::new(period.get()),
            losses: RollingWindow::new(period.get()),
            current: None,
        }
    }
}

impl Indicator for Rsi {
    type Output = Price;

    fn compute(&mut self, bar: &impl Ohlcv) -> Option<Price> {
        let step = self.clock.tick(bar.time());

        if step == Step::Advance {
            self.prev_close = self.cur_close;
        }
        self.cur_close = Some(bar.close());

        // First bar has no change
        if let Some(prev_close) = self.prev_close {
            let (gain, loss) = gain_and_loss(bar.close() - prev_close);
            self.gains.apply(step, gain);
            self.losses.apply(step, loss);
        }

        self.current = self
            .gains
            .mean()
            .zip(self.losses.mean())
            .map(|(avg_gain, avg_loss)| rsi_from_averages(avg_gain, avg_loss));
        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Display for Rsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RSI({})", self.period)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, bar, bars, nz, times, values};

    fn rsi_of(period: usize) -> Rsi {
        Rsi::new(nz(period))
    }

    mod batch {
        use super::*;

        #[test]
        fn first_point_is_one_bar_after_change_window() {
            let out = rsi(&bars(&[10.0, 12.0, 11.0, 13.0, 12.0]), 3);
            assert_eq!(times(&out), vec![3, 4]);
            // +2, -1, +2 → 4/3 vs 1/3 → 80
            assert_approx!(out[0].value, 80.0);
        }

        #[test]
        fn no_losses_saturates_at_100() {
            let out = rsi(&bars(&[1.0, 2.0, 3.0, 3.0]), 3);
            assert_eq!(values(&out), vec![100.0]);
        }

        #[test]
        fn no_gains_is_zero() {
            let out = rsi(&bars(&[5.0, 4.0, 3.0]), 2);
            assert_eq!(values(&out), vec![0.0]);
        }

        #[test]
        fn needs_period_plus_one_bars() {
            assert!(rsi(&bars(&[1.0, 2.0, 3.0]), 3).is_empty());
            assert!(rsi(&bars(&[1.0]), 1).is_empty());
            assert!(rsi(&[], 14).is_empty());
        }

        #[test]
        fn bounded() {
            let out = rsi(&bars(&[5.0, 9.0, 2.0, 7.0, 7.5, 1.0, 8.0, 3.0]), 2);
            assert!(out.iter().all(|p| (0.0..=100.0).contains(&p.value)));
        }
    }

    mod streaming {
        use super::*;

        #[test]
        fn none_until_period_changes() {
            let mut rsi = rsi_of(2);
            assert_eq!(rsi.compute(&bar(10.0, 1)), None);
            assert_eq!(rsi.compute(&bar(11.0, 2)), None);
            assert!(rsi.compute(&bar(12.0, 3)).is_some());
        }

        #[test]
        fn matches_batch() {
            let closes = [44.0, 44.3, 44.1, 43.6, 44.3, 44.8, 45.1, 45.4, 45.2, 45.6];
            let expected = rsi(&bars(&closes), 4);

            let mut rsi = rsi_of(4);
            let streamed: Vec<f64> = bars(&closes)
                .iter()
                .filter_map(|b| rsi.compute(b))
                .collect();

            assert_eq!(streamed.len(), expected.len());
            for (s, e) in streamed.iter().zip(&expected) {
                assert!((s - e.value).abs() < 1e-9, "streamed={s}, batch={}", e.value);
            }
        }

        #[test]
        fn repaint_replaces_current_change() {
            let mut rsi = rsi_of(1);
            rsi.compute(&bar(10.0, 1));
            assert_eq!(rsi.compute(&bar(9.0, 2)), Some(0.0));
            // Still measured against bar 1's close
            assert_eq!(rsi.compute(&bar(11.0, 2)), Some(100.0));
        }

        #[test]
        fn losses_evicted_back_to_exact_saturation() {
            let mut rsi = rsi_of(2);
            for (close, time) in [(10.0, 1), (9.7, 2), (9.9, 3), (10.3, 4), (10.6, 5)] {
                rsi.compute(&bar(close, time));
            }
            assert_eq!(rsi.value(), Some(100.0));
        }
    }

    #[test]
    fn display() {
        assert_eq!(rsi_of(14).to_string(), "RSI(14)");
    }
}
