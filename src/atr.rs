use std::{fmt::Display, num::NonZero};

use crate::{
    Bar, Indicator, Ohlcv, Point, Price,
    indicator::{BarClock, Step, align_tail},
    ohlcv::true_range,
    reducer,
    window::RollingWindow,
};

/// Average True Range with simple averaging.
///
/// True range needs the previous close, so the first bar has none. Each
/// window of `period` true ranges is averaged arithmetically and stamped with
/// the bar that closes it; the first point lands on bar `period`.
#[must_use]
pub fn atr(bars: &[Bar], period: usize) -> Vec<Point> {
    let ranges: Vec<Price> = bars
        .windows(2)
        .map(|pair| true_range(&pair[1], pair[0].close))
        .collect();

    align_tail(bars, reducer::mean(&ranges, period))
}

/// Average True Range (ATR).
///
/// Keeps the last `period` true ranges in a rolling window; each tick is O(1).
/// Like [`Rsi`](crate::Rsi), the previous close is fixed once a bar advances,
/// so a repaint only replaces the current bar's true range.
#[derive(Clone, Debug)]
pub struct Atr {
    period: usize,
    clock: BarClock,
    prev_close: Option<Price>,
    cur_close: Option<Price>,
    ranges: RollingWindow,
    current: Option<Price>,
}

impl Atr {
    #[must_use]
    pub fn new(period: NonZero<usize>) -> Self {
        Self {
            period: period.get(),
            clock: BarClock::default(),
            prev_close: None,
            cur_close: None,
            ranges: RollingWindow::new(period.get()),
            current: None,
        }
    }
}

impl Indicator for Atr {
    type Output = Price;

    fn compute(&mut self, bar: &impl Ohlcv) -> Option<Price> {
        if self.clock.tick(bar.time()) == Step::Advance {
            self.prev_close = self.cur_close;
            if let Some(prev_close) = self.prev_close {
                self.ranges.push(true_range(bar, prev_close));
            }
        } else if let Some(prev_close) = self.prev_close {
            self.ranges.replace_last(true_range(bar, prev_close));
        }
        self.cur_close = Some(bar.close());

        self.current = self.ranges.mean();
        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Display for Atr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ATR({})", self.period)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{nz, ohlc, times, values};

    fn sample() -> Vec<Bar> {
        vec![
            ohlc(10.0, 12.0, 9.0, 11.0, 0),
            ohlc(11.0, 13.0, 10.0, 12.0, 1),
            ohlc(12.0, 12.0, 10.0, 10.0, 2),
            ohlc(10.0, 15.0, 10.0, 14.0, 3),
        ]
    }

    mod batch {
        use super::*;

        #[test]
        fn period_one_is_true_range_from_second_bar() {
            let out = atr(&sample()[..2], 1);
            // max(13 - 10, |13 - 11|, |10 - 11|) = 3
            assert_eq!(out, vec![Point::new(1, 3.0)]);
        }

        #[test]
        fn averages_true_ranges() {
            // TRs: 3, 2, 5
            let out = atr(&sample(), 2);
            assert_eq!(times(&out), vec![2, 3]);
            assert_eq!(values(&out), vec![2.5, 3.5]);
        }

        #[test]
        fn gap_uses_previous_close() {
            let bars = [ohlc(10.0, 10.0, 10.0, 10.0, 0), ohlc(20.0, 21.0, 20.0, 21.0, 1)];
            assert_eq!(values(&atr(&bars, 1)), vec![11.0]);
        }

        #[test]
        fn empty_when_too_short() {
            assert!(atr(&sample()[..1], 1).is_empty());
            assert!(atr(&sample(), 4).is_empty());
            assert!(atr(&[], 14).is_empty());
        }
    }

    mod streaming {
        use super::*;

        #[test]
        fn first_bar_yields_nothing() {
            let mut atr = Atr::new(nz(1));
            assert_eq!(atr.compute(&sample()[0]), None);
            assert_eq!(atr.compute(&sample()[1]), Some(3.0));
        }

        #[test]
        fn matches_batch() {
            let bars = sample();
            let mut stream = Atr::new(nz(2));
            let streamed: Vec<f64> = bars.iter().filter_map(|b| stream.compute(b)).collect();
            assert_eq!(streamed, values(&atr(&bars, 2)));
        }

        #[test]
        fn repaint_replaces_current_range() {
            let mut atr = Atr::new(nz(1));
            atr.compute(&ohlc(10.0, 12.0, 9.0, 11.0, 0));
            assert_eq!(atr.compute(&ohlc(11.0, 13.0, 10.0, 12.0, 1)), Some(3.0));
            // Still measured against bar 0's close
            assert_eq!(atr.compute(&ohlc(11.0, 17.0, 10.0, 16.0, 1)), Some(7.0));
        }

        #[test]
        fn repaint_of_first_bar_keeps_waiting() {
            let mut atr = Atr::new(nz(1));
            atr.compute(&ohlc(10.0, 12.0, 9.0, 11.0, 0));
            assert_eq!(atr.compute(&ohlc(10.0, 14.0, 9.0, 13.0, 0)), None);
            // TR against the repainted close 13: max(3, 0, 3) = 3
            assert_eq!(atr.compute(&ohlc(11.0, 13.0, 10.0, 12.0, 1)), Some(3.0));
        }
    }

    #[test]
    fn display() {
        assert_eq!(Atr::new(nz(14)).to_string(), "ATR(14)");
    }
}
