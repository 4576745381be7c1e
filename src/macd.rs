use std::{fmt::Display, num::NonZero};

use crate::{
    Bar, Indicator, Ohlcv, Point, Price,
    ema::{EmaState, ema, ema_points},
};

/// Batch MACD output: three channels, each ordered by time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MacdSeries {
    /// `EMA(fast) − EMA(slow)`, from the first time both exist.
    pub macd: Vec<Point>,
    /// `EMA(signal)` of the MACD line.
    pub signal: Vec<Point>,
    /// `macd − signal` wherever both exist.
    pub histogram: Vec<Point>,
}

/// Pairs two time-ordered series on equal timestamps.
///
/// The two inputs start at different bars (a shorter EMA period emits
/// earlier), so positional pairing would subtract values of different bars.
fn join_by_time(a: &[Point], b: &[Point], f: impl Fn(f64, f64) -> f64) -> Vec<Point> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].time.cmp(&b[j].time) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(Point::new(a[i].time, f(a[i].value, b[j].value)));
                i += 1;
                j += 1;
            }
        }
    }

    out
}

/// Moving Average Convergence/Divergence over closing prices.
///
/// Any zero period, or a series too short for the slow EMA, yields empty
/// channels.
#[must_use]
pub fn macd(bars: &[Bar], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let macd = join_by_time(&ema(bars, fast), &ema(bars, slow), |f, s| f - s);
    let signal = ema_points(&macd, signal);
    let histogram = join_by_time(&macd, &signal, |m, s| m - s);

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

/// MACD output for one bar.
///
/// The signal line and histogram start `signal - 1` bars after the MACD line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    macd: Price,
    signal: Option<Price>,
}

impl MacdValue {
    /// `EMA(fast) − EMA(slow)`.
    #[inline]
    #[must_use]
    pub fn macd(&self) -> Price {
        self.macd
    }

    /// Signal line, once enough MACD values exist.
    #[inline]
    #[must_use]
    pub fn signal(&self) -> Option<Price> {
        self.signal
    }

    /// `macd − signal`.
    #[inline]
    #[must_use]
    pub fn histogram(&self) -> Option<Price> {
        self.signal.map(|signal| self.macd - signal)
    }
}

impl Display for MacdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.signal {
            Some(signal) => write!(f, "MACD(m: {}, s: {})", self.macd, signal),
            None => write!(f, "MACD(m: {})", self.macd),
        }
    }
}

/// Moving Average Convergence/Divergence (MACD).
///
/// Runs a fast and a slow [`EmaState`] on closes and a third EMA on the MACD
/// line. All three keep only their previous value once seeded, so a tick is
/// O(1). The MACD line exists once both EMAs exist at the same bar.
#[derive(Clone, Debug)]
pub struct Macd {
    periods: (usize, usize, usize),
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
    current: Option<MacdValue>,
}

impl Macd {
    #[must_use]
    pub fn new(fast: NonZero<usize>, slow: NonZero<usize>, signal: NonZero<usize>) -> Self {
        Self {
            periods: (fast.get(), slow.get(), signal.get()),
            fast: EmaState::new(fast.get()),
            slow: EmaState::new(slow.get()),
            signal: EmaState::new(signal.get()),
            current: None,
        }
    }
}

impl Indicator for Macd {
    type Output = MacdValue;

    fn compute(&mut self, bar: &impl Ohlcv) -> Option<MacdValue> {
        let time = bar.time();
        let fast = self.fast.update(time, bar.close());
        let slow = self.slow.update(time, bar.close());

        self.current = fast.zip(slow).map(|(fast, slow)| {
            let macd = fast - slow;
            MacdValue {
                macd,
                signal: self.signal.update(time, macd),
            }
        });
        self.current
    }

    #[inline]
    fn value(&self) -> Option<MacdValue> {
        self.current
    }
}

impl Display for Macd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (fast, slow, signal) = self.periods;
        write!(f, "MACD({fast}, {slow}, {signal})")
    }
}
