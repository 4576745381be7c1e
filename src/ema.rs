use std::{fmt::Display, num::NonZero};

use crate::{
    Bar, Indicator, Ohlcv, Point, Price, Timestamp,
    indicator::{BarClock, Step, align_tail, closes},
    window::RollingWindow,
};

#[inline]
fn smoothing(period: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let period = period as f64;
    2.0 / (period + 1.0)
}

/// EMA over a plain scalar sequence.
///
/// Seeded with the SMA of the first `period` values (emitted at index
/// `period - 1`), then `ema = (x - prev) * 2 / (period + 1) + prev`.
pub(crate) fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let alpha = smoothing(period);
    let (seed, rest) = values.split_at(period);

    #[allow(clippy::cast_precision_loss)]
    let mut ema = seed.iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(rest.len() + 1);
    out.push(ema);

    for &value in rest {
        ema = (value - ema) * alpha + ema;
        out.push(ema);
    }

    out
}

/// Exponential moving average of closing prices.
///
/// The first point is the SMA of the first `period` closes, so `ema` and
/// [`sma`](crate::sma()) agree exactly at the first emitted time.
#[must_use]
pub fn ema(bars: &[Bar], period: usize) -> Vec<Point> {
    align_tail(bars, ema_values(&closes(bars), period))
}

/// Exponential moving average over another series' points.
///
/// Used for the MACD signal line; outputs keep the input points' times.
#[must_use]
pub fn ema_points(points: &[Point], period: usize) -> Vec<Point> {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let ema = ema_values(&values, period);
    let offset = points.len() - ema.len();

    points[offset..]
        .iter()
        .zip(ema)
        .map(|(p, value)| Point::new(p.time, value))
        .collect()
}

/// Running EMA over `(time, value)` pairs.
///
/// The first `period` values are collected in a window to compute the SMA
/// seed. After seeding, the window is dropped and only the previous EMA is
/// kept: O(1) per update. A repaint recomputes from the previous bar's EMA.
#[derive(Clone, Debug)]
pub(crate) struct EmaState {
    alpha: f64,
    clock: BarClock,
    seed: Option<RollingWindow>,
    previous: Price,
    current: Option<Price>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        Self {
            alpha: smoothing(period),
            clock: BarClock::default(),
            seed: Some(RollingWindow::new(period)),
            previous: 0.0,
            current: None,
        }
    }

    pub fn update(&mut self, time: Timestamp, value: f64) -> Option<Price> {
        let step = self.clock.tick(time);

        if let Some(seed) = &mut self.seed {
            if step == Step::Advance && seed.is_ready() {
                self.seed = None;
            } else {
                seed.apply(step, value);
                self.current = seed.mean();
                return self.current;
            }
        }

        if step == Step::Advance {
            self.previous = self.current?;
        }

        self.current = Some((value - self.previous) * self.alpha + self.previous);
        self.current
    }

    #[inline]
    pub fn value(&self) -> Option<Price> {
        self.current
    }
}

/// Exponential Moving Average (EMA).
///
/// A weighted moving average that gives more weight to recent prices, with
/// smoothing factor `α = 2 / (period + 1)`:
///
/// ```text
/// EMA = (close − prev_EMA) × α + prev_EMA
/// ```
///
/// The first `period` bars are collected to compute an SMA seed value. After
/// seeding the EMA runs with O(1) memory per tick.
///
/// # Example
///
/// ```
/// use chartstream_ta::{Bar, Ema, Indicator};
/// use std::num::NonZero;
///
/// let bar = |close, time| Bar::new(time, close, close, close, close);
/// let mut ema = Ema::new(NonZero::new(3).unwrap());
///
/// assert_eq!(ema.compute(&bar(2.0, 1)), None);
/// assert_eq!(ema.compute(&bar(4.0, 2)), None);
///
/// // SMA seed = (2 + 4 + 6) / 3 = 4.0
/// assert_eq!(ema.compute(&bar(6.0, 3)), Some(4.0));
///
/// // α = 0.5: (8 − 4) × 0.5 + 4 = 6.0
/// assert_eq!(ema.compute(&bar(8.0, 4)), Some(6.0));
/// ```
#[derive(Clone, Debug)]
pub struct Ema {
    period: usize,
    state: EmaState,
}

impl Ema {
    #[must_use]
    pub fn new(period: NonZero<usize>) -> Self {
        Self {
            period: period.get(),
            state: EmaState::new(period.get()),
        }
    }
}

impl Indicator for Ema {
    type Output = Price;

    #[inline]
    fn compute(&mut self, bar: &impl Ohlcv) -> Option<Price> {
        self.state.update(bar.time(), bar.close())
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.state.value()
    }
}

impl Display for Ema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({})", self.period)
    }
}
