use crate::{Bar, Ohlcv, Point, Timestamp};

use std::fmt::{Debug, Display};

/// A streaming technical indicator.
///
/// Indicators maintain internal state and update incrementally on each call to
/// [`compute`](Indicator::compute). Output is `None` until enough data has been
/// received to fill the indicator's window.
///
/// A bar with the same [`time`](Ohlcv::time) as the previous one repaints the
/// current bar; a newer time advances the state. Feeding a full series bar by
/// bar produces the same values as the batch function of the same indicator.
///
/// # Example
///
/// ```
/// use chartstream_ta::{Bar, Indicator, Sma};
/// use std::num::NonZero;
///
/// let mut sma = Sma::new(NonZero::new(3).unwrap());
/// let bar = |close, time| Bar::new(time, close, close, close, close);
///
/// assert_eq!(sma.compute(&bar(10.0, 1)), None);
/// assert_eq!(sma.compute(&bar(20.0, 2)), None);
/// assert_eq!(sma.compute(&bar(30.0, 3)), Some(20.0));
/// ```
pub trait Indicator: Clone + Display + Debug {
    /// Computed output type. `f64` for simple indicators,
    /// a struct for composite ones (e.g. Bollinger Bands).
    type Output: Copy + Send + Sync + Debug;

    /// Feeds a bar and returns the updated indicator value,
    /// or `None` if the window is not yet full.
    ///
    /// # Panics
    ///
    /// In debug builds, if `bar` is older than the previous bar. Release
    /// builds treat it as a repaint of the current bar. Use the
    /// [`Registry`](crate::Registry) for feeds that may go back in time: it
    /// recomputes from the sorted series instead.
    fn compute(&mut self, bar: &impl Ohlcv) -> Option<Self::Output>;

    /// Returns the last computed indicator value without advancing state.
    ///
    /// This is a cached field read, O(1) with no computation.
    fn value(&self) -> Option<Self::Output>;
}

/// Whether an incoming bar starts a new bar or repaints the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Advance,
    Repaint,
}

/// Bar boundary detection shared by all streaming indicators.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BarClock {
    last_time: Option<Timestamp>,
}

impl BarClock {
    #[inline]
    pub fn tick(&mut self, time: Timestamp) -> Step {
        debug_assert!(
            self.last_time.is_none_or(|t| t <= time),
            "time must be non-decreasing: last={}, got={}",
            self.last_time.unwrap_or(0),
            time,
        );

        if self.last_time.is_none_or(|t| t < time) {
            self.last_time = Some(time);
            Step::Advance
        } else {
            Step::Repaint
        }
    }
}

/// Pairs batch outputs with the bars they belong to.
///
/// Every windowed indicator emits through the last bar, so `values` aligns
/// with the tail of `bars`.
pub(crate) fn align_tail(bars: &[Bar], values: Vec<f64>) -> Vec<Point> {
    let offset = bars.len().saturating_sub(values.len());
    bars[offset..]
        .iter()
        .zip(values)
        .map(|(bar, value)| Point::new(bar.time, value))
        .collect()
}

pub(crate) fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
