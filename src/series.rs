use std::ops::Deref;

use crate::{Bar, Timestamp};

/// Outcome of [`BarSeries::upsert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesUpdate {
    /// The bar is strictly newer than the last bar and was appended.
    Appended,
    /// The bar has the same time as the last bar and replaced it in place.
    Replaced,
    /// The bar is older than the last bar. It replaced the bar with the same
    /// time, or was inserted in time order. Running indicator state is stale.
    Revised,
}

/// Ordered OHLCV bars keyed by time.
///
/// Append-only except for the last element, which may be repainted by
/// streaming ticks. Out-of-order bars are accepted but reported as
/// [`SeriesUpdate::Revised`] so callers can rebuild derived state.
///
/// Derefs to `[Bar]`, so every batch indicator function accepts it directly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series from arbitrary bars: sorts them by time and keeps the
    /// last bar for every duplicated timestamp.
    #[must_use]
    pub fn from_bars(bars: impl IntoIterator<Item = Bar>) -> Self {
        let mut bars: Vec<Bar> = bars.into_iter().collect();
        bars.sort_by_key(|b| b.time);

        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.time == bar.time => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Self { bars: deduped }
    }

    /// Inserts or replaces a bar and reports how the series changed.
    pub fn upsert(&mut self, bar: Bar) -> SeriesUpdate {
        let Some(last) = self.bars.last_mut() else {
            self.bars.push(bar);
            return SeriesUpdate::Appended;
        };

        if bar.time > last.time {
            self.bars.push(bar);
            SeriesUpdate::Appended
        } else if bar.time == last.time {
            *last = bar;
            SeriesUpdate::Replaced
        } else {
            match self.bars.binary_search_by_key(&bar.time, |b| b.time) {
                Ok(idx) => self.bars[idx] = bar,
                Err(idx) => self.bars.insert(idx, bar),
            }
            SeriesUpdate::Revised
        }
    }

    #[must_use]
    pub fn last_time(&self) -> Option<Timestamp> {
        self.bars.last().map(|b| b.time)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }
}

impl Deref for BarSeries {
    type Target = [Bar];

    fn deref(&self) -> &Self::Target {
        &self.bars
    }
}

impl From<Vec<Bar>> for BarSeries {
    fn from(bars: Vec<Bar>) -> Self {
        Self::from_bars(bars)
    }
}
