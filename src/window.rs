use std::collections::VecDeque;

use crate::indicator::Step;

/// Fixed-capacity rolling window over scalar values.
///
/// Streaming counterpart of the [`reducer`](crate::reducer) functions. Values
/// enter with [`push`](Self::push) (advance) or
/// [`replace_last`](Self::replace_last) (repaint of the newest value).
/// Aggregates are `None` until the window is full.
#[derive(Clone, Debug)]
pub(crate) struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
    /// Running sum of values in the window. Maintained incrementally via
    /// add/subtract, may accumulate FP rounding drift over very long runs,
    /// but negligible for typical window sizes on financial data.
    sum: f64,
    /// Sum of `value * weight` with weights `1..=len`, oldest first.
    weighted_sum: f64,
    /// Number of values that are exactly `0.0`. When every value is zero the
    /// reported sum is exactly zero, whatever rounding residue `sum` carries.
    zeros: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "window capacity must be positive");

        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
            sum: 0.0,
            weighted_sum: 0.0,
            zeros: 0,
        }
    }

    /// Appends a value, evicting and returning the oldest one once full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.is_ready() {
            let old = self.values.pop_front()?;

            #[allow(clippy::cast_precision_loss)]
            let newest_weight = self.capacity as f64;
            // Every remaining value moves one weight down; the new one takes the top weight.
            self.weighted_sum = newest_weight.mul_add(value, self.weighted_sum - self.sum);
            self.sum -= old;
            if old == 0.0 {
                self.zeros -= 1;
            }
            Some(old)
        } else {
            #[allow(clippy::cast_precision_loss)]
            let weight = (self.values.len() + 1) as f64;
            self.weighted_sum = weight.mul_add(value, self.weighted_sum);
            None
        };

        self.values.push_back(value);
        self.sum += value;
        if value == 0.0 {
            self.zeros += 1;
        }

        evicted
    }

    /// Replaces the newest value, returning the old one. Pushes when empty.
    pub fn replace_last(&mut self, value: f64) -> Option<f64> {
        let Some(last) = self.values.back_mut() else {
            self.push(value);
            return None;
        };

        let old = std::mem::replace(last, value);

        #[allow(clippy::cast_precision_loss)]
        let weight = self.values.len() as f64;
        self.weighted_sum = weight.mul_add(value - old, self.weighted_sum);
        self.sum += value - old;
        if old == 0.0 {
            self.zeros -= 1;
        }
        if value == 0.0 {
            self.zeros += 1;
        }

        Some(old)
    }

    /// Pushes on [`Step::Advance`], replaces the newest value on [`Step::Repaint`].
    #[inline]
    pub fn apply(&mut self, step: Step, value: f64) {
        match step {
            Step::Advance => self.push(value),
            Step::Repaint => self.replace_last(value),
        };
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.values.len() == self.capacity
    }

    #[inline]
    pub fn sum(&self) -> Option<f64> {
        self.is_ready()
            .then(|| if self.zeros == self.capacity { 0.0 } else { self.sum })
    }

    #[inline]
    pub fn mean(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)]
        self.sum().map(|sum| sum / self.capacity as f64)
    }

    /// Linearly weighted mean, newest value weighted `capacity`.
    #[inline]
    pub fn weighted_mean(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)]
        let weight_sum = (self.capacity * (self.capacity + 1) / 2) as f64;
        self.is_ready().then(|| self.weighted_sum / weight_sum)
    }

    /// Population variance, two passes over the window: O(capacity).
    ///
    /// Running sums of squares cancel catastrophically once prices dwarf
    /// their spread (σ of cents at 65 000), so both the mean and the squared
    /// deviations are summed afresh, in the same order as
    /// [`reducer::variance`](crate::reducer::variance).
    pub fn variance(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.capacity as f64;
        let mean = self.values.iter().sum::<f64>() / n;
        Some(
            self.values
                .iter()
                .map(|v| (v - mean) * (v - mean))
                .sum::<f64>()
                / n,
        )
    }

    /// O(capacity) scan.
    pub fn min(&self) -> Option<f64> {
        self.is_ready()
            .then(|| self.values.iter().copied().fold(f64::INFINITY, f64::min))
    }

    /// O(capacity) scan.
    pub fn max(&self) -> Option<f64> {
        self.is_ready().then(|| {
            self.values
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
        })
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::RollingWindow;
    use crate::{reducer, test_util::assert_approx};

    fn filled(capacity: usize, values: &[f64]) -> RollingWindow {
        let mut w = RollingWindow::new(capacity);
        for &v in values {
            w.push(v);
        }
        w
    }

    mod filling {
        use super::*;

        #[test]
        fn push_returns_none_until_full() {
            let mut w = RollingWindow::new(3);
            assert_eq!(w.push(1.0), None);
            assert_eq!(w.push(2.0), None);
            assert_eq!(w.push(3.0), None);
            assert!(w.is_ready());
        }

        #[test]
        fn aggregates_are_none_until_full() {
            let w = filled(3, &[1.0, 2.0]);
            assert_eq!(w.sum(), None);
            assert_eq!(w.weighted_mean(), None);
            assert_eq!(w.variance(), None);
            assert_eq!(w.min(), None);
        }
    }

    mod sliding {
        use super::*;

        #[test]
        fn full_evicts_oldest() {
            let mut w = filled(3, &[1.0, 2.0, 3.0]);
            assert_eq!(w.push(4.0), Some(1.0));
            assert_eq!(w.push(5.0), Some(2.0));
            assert_eq!(w.sum(), Some(12.0));
        }

        #[test]
        fn weighted_mean_tracks_batch_reducer() {
            let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
            let expected = reducer::weighted_mean(&values, 3);

            let mut w = RollingWindow::new(3);
            let mut actual = Vec::new();
            for &v in &values {
                w.push(v);
                actual.extend(w.weighted_mean());
            }

            assert_eq!(actual.len(), expected.len());
            for (a, e) in actual.into_iter().zip(expected) {
                assert_approx!(a, e);
            }
        }

        #[test]
        fn min_and_max_follow_window() {
            let mut w = filled(2, &[5.0, 1.0]);
            assert_eq!(w.min(), Some(1.0));
            w.push(7.0);
            assert_eq!(w.min(), Some(1.0));
            assert_eq!(w.max(), Some(7.0));
            w.push(6.0);
            assert_eq!(w.min(), Some(6.0));
        }

        #[test]
        fn variance_matches_batch_at_high_prices() {
            let values: Vec<f64> = (0..200)
                .map(|i| 65_000.0 + 0.01 * (f64::from(i) * 0.37).sin())
                .collect();
            let expected = reducer::variance(&values, 20);

            let mut w = RollingWindow::new(20);
            let mut actual = Vec::new();
            for (i, &v) in values.iter().enumerate() {
                // Repaint through a stale value first, as a live feed would.
                w.push(v + 5.0);
                w.replace_last(v);
                actual.extend(w.variance());
                assert!(i < 19 || actual.last().is_some_and(|&var| var > 0.0));
            }

            assert_eq!(actual, expected);
        }

        #[test]
        fn variance_is_population() {
            let w = filled(8, &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
            assert_approx!(w.variance().unwrap(), 4.0);
        }
    }

    mod repaint {
        use super::*;

        #[test]
        fn replace_swaps_latest() {
            let mut w = filled(3, &[1.0, 2.0]);
            assert_eq!(w.replace_last(9.0), Some(2.0));
            w.push(3.0);
            // [1, 9, 3]
            assert_eq!(w.sum(), Some(13.0));
            assert_eq!(w.push(4.0), Some(1.0));
            assert_eq!(w.push(5.0), Some(9.0));
        }

        #[test]
        fn replace_when_full_updates_weighted_mean() {
            let mut w = filled(2, &[1.0, 2.0]);
            w.replace_last(5.0);
            // (1*1 + 5*2) / 3
            assert_approx!(w.weighted_mean().unwrap(), 11.0 / 3.0);
        }

        #[test]
        fn replace_on_empty_pushes() {
            let mut w = RollingWindow::new(1);
            assert_eq!(w.replace_last(4.0), None);
            assert_eq!(w.sum(), Some(4.0));
        }
    }

    mod zeros {
        use super::*;

        #[test]
        fn all_zero_window_sums_to_exact_zero() {
            let mut w = filled(2, &[0.1, 0.2]);
            w.push(0.0);
            w.push(0.0);
            assert_eq!(w.sum(), Some(0.0));
        }

        #[test]
        fn repainting_away_from_zero_restores_sum() {
            let mut w = filled(2, &[0.0, 0.0]);
            w.replace_last(0.5);
            assert_eq!(w.sum(), Some(0.5));
            w.replace_last(0.0);
            assert_eq!(w.sum(), Some(0.0));
        }
    }

    #[test]
    fn capacity_one() {
        let mut w = RollingWindow::new(1);
        assert_eq!(w.push(1.0), None);
        assert!(w.is_ready());
        assert_eq!(w.push(2.0), Some(1.0));
        assert_eq!(w.replace_last(9.0), Some(2.0));
        assert_eq!(w.weighted_mean(), Some(9.0));
        assert_eq!(w.variance(), Some(0.0));
    }
}
