// src/test_util.rs

use std::num::NonZero;

use crate::{Bar, Point, Timestamp};

/// Asserts that two `f64` values are approximately equal using a
/// relative epsilon of `4 * f64::EPSILON`.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() <= e.abs() * 4.0 * f64::EPSILON,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

pub(crate) use assert_approx;

/// Bar with just a close price and timestamp (OHLC all equal to close).
pub fn bar(close: f64, time: Timestamp) -> Bar {
    Bar::new(time, close, close, close, close)
}

pub fn ohlc(open: f64, high: f64, low: f64, close: f64, time: Timestamp) -> Bar {
    Bar::new(time, open, high, low, close)
}

/// Close-only bars at times `0, 1, 2, ...`.
pub fn bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .zip(0..)
        .map(|(&close, time)| bar(close, time))
        .collect()
}

pub fn nz(n: usize) -> NonZero<usize> {
    NonZero::new(n).unwrap()
}

pub fn values(points: &[Point]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}

pub fn times(points: &[Point]) -> Vec<Timestamp> {
    points.iter().map(|p| p.time).collect()
}
