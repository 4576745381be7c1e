//! Batch fixed-window reducers.
//!
//! Every reducer maps `N` values and a window `period` to
//! `max(0, N - period + 1)` outputs, one per window ending at index
//! `period - 1` and later. A window larger than the input, or a zero
//! period, yields an empty vec.

#[inline]
fn windows(values: &[f64], period: usize) -> std::slice::Windows<'_, f64> {
    // A zero period yields no windows.
    values.windows(if period == 0 { values.len() + 1 } else { period })
}

/// Arithmetic mean of each window.
#[must_use]
pub fn mean(values: &[f64], period: usize) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let n = period as f64;
    windows(values, period)
        .map(|w| w.iter().sum::<f64>() / n)
        .collect()
}

/// Linearly weighted mean of each window.
///
/// The newest value weighs `period`, the oldest `1`. Normalised by the sum of
/// weights, `period * (period + 1) / 2`.
#[must_use]
pub fn weighted_mean(values: &[f64], period: usize) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let weight_sum = (period * (period + 1) / 2) as f64;
    windows(values, period)
        .map(|w| {
            w.iter()
                .zip(1_u32..)
                .map(|(&v, weight)| v * f64::from(weight))
                .sum::<f64>()
                / weight_sum
        })
        .collect()
}

/// Minimum of each window.
#[must_use]
pub fn min(values: &[f64], period: usize) -> Vec<f64> {
    windows(values, period)
        .map(|w| w.iter().copied().fold(f64::INFINITY, f64::min))
        .collect()
}

/// Maximum of each window.
#[must_use]
pub fn max(values: &[f64], period: usize) -> Vec<f64> {
    windows(values, period)
        .map(|w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .collect()
}

/// Population variance of each window (divides by `period`).
#[must_use]
pub fn variance(values: &[f64], period: usize) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let n = period as f64;
    windows(values, period)
        .map(|w| {
            let mean = w.iter().sum::<f64>() / n;
            w.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
        })
        .collect()
}
