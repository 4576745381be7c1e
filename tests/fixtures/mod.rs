#![allow(dead_code)]

use chartstream_ta::{Bar, Outputs, Point, Timestamp};
use serde::{Deserialize, de::DeserializeOwned};

/// Reference value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefValue {
    pub time: Timestamp,
    pub expected: f64,
}

/// Reference BB value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefBbValue {
    pub time: Timestamp,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Reference MACD value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefMacdValue {
    pub time: Timestamp,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

const OHLCV_PATH: &str = "tests/fixtures/data/ohlcv-1h.csv";

/// Hourly bars with a flat stretch (bars 40..56) and a steady climb
/// (bars 80..100).
pub fn load_bars() -> Vec<Bar> {
    load_records(OHLCV_PATH, "invalid OHLCV record")
}

/// Load single-value reference data.
pub fn load_ref_values(path: &str) -> Vec<RefValue> {
    load_records(path, "invalid reference record")
}

/// Load BB reference data (upper, middle, lower).
pub fn load_bb_ref(path: &str) -> Vec<RefBbValue> {
    load_records(path, "invalid BB reference record")
}

/// Load MACD reference data (macd, signal, histogram).
pub fn load_macd_ref(path: &str) -> Vec<RefMacdValue> {
    load_records(path, "invalid MACD reference record")
}

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:.10}, got {actual:.10}, diff {diff:.2e} > tolerance {tolerance:.2e}"
    );
}

/// Relative comparison with an absolute floor for values near zero.
pub fn assert_close(actual: f64, expected: f64, context: &str) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert_near(actual, expected, tolerance, context);
}

/// Asserts a computed series matches reference values point by point.
pub fn assert_series_near(actual: &[Point], reference: &[RefValue], tolerance: f64, name: &str) {
    assert_eq!(
        actual.len(),
        reference.len(),
        "{name}: {} points, reference has {}",
        actual.len(),
        reference.len()
    );
    for (i, (a, r)) in actual.iter().zip(reference).enumerate() {
        assert_eq!(a.time, r.time, "{name}: time mismatch at point {i}");
        assert_near(a.value, r.expected, tolerance, &format!("{name} at point {i} (t={})", a.time));
    }
}

/// Asserts two instances' outputs agree channel by channel.
pub fn assert_outputs_close(actual: &Outputs, expected: &Outputs, name: &str) {
    for ((a_name, a), (e_name, e)) in actual.iter().zip(expected.iter()) {
        assert_eq!(a_name, e_name);
        assert_eq!(a.len(), e.len(), "{name}.{a_name}: length differs");
        for (i, (a, e)) in a.iter().zip(e).enumerate() {
            assert_eq!(a.time, e.time, "{name}.{a_name}: time mismatch at point {i}");
            assert_close(a.value, e.value, &format!("{name}.{a_name} at point {i}"));
        }
    }
}

/// Creates perturbed versions of a bar to simulate live repaints.
///
/// Returns 2 intermediate bars (with shifted close/high/low) followed
/// by the final bar. All share the same `time`.
pub fn repaint_sequence(bar: &Bar) -> Vec<Bar> {
    let t = bar.time;
    vec![
        // First tick: only open is known, close near open
        Bar::new(
            t,
            bar.open,
            bar.open * 1.001,
            bar.open * 0.999,
            bar.open * 1.0005,
        ),
        // Mid-bar: partial movement toward final values
        Bar::new(
            t,
            bar.open,
            bar.open.midpoint(bar.high),
            bar.open.midpoint(bar.low),
            bar.open.midpoint(bar.close),
        ),
        // Final: real OHLCV values
        *bar,
    ]
}

pub fn assert_values_match(
    bar_idx: usize,
    closed: Option<f64>,
    repainted: Option<f64>,
    tolerance: f64,
) {
    match (closed, repainted) {
        (None, None) => {} // both pre-convergence, fine
        (Some(c), Some(r)) => {
            let diff = (c - r).abs();
            assert!(
                diff <= tolerance,
                "diverged at bar {bar_idx}: closed={c:.10}, repainted={r:.10}, diff={diff:.2e}"
            );
        }
        (c, r) => {
            panic!("convergence mismatch at bar {bar_idx}: closed={c:?}, repainted={r:?}");
        }
    }
}

/// Generate reference match + repaint tests for a single-value indicator.
///
/// Usage: `reference_test!(sma_20, Sma::new(nz(20)), |bars| sma(&bars, 20), "tests/fixtures/data/sma-20-close.csv", 1e-6);`
#[allow(unused_macros)]
macro_rules! reference_test {
    ($name:ident, $ind:expr, |$bars:ident| $batch:expr, $ref_path:expr, $tolerance:expr) => {
        mod $name {
            use super::fixtures::*;
            use chartstream_ta::*;
            use std::num::NonZero;

            fn nz(n: usize) -> NonZero<usize> {
                NonZero::new(n).unwrap()
            }

            #[test]
            fn streaming_matches_reference() {
                let bars = load_bars();
                let reference = load_ref_values($ref_path);
                let mut ind = $ind;

                let streamed: Vec<Point> = bars
                    .iter()
                    .filter_map(|bar| ind.compute(bar).map(|v| Point::new(bar.time, v)))
                    .collect();

                assert_series_near(&streamed, &reference, $tolerance, stringify!($name));
            }

            #[test]
            fn batch_matches_reference() {
                let $bars = load_bars();
                let reference = load_ref_values($ref_path);
                assert_series_near(&$batch, &reference, $tolerance, stringify!($name));
            }

            #[test]
            fn repaint_matches_closed() {
                let bars = load_bars();
                let mut closed = $ind;
                let mut repainted = $ind;

                for (i, bar) in bars.iter().enumerate() {
                    closed.compute(bar);
                    for tick in repaint_sequence(bar) {
                        repainted.compute(&tick);
                    }
                    assert_values_match(i, closed.value(), repainted.value(), $tolerance);
                }
            }
        }
    };
}

#[allow(unused_imports)]
pub(crate) use reference_test;

fn load_records<D>(path: &str, expect_msg: &str) -> Vec<D>
where
    D: DeserializeOwned,
{
    let mut rdr =
        csv::Reader::from_path(path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));

    rdr.deserialize().map(|r| r.expect(expect_msg)).collect()
}
