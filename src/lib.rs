//! Technical indicator engine for price charts.
//!
//! Turns an ordered OHLCV series into derived indicator series, either from
//! scratch (historical load) or one bar at a time (live ticks, where the last
//! bar may be repainted until it closes).
//!
//! Three layers, usable on their own:
//!
//! * batch functions ([`sma()`], [`rsi()`], [`macd()`], ...) over `&[Bar]`;
//! * streaming indicators ([`Sma`], [`Rsi`], [`Macd`], ...) fed bar by bar
//!   with any type implementing [`Ohlcv`];
//! * the [`Registry`], which owns a [`BarSeries`] and a set of indicator
//!   instances and keeps their outputs current.
//!
//! Each streaming indicator exposes [`compute`](Sma::compute) and
//! [`value`](Sma::value) as inherent methods, so no trait import is needed.
//! Import [`Indicator`] only for generic code.

mod atr;
mod bb;
mod custom;
mod ema;
mod error;
mod indicator;
mod macd;
mod ohlcv;
mod params;
mod projection;
pub mod reducer;
mod registry;
mod rsi;
mod series;
mod sma;
mod stoch;
mod window;
mod wma;

pub use crate::error::{Error, Result};
pub use crate::indicator::Indicator;
pub use crate::ohlcv::{Bar, Ohlcv, Point, Price, Timestamp};
pub use crate::series::{BarSeries, SeriesUpdate};

pub use crate::atr::{Atr, atr};
pub use crate::bb::{Bb, BbSeries, BbValue, bollinger_bands};
pub use crate::custom::{CustomFn, CustomIndicator};
pub use crate::ema::{Ema, ema, ema_points};
pub use crate::macd::{Macd, MacdSeries, MacdValue, macd};
pub use crate::rsi::{Rsi, rsi};
pub use crate::sma::{Sma, sma};
pub use crate::stoch::{Stochastic, ZERO_RANGE_K, stochastic};
pub use crate::wma::{Wma, wma};

pub use crate::params::{IndicatorKind, IndicatorParams, Placement};
pub use crate::projection::{
    ChannelStyle, ChannelView, IndicatorSummary, IndicatorView, Polarity, ProjectedPoint,
    Snapshot,
};
pub use crate::registry::{IndicatorId, Outputs, Readiness, Registry, RegistryEvent};

macro_rules! impl_indicator_methods {
    ($type:ty, $output:ty) => {
        impl $type {
            /// See [`Indicator::compute`].
            #[inline]
            pub fn compute(&mut self, bar: &impl Ohlcv) -> Option<$output> {
                <Self as Indicator>::compute(self, bar)
            }

            /// See [`Indicator::value`].
            #[must_use]
            #[inline]
            pub fn value(&self) -> Option<$output> {
                <Self as Indicator>::value(self)
            }
        }
    };
}

impl_indicator_methods!(Sma, Price);
impl_indicator_methods!(Ema, Price);
impl_indicator_methods!(Wma, Price);
impl_indicator_methods!(Rsi, Price);
impl_indicator_methods!(Macd, MacdValue);
impl_indicator_methods!(Stochastic, Price);
impl_indicator_methods!(Bb, BbValue);
impl_indicator_methods!(Atr, Price);

#[cfg(test)]
mod test_util;
