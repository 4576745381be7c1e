use std::{fmt::Display, num::NonZero, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where a renderer should draw an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// On the price pane, sharing its scale.
    Overlay,
    /// In a separate pane with its own scale.
    Panel,
}

/// Built-in indicator kinds plus user-defined ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Sma,
    Ema,
    Wma,
    Rsi,
    Macd,
    Stochastic,
    #[serde(rename = "bb")]
    BollingerBands,
    Atr,
    Custom,
}

impl IndicatorKind {
    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sma => "sma",
            Self::Ema => "ema",
            Self::Wma => "wma",
            Self::Rsi => "rsi",
            Self::Macd => "macd",
            Self::Stochastic => "stochastic",
            Self::BollingerBands => "bb",
            Self::Atr => "atr",
            Self::Custom => "custom",
        }
    }

    /// Moving averages and bands share the price scale; oscillators do not.
    /// Custom indicators default to the price pane.
    #[must_use]
    pub fn placement(self) -> Placement {
        match self {
            Self::Sma | Self::Ema | Self::Wma | Self::BollingerBands | Self::Custom => {
                Placement::Overlay
            }
            Self::Rsi | Self::Macd | Self::Stochastic | Self::Atr => Placement::Panel,
        }
    }

    /// Conventional parameters for a built-in kind. `None` for
    /// [`Custom`](Self::Custom), which has no parameters.
    #[must_use]
    pub fn default_params(self) -> Option<IndicatorParams> {
        let params = match self {
            Self::Sma => IndicatorParams::Sma { period: 20 },
            Self::Ema => IndicatorParams::Ema { period: 20 },
            Self::Wma => IndicatorParams::Wma { period: 20 },
            Self::Rsi => IndicatorParams::Rsi { period: 14 },
            Self::Macd => IndicatorParams::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            Self::Stochastic => IndicatorParams::Stochastic { period: 14 },
            Self::BollingerBands => IndicatorParams::BollingerBands {
                period: 20,
                std_dev: 2.0,
            },
            Self::Atr => IndicatorParams::Atr { period: 14 },
            Self::Custom => return None,
        };
        Some(params)
    }
}

impl Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sma" => Ok(Self::Sma),
            "ema" => Ok(Self::Ema),
            "wma" => Ok(Self::Wma),
            "rsi" => Ok(Self::Rsi),
            "macd" => Ok(Self::Macd),
            "stoch" | "stochastic" => Ok(Self::Stochastic),
            "bb" | "bollinger" | "bollinger_bands" => Ok(Self::BollingerBands),
            "atr" => Ok(Self::Atr),
            "custom" => Ok(Self::Custom),
            _ => Err(Error::UnsupportedIndicator(s.to_owned())),
        }
    }
}

/// Parameters of a built-in indicator.
///
/// Serialized with a `kind` tag, so a list of these is the session config:
///
/// ```
/// use chartstream_ta::IndicatorParams;
///
/// let params: IndicatorParams =
///     serde_json::from_str(r#"{"kind":"macd","fast":12,"slow":26,"signal":9}"#).unwrap();
/// assert_eq!(params.to_string(), "MACD(12, 26, 9)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IndicatorParams {
    Sma {
        period: usize,
    },
    Ema {
        period: usize,
    },
    Wma {
        period: usize,
    },
    Rsi {
        period: usize,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        period: usize,
    },
    #[serde(rename = "bb")]
    BollingerBands {
        period: usize,
        std_dev: f64,
    },
    Atr {
        period: usize,
    },
}

impl IndicatorParams {
    #[must_use]
    pub fn kind(&self) -> IndicatorKind {
        match self {
            Self::Sma { .. } => IndicatorKind::Sma,
            Self::Ema { .. } => IndicatorKind::Ema,
            Self::Wma { .. } => IndicatorKind::Wma,
            Self::Rsi { .. } => IndicatorKind::Rsi,
            Self::Macd { .. } => IndicatorKind::Macd,
            Self::Stochastic { .. } => IndicatorKind::Stochastic,
            Self::BollingerBands { .. } => IndicatorKind::BollingerBands,
            Self::Atr { .. } => IndicatorKind::Atr,
        }
    }

    #[must_use]
    pub fn placement(&self) -> Placement {
        self.kind().placement()
    }

    /// Bars needed before the first output point.
    ///
    /// RSI and ATR work on bar-to-bar changes and need one extra bar. MACD
    /// needs the slower EMA seeded; its signal line starts later still.
    #[must_use]
    pub fn required_bars(&self) -> usize {
        match *self {
            Self::Sma { period }
            | Self::Ema { period }
            | Self::Wma { period }
            | Self::Stochastic { period }
            | Self::BollingerBands { period, .. } => period,
            Self::Rsi { period } | Self::Atr { period } => period + 1,
            Self::Macd { fast, slow, .. } => fast.max(slow),
        }
    }

    /// Checks every parameter is within its domain.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] for a zero period or a standard deviation
    /// multiplier that is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Sma { period }
            | Self::Ema { period }
            | Self::Wma { period }
            | Self::Rsi { period }
            | Self::Stochastic { period }
            | Self::Atr { period } => non_zero("period", period).map(drop),
            Self::Macd { fast, slow, signal } => {
                non_zero("fast", fast)?;
                non_zero("slow", slow)?;
                non_zero("signal", signal).map(drop)
            }
            Self::BollingerBands { period, std_dev } => {
                non_zero("period", period)?;
                multiplier("std_dev", std_dev).map(drop)
            }
        }
    }
}

impl Display for IndicatorParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sma { period } => write!(f, "SMA({period})"),
            Self::Ema { period } => write!(f, "EMA({period})"),
            Self::Wma { period } => write!(f, "WMA({period})"),
            Self::Rsi { period } => write!(f, "RSI({period})"),
            Self::Macd { fast, slow, signal } => write!(f, "MACD({fast}, {slow}, {signal})"),
            Self::Stochastic { period } => write!(f, "STOCH({period})"),
            Self::BollingerBands { period, std_dev } => write!(f, "BB({period}, {std_dev})"),
            Self::Atr { period } => write!(f, "ATR({period})"),
        }
    }
}

pub(crate) fn non_zero(name: &'static str, value: usize) -> Result<NonZero<usize>> {
    NonZero::new(value).ok_or_else(|| Error::invalid_parameter(name, "must be at least 1"))
}

pub(crate) fn multiplier(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::invalid_parameter(
            name,
            format!("must be a positive finite number, got {value}"),
        ))
    }
}
