//! Renderer-facing views of registry output.

use serde::Serialize;

use crate::{IndicatorId, IndicatorKind, Placement, Timestamp, registry::Instance};

/// One entry of [`Registry::list_indicators`](crate::Registry::list_indicators).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub id: IndicatorId,
    pub kind: IndicatorKind,
    pub placement: Placement,
    /// Display name with parameters, e.g. `MACD(12, 26, 9)`.
    pub label: String,
}

impl IndicatorSummary {
    pub(crate) fn of(instance: &Instance) -> Self {
        Self {
            id: instance.id,
            kind: instance.definition.kind(),
            placement: instance.definition.placement(),
            label: instance.definition.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStyle {
    Line,
    Histogram,
}

/// Sign of a histogram bar, for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    NonNegative,
    Negative,
}

impl Polarity {
    /// NaN counts as negative.
    #[must_use]
    pub fn of(value: f64) -> Self {
        if value >= 0.0 {
            Self::NonNegative
        } else {
            Self::Negative
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub time: Timestamp,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polarity: Option<Polarity>,
}

/// One output channel ready for a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelView {
    pub name: &'static str,
    pub style: ChannelStyle,
    pub points: Vec<ProjectedPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorView {
    #[serde(flatten)]
    pub summary: IndicatorSummary,
    pub channels: Vec<ChannelView>,
}

impl IndicatorView {
    fn of(instance: &Instance) -> Self {
        let kind = instance.definition.kind();
        let channels = instance
            .outputs
            .iter()
            .map(|(name, points)| {
                let histogram = kind == IndicatorKind::Macd && name == "histogram";
                ChannelView {
                    name,
                    style: if histogram {
                        ChannelStyle::Histogram
                    } else {
                        ChannelStyle::Line
                    },
                    points: points
                        .iter()
                        .map(|p| ProjectedPoint {
                            time: p.time,
                            value: p.value,
                            polarity: histogram.then(|| Polarity::of(p.value)),
                        })
                        .collect(),
                }
            })
            .collect();

        Self {
            summary: IndicatorSummary::of(instance),
            channels,
        }
    }
}

/// Owned copy of every instance's summary and channels.
///
/// Built in one pass from the registry and never mutated afterwards, so a
/// reader holding one never sees a half-applied update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub indicators: Vec<IndicatorView>,
}

impl Snapshot {
    pub(crate) fn capture<'a>(instances: impl Iterator<Item = &'a Instance>) -> Self {
        Self {
            indicators: instances.map(IndicatorView::of).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, id: IndicatorId) -> Option<&IndicatorView> {
        self.indicators.iter().find(|view| view.summary.id == id)
    }
}
