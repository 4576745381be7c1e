//! Indicator instances over one bar series.

use std::{collections::BTreeMap, fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    Atr, Bar, BarSeries, Bb, CustomIndicator, Ema, Error, IndicatorKind,
    IndicatorParams, Macd, Placement, Point, Result, Rsi, SeriesUpdate, Sma, Stochastic,
    Timestamp, Wma,
    params::{multiplier, non_zero},
    projection::{IndicatorSummary, Snapshot},
};

/// Opaque handle to an indicator instance.
///
/// Minted from a counter that only increases, so a removed id is never
/// handed out again by the same registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorId(u64);

impl IndicatorId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for IndicatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an instance has enough bars to produce output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Fewer bars than the indicator's window. The instance exists and
    /// starts emitting once enough bars arrive.
    InsufficientData { required: usize, available: usize },
}

/// Lifecycle notifications for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    Added(IndicatorId),
    /// Display resources held for this id can be released.
    Removed(IndicatorId),
}

/// Named output channels of one instance, each ordered by time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
    channels: Vec<(&'static str, Vec<Point>)>,
}

impl Outputs {
    fn new(names: &[&'static str]) -> Self {
        Self {
            channels: names.iter().map(|&name| (name, Vec::new())).collect(),
        }
    }

    /// Points of the channel called `name`.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&[Point]> {
        self.channels
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, points)| points.as_slice())
    }

    /// The first channel: `value` for single-line indicators, `macd` for
    /// MACD, `upper` for Bollinger Bands.
    #[must_use]
    pub fn primary(&self) -> &[Point] {
        self.channels
            .first()
            .map(|(_, points)| points.as_slice())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[Point])> {
        self.channels
            .iter()
            .map(|(name, points)| (*name, points.as_slice()))
    }

    /// True when no channel has a point yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(|(_, points)| points.is_empty())
    }

    /// Writes the value of one channel at `time`: a point at the same time as
    /// the last one replaces it, a newer one is appended. `None` withdraws a
    /// point previously written at `time`.
    fn set(&mut self, channel: usize, time: Timestamp, value: Option<f64>) {
        let points = &mut self.channels[channel].1;
        let repaint = points.last().is_some_and(|p| p.time == time);

        match (value, repaint) {
            (Some(value), true) => {
                if let Some(last) = points.last_mut() {
                    last.value = value;
                }
            }
            (Some(value), false) => points.push(Point::new(time, value)),
            (None, true) => {
                points.pop();
            }
            (None, false) => {}
        }
    }
}

const VALUE: &[&str] = &["value"];
const MACD: &[&str] = &["macd", "signal", "histogram"];
const BANDS: &[&str] = &["upper", "middle", "lower"];

/// Running state of one instance.
#[derive(Clone, Debug)]
enum Engine {
    Sma(Sma),
    Ema(Ema),
    Wma(Wma),
    Rsi(Rsi),
    Macd(Macd),
    Stochastic(Stochastic),
    Bb(Bb),
    Atr(Atr),
    Custom(CustomIndicator),
}

impl Engine {
    fn from_params(params: &IndicatorParams) -> Result<Self> {
        let engine = match *params {
            IndicatorParams::Sma { period } => Self::Sma(Sma::new(non_zero("period", period)?)),
            IndicatorParams::Ema { period } => Self::Ema(Ema::new(non_zero("period", period)?)),
            IndicatorParams::Wma { period } => Self::Wma(Wma::new(non_zero("period", period)?)),
            IndicatorParams::Rsi { period } => Self::Rsi(Rsi::new(non_zero("period", period)?)),
            IndicatorParams::Macd { fast, slow, signal } => Self::Macd(Macd::new(
                non_zero("fast", fast)?,
                non_zero("slow", slow)?,
                non_zero("signal", signal)?,
            )),
            IndicatorParams::Stochastic { period } => {
                Self::Stochastic(Stochastic::new(non_zero("period", period)?))
            }
            IndicatorParams::BollingerBands { period, std_dev } => Self::Bb(Bb::new(
                non_zero("period", period)?,
                multiplier("std_dev", std_dev)?,
            )),
            IndicatorParams::Atr { period } => Self::Atr(Atr::new(non_zero("period", period)?)),
        };
        Ok(engine)
    }

    fn channels(&self) -> &'static [&'static str] {
        match self {
            Self::Macd(_) => MACD,
            Self::Bb(_) => BANDS,
            _ => VALUE,
        }
    }

    /// Feeds one bar to a built-in indicator and records its outputs.
    /// Custom indicators are recomputed by the instance instead.
    fn feed(&mut self, bar: &Bar, out: &mut Outputs) {
        let time = bar.time;
        match self {
            Self::Sma(sma) => out.set(0, time, sma.compute(bar)),
            Self::Ema(ema) => out.set(0, time, ema.compute(bar)),
            Self::Wma(wma) => out.set(0, time, wma.compute(bar)),
            Self::Rsi(rsi) => out.set(0, time, rsi.compute(bar)),
            Self::Stochastic(stoch) => out.set(0, time, stoch.compute(bar)),
            Self::Atr(atr) => out.set(0, time, atr.compute(bar)),
            Self::Macd(macd) => {
                let value = macd.compute(bar);
                out.set(0, time, value.map(|v| v.macd()));
                out.set(1, time, value.and_then(|v| v.signal()));
                out.set(2, time, value.and_then(|v| v.histogram()));
            }
            Self::Bb(bb) => {
                let value = bb.compute(bar);
                out.set(0, time, value.map(|v| v.upper()));
                out.set(1, time, value.map(|v| v.middle()));
                out.set(2, time, value.map(|v| v.lower()));
            }
            Self::Custom(_) => {}
        }
    }
}

/// What an instance was created from.
#[derive(Clone, Debug)]
pub(crate) enum Definition {
    Builtin(IndicatorParams),
    Custom(CustomIndicator),
}

impl Definition {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            Self::Builtin(params) => params.kind(),
            Self::Custom(_) => IndicatorKind::Custom,
        }
    }

    pub fn placement(&self) -> Placement {
        match self {
            Self::Builtin(params) => params.placement(),
            Self::Custom(custom) => custom.placement(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Builtin(params) => params.to_string(),
            Self::Custom(custom) => custom.to_string(),
        }
    }

    fn required_bars(&self) -> usize {
        match self {
            Self::Builtin(params) => params.required_bars(),
            Self::Custom(_) => 1,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Instance {
    pub id: IndicatorId,
    pub definition: Definition,
    /// Untouched state the engine is reset to on full recompute.
    fresh: Engine,
    engine: Engine,
    pub outputs: Outputs,
}

impl Instance {
    fn new(id: IndicatorId, definition: Definition, engine: Engine) -> Self {
        let outputs = Outputs::new(engine.channels());
        Self {
            id,
            definition,
            fresh: engine.clone(),
            engine,
            outputs,
        }
    }

    fn rebuild(&mut self, bars: &[Bar]) {
        self.engine = self.fresh.clone();
        self.outputs = Outputs::new(self.engine.channels());

        if let Engine::Custom(custom) = &self.engine {
            self.outputs.channels[0].1 = custom.compute(bars);
        } else {
            for bar in bars {
                self.engine.feed(bar, &mut self.outputs);
            }
        }
    }

    /// Applies the last bar of `bars`, which was just appended or replaced.
    fn update(&mut self, bars: &[Bar]) {
        if let Engine::Custom(custom) = &self.engine {
            self.outputs.channels[0].1 = custom.compute(bars);
        } else if let Some(bar) = bars.last() {
            self.engine.feed(bar, &mut self.outputs);
        }
    }
}

/// Owns the bar series and every indicator instance computed from it.
///
/// Mutation goes through `&mut self`, so updates are serialized by the
/// borrow checker. Readers on other threads take a [`Snapshot`].
///
/// # Example
///
/// ```
/// use chartstream_ta::{Bar, IndicatorParams, Registry};
///
/// let mut registry = Registry::new();
/// let sma = registry.add(IndicatorParams::Sma { period: 2 }).unwrap();
///
/// registry.load_history(vec![
///     Bar::new(0, 10.0, 12.0, 9.0, 11.0),
///     Bar::new(1, 11.0, 13.0, 10.0, 12.0),
/// ]);
/// registry.push_bar(Bar::new(2, 12.0, 12.0, 10.0, 10.0));
///
/// let values: Vec<f64> = registry
///     .get_output(sma)
///     .unwrap()
///     .primary()
///     .iter()
///     .map(|p| p.value)
///     .collect();
/// assert_eq!(values, vec![11.5, 11.0]);
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    series: BarSeries,
    instances: BTreeMap<IndicatorId, Instance>,
    next_id: u64,
    events: Vec<RegistryEvent>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    /// Number of registered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Adds a built-in indicator and computes it over the current series.
    ///
    /// A series shorter than the indicator's window is fine: the instance
    /// starts empty and reports [`Readiness::InsufficientData`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] for a zero period or a bad standard
    /// deviation multiplier. Nothing is added in that case.
    pub fn add(&mut self, params: IndicatorParams) -> Result<IndicatorId> {
        params.validate()?;
        let engine = Engine::from_params(&params)?;
        Ok(self.insert(Definition::Builtin(params), engine))
    }

    /// Adds a built-in indicator with its conventional parameters.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedIndicator`] for [`IndicatorKind::Custom`], which
    /// has no defaults.
    pub fn add_default(&mut self, kind: IndicatorKind) -> Result<IndicatorId> {
        let params = kind
            .default_params()
            .ok_or_else(|| Error::UnsupportedIndicator(kind.to_string()))?;
        self.add(params)
    }

    /// Adds a user-defined indicator. It is recomputed from the full series
    /// on every update.
    pub fn add_custom(
        &mut self,
        name: impl Into<String>,
        placement: Placement,
        compute: impl Fn(&[Bar]) -> Vec<Point> + Send + Sync + 'static,
    ) -> IndicatorId {
        let custom = CustomIndicator::new(name, placement, compute);
        self.insert(Definition::Custom(custom.clone()), Engine::Custom(custom))
    }

    fn insert(&mut self, definition: Definition, engine: Engine) -> IndicatorId {
        let id = IndicatorId(self.next_id);
        self.next_id += 1;

        let mut instance = Instance::new(id, definition, engine);
        instance.rebuild(&self.series);

        debug!(
            %id,
            kind = %instance.definition.kind(),
            label = %instance.definition.label(),
            bars = self.series.len(),
            "indicator added"
        );

        self.instances.insert(id, instance);
        self.events.push(RegistryEvent::Added(id));
        id
    }

    /// Removes an instance and queues [`RegistryEvent::Removed`].
    ///
    /// # Errors
    ///
    /// [`Error::UnknownId`] if no instance has this id.
    pub fn remove(&mut self, id: IndicatorId) -> Result<()> {
        let instance = self.instances.remove(&id).ok_or(Error::UnknownId(id))?;
        debug!(%id, kind = %instance.definition.kind(), "indicator removed");
        self.events.push(RegistryEvent::Removed(id));
        Ok(())
    }

    /// Replaces the bar series and rebuilds every instance from scratch.
    ///
    /// Bars may arrive in any order; they are sorted by time and the last
    /// bar wins for a duplicated timestamp.
    pub fn recompute_all(&mut self, bars: impl IntoIterator<Item = Bar>) {
        self.series = BarSeries::from_bars(bars);
        self.rebuild();
    }

    /// Historical load. Same as [`recompute_all`](Self::recompute_all).
    pub fn load_history(&mut self, bars: impl IntoIterator<Item = Bar>) {
        self.recompute_all(bars);
    }

    fn rebuild(&mut self) {
        for instance in self.instances.values_mut() {
            instance.rebuild(&self.series);
        }
        debug!(
            bars = self.series.len(),
            indicators = self.instances.len(),
            "indicators recomputed"
        );
    }

    /// Applies one streaming bar.
    ///
    /// A bar newer than the last one is appended and one with the same time
    /// replaces it; built-in instances then update in O(1) or O(window).
    /// An older bar revises history, so everything is recomputed.
    pub fn apply_incremental_bar(&mut self, bar: Bar) -> SeriesUpdate {
        let update = self.series.upsert(bar);

        match update {
            SeriesUpdate::Appended | SeriesUpdate::Replaced => {
                for instance in self.instances.values_mut() {
                    instance.update(&self.series);
                }
                trace!(time = bar.time, ?update, "bar applied");
            }
            SeriesUpdate::Revised => {
                warn!(
                    time = bar.time,
                    last = self.series.last_time(),
                    "out-of-order bar, recomputing all indicators"
                );
                self.rebuild();
            }
        }

        update
    }

    /// Streaming tick. Same as
    /// [`apply_incremental_bar`](Self::apply_incremental_bar).
    pub fn push_bar(&mut self, bar: Bar) -> SeriesUpdate {
        self.apply_incremental_bar(bar)
    }

    /// # Errors
    ///
    /// [`Error::UnknownId`] if no instance has this id.
    pub fn readiness(&self, id: IndicatorId) -> Result<Readiness> {
        let instance = self.instance(id)?;
        let required = instance.definition.required_bars();
        let available = self.series.len();

        Ok(if available >= required {
            Readiness::Ready
        } else {
            Readiness::InsufficientData {
                required,
                available,
            }
        })
    }

    /// Summaries of every instance, in the order they were added.
    #[must_use]
    pub fn list_indicators(&self) -> Vec<IndicatorSummary> {
        self.instances.values().map(IndicatorSummary::of).collect()
    }

    /// # Errors
    ///
    /// [`Error::UnknownId`] if no instance has this id.
    pub fn get_output(&self, id: IndicatorId) -> Result<&Outputs> {
        self.instance(id).map(|instance| &instance.outputs)
    }

    /// Takes every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Parameters of every built-in instance, in the order they were added.
    /// Custom instances have no serializable form and are left out.
    #[must_use]
    pub fn config(&self) -> Vec<IndicatorParams> {
        self.instances
            .values()
            .filter_map(|instance| match &instance.definition {
                Definition::Builtin(params) => Some(*params),
                Definition::Custom(_) => None,
            })
            .collect()
    }

    /// Replaces every instance with the given set, computed over the
    /// current series. Existing instances are removed, custom ones included.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if any entry is invalid. The registry is
    /// left untouched in that case.
    pub fn restore(&mut self, config: &[IndicatorParams]) -> Result<Vec<IndicatorId>> {
        let engines = config
            .iter()
            .map(|params| {
                params.validate()?;
                Engine::from_params(params).map(|engine| (*params, engine))
            })
            .collect::<Result<Vec<_>>>()?;

        let ids: Vec<IndicatorId> = self.instances.keys().copied().collect();
        for id in ids {
            self.remove(id)?;
        }

        Ok(engines
            .into_iter()
            .map(|(params, engine)| self.insert(Definition::Builtin(params), engine))
            .collect())
    }

    /// Session config as JSON, see [`config`](Self::config).
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.config())?)
    }

    /// Restores a session config produced by [`to_json`](Self::to_json).
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedIndicator`] for an unknown or custom kind,
    /// [`Error::Config`] for malformed JSON, otherwise as
    /// [`restore`](Self::restore).
    pub fn from_json(&mut self, json: &str) -> Result<Vec<IndicatorId>> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let config = entries
            .into_iter()
            .map(config_entry)
            .collect::<Result<Vec<_>>>()?;
        self.restore(&config)
    }

    /// Owned copy of every summary and output channel, cheap to share
    /// across threads.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::new(Snapshot::capture(self.instances.values()))
    }

    fn instance(&self, id: IndicatorId) -> Result<&Instance> {
        self.instances.get(&id).ok_or(Error::UnknownId(id))
    }
}

/// Resolves `kind` by name (aliases included) before reading the parameters.
fn config_entry(mut entry: serde_json::Value) -> Result<IndicatorParams> {
    if let Some(name) = entry.get("kind").and_then(serde_json::Value::as_str) {
        let kind: IndicatorKind = name.parse()?;
        if kind == IndicatorKind::Custom {
            return Err(Error::UnsupportedIndicator(name.to_owned()));
        }
        entry["kind"] = kind.as_str().into();
    }
    Ok(serde_json::from_value(entry)?)
}
