//! Strategy: an ordered, fixed list of features plus read-only runtime state.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::event::ChartEvent;
use crate::feature::{
    AtrFeature, Feature, LevelsFeature, OrdersFeature, PriceLinesFeature, TpSlFeature,
    TradesFeature, WindowZoneFeature, ZonesFeature,
};
use crate::overlay::{LayerRenderer, OverlayKind, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyType {
    Fibonacci,
    Scalping,
    SmartFusion,
}

impl StrategyType {
    pub const ALL: [StrategyType; 3] = [
        StrategyType::Fibonacci,
        StrategyType::Scalping,
        StrategyType::SmartFusion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Fibonacci => "FIBONACCI",
            StrategyType::Scalping => "SCALPING",
            StrategyType::SmartFusion => "SMART_FUSION",
        }
    }
}

impl FromStr for StrategyType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "FIBONACCI" => Ok(StrategyType::Fibonacci),
            "SCALPING" => Ok(StrategyType::Scalping),
            "SMART_FUSION" | "SMARTFUSION" => Ok(StrategyType::SmartFusion),
            _ => Err(AppError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a hold reason of the form `cooldown <N>s` (case-insensitive).
pub fn parse_cooldown_reason(reason: &str) -> Option<u64> {
    let lower = reason.trim().to_ascii_lowercase();
    let rest = lower.strip_prefix("cooldown")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let digits = rest.trim_start().strip_suffix('s')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub struct Strategy {
    strategy_type: StrategyType,
    features: Vec<Box<dyn Feature>>,
    cooldown_seconds: Option<u64>,
    cooldown_updated_at: Option<DateTime<Utc>>,
}

impl Strategy {
    pub fn new(strategy_type: StrategyType, features: Vec<Box<dyn Feature>>) -> Self {
        Self {
            strategy_type,
            features,
            cooldown_seconds: None,
            cooldown_updated_at: None,
        }
    }

    /// Assemble the feature set for `strategy_type` over one shared renderer.
    pub fn for_type(strategy_type: StrategyType, layers: &Rc<RefCell<LayerRenderer>>) -> Self {
        let levels = || Box::new(LevelsFeature::new(layers.clone())) as Box<dyn Feature>;
        let zones =
            || Box::new(ZonesFeature::new(layers.clone(), layers.clone())) as Box<dyn Feature>;
        let tp_sl = || Box::new(TpSlFeature::new(layers.clone())) as Box<dyn Feature>;
        let price_lines = || Box::new(PriceLinesFeature::new(layers.clone())) as Box<dyn Feature>;
        let window_zone = || Box::new(WindowZoneFeature::new(layers.clone())) as Box<dyn Feature>;
        let orders = || Box::new(OrdersFeature::new(layers.clone())) as Box<dyn Feature>;
        let trades = || Box::new(TradesFeature::new(layers.clone())) as Box<dyn Feature>;
        let atr = || Box::new(AtrFeature::new(layers.clone())) as Box<dyn Feature>;

        let features = match strategy_type {
            StrategyType::Fibonacci => vec![
                levels(),
                zones(),
                tp_sl(),
                price_lines(),
                orders(),
                trades(),
                atr(),
            ],
            StrategyType::Scalping => {
                vec![window_zone(), trades(), tp_sl(), price_lines(), atr()]
            }
            StrategyType::SmartFusion => vec![
                levels(),
                zones(),
                window_zone(),
                tp_sl(),
                price_lines(),
                orders(),
                trades(),
                atr(),
            ],
        };
        Self::new(strategy_type, features)
    }

    pub fn strategy_type(&self) -> StrategyType {
        self.strategy_type
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    pub fn overlay_kinds(&self) -> Vec<OverlayKind> {
        let mut kinds: Vec<OverlayKind> = self
            .features
            .iter()
            .flat_map(|f| f.overlay_kinds().iter().copied())
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    pub fn cooldown_seconds(&self) -> Option<u64> {
        self.cooldown_seconds
    }

    pub fn cooldown_updated_at(&self) -> Option<DateTime<Utc>> {
        self.cooldown_updated_at
    }

    /// Fan the event out to every feature. A failing feature is logged and
    /// skipped; returns how many failed.
    pub fn on_event(&mut self, event: &ChartEvent) -> usize {
        self.track_cooldown(event);

        let mut failures = 0;
        for feature in &mut self.features {
            if let Err(e) = feature.on_event(event) {
                failures += 1;
                tracing::warn!(
                    strategy = %self.strategy_type,
                    feature = feature.name(),
                    event = %event.kind(),
                    error = %e,
                    "Feature failed to handle event"
                );
            }
        }
        failures
    }

    pub fn clear(&mut self) -> usize {
        let mut failures = 0;
        for feature in &mut self.features {
            if let Err(e) = feature.clear() {
                failures += 1;
                tracing::warn!(
                    strategy = %self.strategy_type,
                    feature = feature.name(),
                    error = %e,
                    "Feature failed to clear"
                );
            }
        }
        self.cooldown_seconds = None;
        self.cooldown_updated_at = None;
        failures
    }

    /// Clear only the overlay kinds owned by `source`.
    pub fn clear_source(&mut self, source: Source) -> usize {
        let mut failures = 0;
        for kind in OverlayKind::owned_by(source) {
            for feature in &mut self.features {
                if let Err(e) = feature.clear_kind(kind) {
                    failures += 1;
                    tracing::warn!(
                        strategy = %self.strategy_type,
                        feature = feature.name(),
                        kind = %kind,
                        error = %e,
                        "Feature failed to clear overlay kind"
                    );
                }
            }
        }
        failures
    }

    fn track_cooldown(&mut self, event: &ChartEvent) {
        let seconds = match event {
            ChartEvent::Signal(signal)
                if signal
                    .action
                    .as_deref()
                    .is_some_and(|a| a.trim().eq_ignore_ascii_case("hold")) =>
            {
                match signal.reason.as_deref().and_then(parse_cooldown_reason) {
                    Some(secs) => Some(secs),
                    None => return,
                }
            }
            ChartEvent::Cooldown(left) => left.map(|secs| secs.ceil() as u64),
            _ => return,
        };
        self.cooldown_seconds = seconds;
        self.cooldown_updated_at = Some(Utc::now());
        tracing::debug!(strategy = %self.strategy_type, cooldown = ?seconds, "Cooldown updated");
    }
}
