//! Decoding of live and snapshot events into a closed set of variants.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::model::candle::RawCandle;
use crate::model::payload::{
    level_price, value_to_f64, AtrPayload, MagnetPayload, OrderPayload, PriceLinePayload,
    TpSlPayload, TradePayload, TradeZonePayload, WindowZonePayload, ZonePayload,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Candle,
    Price,
    Levels,
    ActiveLevel,
    Zone,
    PriceLine,
    WindowZone,
    Atr,
    TradeZone,
    TpSl,
    Order,
    Magnet,
    Trade,
    Signal,
    Cooldown,
    Unknown(String),
}

impl EventKind {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "candle" => EventKind::Candle,
            "price" => EventKind::Price,
            "levels" => EventKind::Levels,
            "active_level" => EventKind::ActiveLevel,
            "zone" => EventKind::Zone,
            "price_line" => EventKind::PriceLine,
            "window_zone" => EventKind::WindowZone,
            "atr" => EventKind::Atr,
            "trade_zone" => EventKind::TradeZone,
            "tp_sl" => EventKind::TpSl,
            "order" => EventKind::Order,
            "magnet" => EventKind::Magnet,
            "trade" => EventKind::Trade,
            "signal" => EventKind::Signal,
            "cooldown" => EventKind::Cooldown,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Candle => "candle",
            EventKind::Price => "price",
            EventKind::Levels => "levels",
            EventKind::ActiveLevel => "active_level",
            EventKind::Zone => "zone",
            EventKind::PriceLine => "price_line",
            EventKind::WindowZone => "window_zone",
            EventKind::Atr => "atr",
            EventKind::TradeZone => "trade_zone",
            EventKind::TpSl => "tp_sl",
            EventKind::Order => "order",
            EventKind::Magnet => "magnet",
            EventKind::Trade => "trade",
            EventKind::Signal => "signal",
            EventKind::Cooldown => "cooldown",
            EventKind::Unknown(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SignalPayload {
    #[serde(default, alias = "name")]
    pub action: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// One decoded event. `None` payloads mean "clear this overlay".
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    Candle(RawCandle),
    Price(Option<f64>),
    /// Finite level prices; empty clears.
    Levels(Vec<f64>),
    ActiveLevel(Option<f64>),
    Zone(Option<ZonePayload>),
    PriceLine(Option<PriceLinePayload>),
    WindowZone(Option<WindowZonePayload>),
    Atr(Option<AtrPayload>),
    TradeZone(Option<TradeZonePayload>),
    TpSl(Option<TpSlPayload>),
    Order(Option<OrderPayload>),
    Magnet(Option<MagnetPayload>),
    Trade {
        trade: Option<TradePayload>,
        time: Option<f64>,
    },
    Signal(SignalPayload),
    /// Seconds left, when the server reports an active cooldown.
    Cooldown(Option<f64>),
    Unknown(String),
}

impl ChartEvent {
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, AppError> {
        let Value::Object(obj) = value else {
            return Err(AppError::InvalidEvent("event is not a JSON object".to_string()));
        };
        let kind = match obj.get("type").and_then(Value::as_str) {
            Some(t) if !t.trim().is_empty() => EventKind::parse(t),
            _ => return Err(AppError::InvalidEvent("missing event type".to_string())),
        };

        let event = match kind {
            EventKind::Candle => {
                let mut raw: RawCandle = match obj.get("kline") {
                    Some(kline) if !kline.is_null() => RawCandle::deserialize(kline)?,
                    _ => RawCandle::deserialize(&Value::Object(obj.clone()))?,
                };
                if raw.time.is_none() {
                    raw.time = obj.get("time").and_then(value_to_f64);
                }
                ChartEvent::Candle(raw)
            }
            EventKind::Price => ChartEvent::Price(obj.get("price").and_then(value_to_f64)),
            EventKind::Levels => ChartEvent::Levels(match obj.get("levels") {
                Some(Value::Array(items)) => items.iter().filter_map(level_price).collect(),
                None | Some(Value::Null) => Vec::new(),
                Some(_) => {
                    return Err(AppError::InvalidEvent("levels is not an array".to_string()))
                }
            }),
            EventKind::ActiveLevel => {
                ChartEvent::ActiveLevel(obj.get("activeLevel").and_then(level_price))
            }
            EventKind::Zone => ChartEvent::Zone(payload(&obj, "zone")?),
            EventKind::PriceLine => ChartEvent::PriceLine(payload(&obj, "priceLine")?),
            EventKind::WindowZone => ChartEvent::WindowZone(payload(&obj, "windowZone")?),
            EventKind::Atr => ChartEvent::Atr(payload(&obj, "atr")?),
            EventKind::TradeZone => ChartEvent::TradeZone(payload(&obj, "tradeZone")?),
            EventKind::TpSl => ChartEvent::TpSl(payload(&obj, "tpSl")?),
            EventKind::Order => ChartEvent::Order(if obj.contains_key("order") {
                payload(&obj, "order")?
            } else if obj.contains_key("orderId") {
                Some(OrderPayload::deserialize(&Value::Object(obj.clone()))?)
            } else {
                None
            }),
            EventKind::Magnet => ChartEvent::Magnet(payload(&obj, "magnet")?),
            EventKind::Trade => ChartEvent::Trade {
                trade: payload(&obj, "trade")?,
                time: obj.get("time").and_then(value_to_f64),
            },
            EventKind::Signal => {
                let mut signal: SignalPayload = payload(&obj, "signal")?.unwrap_or_default();
                if let Some(action) = obj.get("action").and_then(Value::as_str) {
                    signal.action = Some(action.to_string());
                }
                if let Some(reason) = obj.get("reason").and_then(Value::as_str) {
                    signal.reason = Some(reason.to_string());
                }
                ChartEvent::Signal(signal)
            }
            EventKind::Cooldown => ChartEvent::Cooldown(
                obj.get("metric")
                    .and_then(value_to_f64)
                    .filter(|v| v.is_finite() && *v > 0.0),
            ),
            EventKind::Unknown(name) => ChartEvent::Unknown(name),
        };
        Ok(event)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ChartEvent::Candle(_) => EventKind::Candle,
            ChartEvent::Price(_) => EventKind::Price,
            ChartEvent::Levels(_) => EventKind::Levels,
            ChartEvent::ActiveLevel(_) => EventKind::ActiveLevel,
            ChartEvent::Zone(_) => EventKind::Zone,
            ChartEvent::PriceLine(_) => EventKind::PriceLine,
            ChartEvent::WindowZone(_) => EventKind::WindowZone,
            ChartEvent::Atr(_) => EventKind::Atr,
            ChartEvent::TradeZone(_) => EventKind::TradeZone,
            ChartEvent::TpSl(_) => EventKind::TpSl,
            ChartEvent::Order(_) => EventKind::Order,
            ChartEvent::Magnet(_) => EventKind::Magnet,
            ChartEvent::Trade { .. } => EventKind::Trade,
            ChartEvent::Signal(_) => EventKind::Signal,
            ChartEvent::Cooldown(_) => EventKind::Cooldown,
            ChartEvent::Unknown(name) => EventKind::Unknown(name.clone()),
        }
    }
}

fn payload<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Result<Option<T>, AppError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => Ok(Some(T::deserialize(v)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candle_accepts_kline_and_flat_shapes() {
        let nested = ChartEvent::from_json(
            r#"{"type":"candle","time":1700000000000,"kline":{"open":"10","high":12,"low":9,"close":11}}"#,
        )
        .unwrap();
        let flat = ChartEvent::from_json(
            r#"{"type":"candle","time":1700000000000,"open":10,"high":12,"low":9,"close":11}"#,
        )
        .unwrap();
        assert_eq!(nested, flat);
        let ChartEvent::Candle(raw) = nested else {
            panic!("expected candle");
        };
        assert_eq!(raw.time, Some(1_700_000_000_000.0));
        assert_eq!(raw.open, Some(10.0));
    }

    #[test]
    fn null_payload_means_clear() {
        assert_eq!(
            ChartEvent::from_json(r#"{"type":"zone","zone":null}"#).unwrap(),
            ChartEvent::Zone(None)
        );
        assert_eq!(
            ChartEvent::from_json(r#"{"type":"price_line"}"#).unwrap(),
            ChartEvent::PriceLine(None)
        );
        assert_eq!(
            ChartEvent::from_json(r#"{"type":"levels","levels":[]}"#).unwrap(),
            ChartEvent::Levels(Vec::new())
        );
    }

    #[test]
    fn order_nested_or_flattened() {
        let nested =
            ChartEvent::from_json(r#"{"type":"order","order":{"orderId":7,"status":"NEW"}}"#)
                .unwrap();
        let flat = ChartEvent::from_json(r#"{"type":"order","orderId":"7","status":"NEW"}"#)
            .unwrap();
        assert_eq!(nested, flat);
    }

    #[test]
    fn levels_mix_shapes_and_drop_garbage() {
        let ev = ChartEvent::from_json(
            r#"{"type":"levels","levels":[{"price":"100.5"},101,"x",{"value":"99,5"}]}"#,
        )
        .unwrap();
        assert_eq!(ev, ChartEvent::Levels(vec![100.5, 101.0, 99.5]));
    }

    #[test]
    fn signal_reads_top_level_or_nested() {
        let top = ChartEvent::from_json(r#"{"type":"signal","action":"hold","reason":"cooldown 12s"}"#)
            .unwrap();
        let nested = ChartEvent::from_json(
            r#"{"type":"signal","signal":{"name":"hold","reason":"cooldown 12s"}}"#,
        )
        .unwrap();
        assert_eq!(top, nested);
    }

    #[test]
    fn unknown_type_is_a_variant_and_missing_type_is_an_error() {
        let ev = ChartEvent::from_json(r#"{"type":"metric","metric":1}"#).unwrap();
        assert_eq!(ev.kind(), EventKind::Unknown("metric".to_string()));
        assert!(ChartEvent::from_json(r#"{"zone":null}"#).is_err());
        assert!(ChartEvent::from_json("[1,2]").is_err());
        assert!(ChartEvent::from_json(r#"{"type":"zone","zone":"wide"}"#).is_err());
    }
}
