use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

use super::candle::RawCandle;

/// Read a JSON number or numeric string as `f64`.
///
/// Strings may use a comma as decimal separator. Anything unparseable is
/// `None`, so one malformed field never rejects the surrounding payload.
pub fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&v))
}

/// Identifiers arrive as either strings or integers.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// A level is a bare number, a numeric string, or an object with `price`/`value`.
pub fn level_price(v: &Value) -> Option<f64> {
    match v {
        Value::Object(map) => map
            .get("price")
            .or_else(|| map.get("value"))
            .and_then(value_to_f64),
        other => value_to_f64(other),
    }
    .filter(|p| p.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Other(String),
}

impl OrderStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => OrderStatus::New,
            "PARTIALLY_FILLED" => OrderStatus::PartiallyFilled,
            "FILLED" => OrderStatus::Filled,
            "CANCELED" | "CANCELLED" => OrderStatus::Canceled,
            other => OrderStatus::Other(other.to_string()),
        }
    }

    /// Terminal orders no longer have a line on the chart.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Canceled)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ZonePayload {
    #[serde(default, alias = "high", deserialize_with = "lenient_f64")]
    pub top: Option<f64>,
    #[serde(default, alias = "low", deserialize_with = "lenient_f64")]
    pub bottom: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

impl ZonePayload {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self {
            top: Some(top),
            bottom: Some(bottom),
            color: None,
        }
    }

    /// `(upper, lower)` regardless of the order upstream sent them in.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        normalized_band(self.top?, self.bottom?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TradeZonePayload {
    #[serde(default, alias = "high", deserialize_with = "lenient_f64")]
    pub top: Option<f64>,
    #[serde(default, alias = "low", deserialize_with = "lenient_f64")]
    pub bottom: Option<f64>,
    #[serde(default)]
    pub side: Option<String>,
}

impl TradeZonePayload {
    pub fn bounds(&self) -> Option<(f64, f64)> {
        normalized_band(self.top?, self.bottom?)
    }

    pub fn side(&self) -> Option<Side> {
        self.side.as_deref().and_then(Side::parse)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TpSlPayload {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sl: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PriceLinePayload {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

impl PriceLinePayload {
    pub fn key(&self) -> String {
        self.name.trim().to_ascii_uppercase()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WindowZonePayload {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub low: Option<f64>,
    #[serde(default, rename = "candlesData")]
    pub candles_data: Option<Vec<RawCandle>>,
}

impl WindowZonePayload {
    pub fn bounds(&self) -> Option<(f64, f64)> {
        normalized_band(self.high?, self.low?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AtrPayload {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub atr: Option<f64>,
    #[serde(default, rename = "volatilityPct", deserialize_with = "lenient_f64")]
    pub volatility_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrderPayload {
    #[serde(default, rename = "orderId", deserialize_with = "lenient_id")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl OrderPayload {
    pub fn status(&self) -> Option<OrderStatus> {
        self.status.as_deref().map(OrderStatus::parse)
    }

    pub fn side(&self) -> Option<Side> {
        self.side.as_deref().and_then(Side::parse)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TradePayload {
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub qty: Option<f64>,
}

impl TradePayload {
    pub fn side(&self) -> Option<Side> {
        self.side.as_deref().and_then(Side::parse)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MagnetPayload {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub target: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub strength: Option<f64>,
}

fn normalized_band(a: f64, b: f64) -> Option<(f64, f64)> {
    (a.is_finite() && b.is_finite()).then(|| (a.max(b), a.min(b)))
}
