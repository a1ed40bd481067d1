use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::candle::RawCandle;
use super::payload::{level_price, TpSlPayload, ZonePayload};

/// Body of the one-shot chart snapshot request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SnapshotResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub candles: Vec<RawCandle>,
    #[serde(default)]
    pub layers: Option<SnapshotLayers>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RawCandle>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RawCandle>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Overlays carried by the snapshot. Only snapshot-owned kinds appear here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SnapshotLayers {
    #[serde(default)]
    pub levels: Option<Vec<Value>>,
    #[serde(default)]
    pub zone: Option<ZonePayload>,
    #[serde(default, rename = "tpSl")]
    pub tp_sl: Option<TpSlPayload>,
}

impl SnapshotLayers {
    /// Finite level prices, or `None` when the snapshot carried no levels array.
    pub fn level_prices(&self) -> Option<Vec<f64>> {
        self.levels
            .as_ref()
            .map(|items| items.iter().filter_map(level_price).collect())
    }
}
