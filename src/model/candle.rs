use serde::{Deserialize, Serialize};

use super::payload::lenient_f64;
use crate::config::parse_timeframe_secs;

/// Width of one candle bucket, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeframe(u64);

impl Timeframe {
    pub const ONE_MINUTE: Timeframe = Timeframe(60);

    pub fn from_secs(secs: u64) -> Option<Self> {
        (secs > 0).then_some(Self(secs))
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        parse_timeframe_secs(s).map(Self)
    }

    pub fn secs(&self) -> i64 {
        self.0 as i64
    }

    /// Round an epoch-second value down to the start of its bucket.
    pub fn align(&self, secs: i64) -> i64 {
        let tf = self.secs();
        secs.div_euclid(tf) * tf
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Candle {
    /// Fold a trade price into this bar.
    pub fn absorb_price(&mut self, price: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }
}

/// A candle as it arrives on the wire, before time normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCandle {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub time: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
}

impl RawCandle {
    pub fn new(time: f64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time: Some(time),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: None,
        }
    }

    /// `(open, high, low, close)` when every field is present and finite.
    pub fn ohlc(&self) -> Option<(f64, f64, f64, f64)> {
        let (open, high, low, close) = (self.open?, self.high?, self.low?, self.close?);
        [open, high, low, close]
            .iter()
            .all(|v| v.is_finite())
            .then_some((open, high, low, close))
    }

    pub fn finite_volume(&self) -> Option<f64> {
        self.volume.filter(|v| v.is_finite())
    }
}

impl From<Candle> for RawCandle {
    fn from(c: Candle) -> Self {
        Self {
            volume: c.volume,
            ..Self::new(c.time as f64, c.open, c.high, c.low, c.close)
        }
    }
}
