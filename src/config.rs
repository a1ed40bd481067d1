use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::strategy::StrategyType;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub chart: ChartConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub rest_base_url: String,
    pub ws_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    pub chat_id: String,
    pub strategy_type: String,
    pub symbol: String,
    pub timeframe: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_trade_marker_capacity")]
    pub trade_marker_capacity: usize,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_limit() -> u32 {
    500
}

fn default_history_capacity() -> usize {
    1000
}

fn default_trade_marker_capacity() -> usize {
    300
}

fn default_frame_interval_ms() -> u64 {
    16
}

/// Parse a timeframe string (e.g. "1s", "1m", "1h", "1d", "1w", "1M") into seconds.
pub fn parse_timeframe_secs(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.len() < 2 {
        bail!("invalid timeframe '{}': expected format like '1m'", s);
    }

    let Some((split, _)) = s.char_indices().last() else {
        bail!("invalid timeframe '{}': expected format like '1m'", s);
    };
    let (num_str, suffix) = s.split_at(split);
    let n: u64 = num_str.parse().with_context(|| {
        format!(
            "invalid timeframe '{}': quantity must be a positive integer",
            s
        )
    })?;
    if n == 0 {
        bail!("invalid timeframe '{}': quantity must be > 0", s);
    }

    let unit_secs = match suffix {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 7 * 86_400,
        "M" => 30 * 86_400,
        _ => bail!(
            "invalid timeframe '{}': unsupported suffix '{}', expected one of s/m/h/d/w/M",
            s,
            suffix
        ),
    };

    n.checked_mul(unit_secs)
        .with_context(|| format!("invalid timeframe '{}': value is too large", s))
}

impl ChartConfig {
    pub fn timeframe_secs(&self) -> Result<u64> {
        parse_timeframe_secs(&self.timeframe)
    }

    pub fn normalized_strategy_type(&self) -> String {
        self.strategy_type.trim().to_ascii_uppercase()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from_path(Path::new("config/default.toml"))
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config = Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        if let Ok(chat_id) = std::env::var("CHART_CHAT_ID") {
            if !chat_id.trim().is_empty() {
                config.chart.chat_id = chat_id.trim().to_string();
            }
        }

        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("invalid config TOML")?;

        config
            .chart
            .timeframe_secs()
            .context("chart.timeframe is invalid")?;
        config
            .chart
            .strategy_type
            .parse::<StrategyType>()
            .context("chart.strategy_type is invalid")?;
        if config.chart.chat_id.trim().is_empty() {
            bail!("chart.chat_id must not be empty");
        }
        if config.chart.trade_marker_capacity == 0 {
            bail!("chart.trade_marker_capacity must be > 0");
        }
        if config.chart.history_capacity == 0 {
            bail!("chart.history_capacity must be > 0");
        }

        Ok(config)
    }
}
