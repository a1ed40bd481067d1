use anyhow::{Context, Result};
use url::Url;

use crate::config::ChartConfig;
use crate::error::AppError;
use crate::model::snapshot::SnapshotResponse;
use crate::strategy::StrategyType;

/// Parameters of one snapshot request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotQuery {
    pub chat_id: String,
    pub strategy_type: StrategyType,
    pub symbol: String,
    pub timeframe: String,
    pub limit: u32,
}

impl SnapshotQuery {
    pub fn from_config(chart: &ChartConfig) -> Result<Self> {
        let strategy_type = chart.strategy_type.parse::<StrategyType>()?;
        Ok(Self {
            chat_id: chart.chat_id.clone(),
            strategy_type,
            symbol: chart.symbol.trim().to_ascii_uppercase(),
            timeframe: chart.timeframe.trim().to_string(),
            limit: chart.limit,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SnapshotClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid rest_base_url: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("rest_base_url is not a base URL: {}", base_url)).into());
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    /// `{base}/api/chart/strategy?chatId&type&symbol&timeframe&limit`
    pub fn snapshot_url(&self, query: &SnapshotQuery) -> Result<Url> {
        let mut url = self.endpoint(&["api", "chart", "strategy"])?;
        url.query_pairs_mut()
            .append_pair("chatId", &query.chat_id)
            .append_pair("type", query.strategy_type.as_str())
            .append_pair("symbol", &query.symbol)
            .append_pair("timeframe", &query.timeframe)
            .append_pair("limit", &query.limit.to_string());
        Ok(url)
    }

    /// `{base}/api/strategy/{chatId}/{type}/replay`
    pub fn replay_url(&self, chat_id: &str, strategy_type: StrategyType) -> Result<Url> {
        self.endpoint(&["api", "strategy", chat_id, strategy_type.as_str(), "replay"])
    }

    pub async fn fetch_snapshot(&self, query: &SnapshotQuery) -> Result<SnapshotResponse> {
        let url = self.snapshot_url(query)?;
        tracing::debug!(url = %url, "Fetching chart snapshot");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("snapshot request failed")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::SnapshotStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let snapshot: SnapshotResponse = resp
            .json()
            .await
            .context("snapshot body is not valid JSON")?;
        tracing::info!(
            symbol = %query.symbol,
            candles = snapshot.candles.len(),
            "Snapshot received"
        );
        Ok(snapshot)
    }

    /// Ask the backend to re-publish buffered live state. The response body is ignored.
    pub async fn trigger_replay(&self, chat_id: &str, strategy_type: StrategyType) -> Result<()> {
        let url = self.replay_url(chat_id, strategy_type)?;
        self.http
            .post(url)
            .send()
            .await
            .context("replay request failed")?
            .error_for_status()
            .context("replay returned error status")?;
        tracing::info!(chat_id, strategy = %strategy_type, "Replay requested");
        Ok(())
    }

    /// Fire-and-forget replay. Failures are only logged.
    pub fn spawn_replay(
        &self,
        chat_id: String,
        strategy_type: StrategyType,
    ) -> tokio::task::JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.trigger_replay(&chat_id, strategy_type).await {
                tracing::warn!(error = %e, "Replay request failed");
            }
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("rest_base_url is not a base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
