//! Dashboard coordinator: snapshot, live subscription, event routing.
//!
//! Snapshot-owned overlay kinds are cleared and redrawn on every applied
//! snapshot. Live-owned kinds are only ever touched by live events.
//!
//! Every snapshot request carries a sequence number and only the newest one
//! is applied. A live bar at or after the snapshot's last bucket is merged back
//! on top of the loaded history.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::chart::{ChartController, LiveCandleOutcome};
use crate::config::ChartConfig;
use crate::event::ChartEvent;
use crate::model::candle::{Candle, RawCandle, Timeframe};
use crate::model::snapshot::SnapshotResponse;
use crate::overlay::{LayerRenderer, Source};
use crate::strategy::{Strategy, StrategyType};
use crate::surface::SharedSurface;
use crate::transport::{LiveMessage, SnapshotClient, SnapshotQuery};

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    /// History loaded and snapshot-owned overlays redrawn.
    Applied {
        candles: usize,
        live_bar_restored: bool,
    },
    /// No usable candles: snapshot-owned overlays cleared, nothing else touched.
    Empty,
    /// A newer request was issued after this one.
    Superseded { seq: u64, latest: u64 },
}

pub struct Dashboard {
    chart: ChartController,
    layers: Rc<RefCell<LayerRenderer>>,
    strategy: Strategy,
    issued_seq: u64,
    applied_seq: Option<u64>,
    live_bar: Option<Candle>,
    replay_sent: bool,
    needs_resync: bool,
}

impl Dashboard {
    pub fn new(
        surface: SharedSurface,
        strategy_type: StrategyType,
        timeframe: Timeframe,
        history_capacity: usize,
        marker_capacity: usize,
    ) -> Self {
        let layers = Rc::new(RefCell::new(LayerRenderer::new(
            surface.clone(),
            marker_capacity,
        )));
        let strategy = Strategy::for_type(strategy_type, &layers);
        tracing::info!(
            strategy = %strategy_type,
            features = ?strategy.feature_names(),
            timeframe_secs = timeframe.secs(),
            "Dashboard initialized"
        );
        Self {
            chart: ChartController::new(surface, timeframe, history_capacity),
            layers,
            strategy,
            issued_seq: 0,
            applied_seq: None,
            live_bar: None,
            replay_sent: false,
            needs_resync: false,
        }
    }

    pub fn from_config(surface: SharedSurface, chart: &ChartConfig) -> anyhow::Result<Self> {
        let strategy_type = chart.strategy_type.parse::<StrategyType>()?;
        let timeframe = Timeframe::parse(&chart.timeframe)?;
        Ok(Self::new(
            surface,
            strategy_type,
            timeframe,
            chart.history_capacity,
            chart.trade_marker_capacity,
        ))
    }

    pub fn chart(&self) -> &ChartController {
        &self.chart
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn layers(&self) -> &Rc<RefCell<LayerRenderer>> {
        &self.layers
    }

    pub fn applied_seq(&self) -> Option<u64> {
        self.applied_seq
    }

    /// Issue the sequence number for a new snapshot request.
    pub fn begin_snapshot(&mut self) -> u64 {
        self.issued_seq += 1;
        self.issued_seq
    }

    pub fn apply_snapshot(&mut self, seq: u64, snapshot: SnapshotResponse) -> SnapshotOutcome {
        if seq != self.issued_seq {
            tracing::info!(seq, latest = self.issued_seq, "Dropping superseded snapshot");
            return SnapshotOutcome::Superseded {
                seq,
                latest: self.issued_seq,
            };
        }
        self.applied_seq = Some(seq);

        let summary = if snapshot.candles.is_empty() {
            None
        } else {
            self.chart.load_history(&snapshot.candles)
        };
        let Some(summary) = summary else {
            self.strategy.clear_source(Source::Snapshot);
            tracing::info!(seq, "Snapshot without candles, snapshot overlays cleared");
            return SnapshotOutcome::Empty;
        };
        if summary.timeframe_corrected {
            tracing::info!(
                timeframe_secs = summary.timeframe.secs(),
                "Timeframe corrected from snapshot spacing"
            );
        }

        let live_bar_restored = self.restore_live_bar();

        self.strategy.clear_source(Source::Snapshot);
        if let Some(layers) = snapshot.layers {
            if let Some(levels) = layers.level_prices() {
                self.strategy.on_event(&ChartEvent::Levels(levels));
            }
            if let Some(zone) = layers.zone {
                self.strategy.on_event(&ChartEvent::Zone(Some(zone)));
            }
            if let Some(tp_sl) = layers.tp_sl {
                self.strategy.on_event(&ChartEvent::TpSl(Some(tp_sl)));
            }
        }

        tracing::info!(
            seq,
            candles = summary.loaded,
            dropped = summary.dropped,
            live_bar_restored,
            "Snapshot applied"
        );
        SnapshotOutcome::Applied {
            candles: self.chart.candles().len(),
            live_bar_restored,
        }
    }

    /// Route one decoded live event.
    pub fn on_live_event(&mut self, event: &ChartEvent) {
        match event {
            ChartEvent::Candle(raw) => {
                let outcome = self.chart.on_candle(raw);
                match outcome {
                    LiveCandleOutcome::Replaced | LiveCandleOutcome::Appended => {
                        self.live_bar = self.chart.last_bar().copied();
                    }
                    LiveCandleOutcome::Dropped => {
                        tracing::debug!(time = ?raw.time, "Out-of-order live candle dropped");
                    }
                    LiveCandleOutcome::Rejected => {
                        tracing::debug!(time = ?raw.time, "Malformed live candle skipped");
                    }
                }
            }
            ChartEvent::Price(Some(price)) => {
                if self.chart.on_price(*price) {
                    self.live_bar = self.chart.last_bar().copied();
                }
            }
            ChartEvent::Price(None) => tracing::debug!("Price event without price skipped"),
            other => {
                self.strategy.on_event(other);
            }
        }
    }

    /// Decode and route one raw message body. Undecodable bodies are skipped.
    pub fn on_live_message(&mut self, body: &str) {
        match ChartEvent::from_json(body) {
            Ok(event) => self.on_live_event(&event),
            Err(e) => tracing::debug!(error = %e, "Skipping undecodable live message"),
        }
    }

    /// Explicit timeframe change. Candles and the last-price line are reset,
    /// a drawn window zone is redrawn, and the next snapshot repopulates
    /// history.
    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        self.chart.set_timeframe(timeframe);
        self.live_bar = None;
        let restored = self.layers.borrow_mut().restore_window_zone();
        tracing::info!(timeframe_secs = timeframe.secs(), restored, "Timeframe changed");
    }

    pub fn on_frame(&mut self) -> bool {
        self.chart.on_frame()
    }

    /// Replay is requested once, after the first successful subscription.
    pub fn should_replay(&mut self) -> bool {
        !std::mem::replace(&mut self.replay_sent, true)
    }

    /// Drive the dashboard until shutdown or until the live channel closes.
    pub async fn run(
        mut self,
        client: SnapshotClient,
        query: SnapshotQuery,
        mut live_rx: mpsc::Receiver<LiveMessage>,
        frame_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> Self {
        let (snapshot_tx, mut snapshot_rx) = mpsc::channel(4);
        self.request_snapshot(&client, &query, &snapshot_tx);

        let mut frames = tokio::time::interval(frame_interval);
        frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                Some((seq, result)) = snapshot_rx.recv() => match result {
                    Ok(snapshot) => {
                        self.apply_snapshot(seq, snapshot);
                    }
                    Err(e) => {
                        tracing::warn!(seq, error = %e, "Snapshot request failed, keeping current state");
                    }
                },
                msg = live_rx.recv() => match msg {
                    Some(LiveMessage::Event(body)) => self.on_live_message(&body),
                    Some(LiveMessage::Subscribed { attempt }) => {
                        tracing::info!(attempt, "Live subscription established");
                        if std::mem::take(&mut self.needs_resync) {
                            self.request_snapshot(&client, &query, &snapshot_tx);
                        }
                        if self.should_replay() {
                            client.spawn_replay(query.chat_id.clone(), query.strategy_type);
                        }
                    }
                    Some(LiveMessage::Disconnected) => {
                        tracing::warn!("Live subscription lost");
                        self.needs_resync = true;
                    }
                    Some(LiveMessage::Reconnecting { attempt, delay_ms }) => {
                        tracing::info!(attempt, delay_ms, "Live subscription reconnecting");
                    }
                    None => {
                        tracing::info!("Live channel closed");
                        break;
                    }
                },
                _ = frames.tick() => {
                    self.on_frame();
                }
                _ = shutdown.changed() => {
                    tracing::info!("Dashboard shutting down");
                    break;
                }
            }
        }
        self
    }

    fn request_snapshot(
        &mut self,
        client: &SnapshotClient,
        query: &SnapshotQuery,
        tx: &mpsc::Sender<(u64, anyhow::Result<SnapshotResponse>)>,
    ) {
        let seq = self.begin_snapshot();
        let client = client.clone();
        let query = query.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_snapshot(&query).await;
            let _ = tx.send((seq, result)).await;
        });
    }

    fn restore_live_bar(&mut self) -> bool {
        let (Some(live), Some(last)) = (self.live_bar, self.chart.last_bar().copied()) else {
            return false;
        };
        if live.time < last.time {
            return false;
        }
        self.chart.on_candle(&RawCandle::from(live)).changed()
    }
}
