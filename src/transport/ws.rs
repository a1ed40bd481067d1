use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;
use url::Url;

use super::stomp::{topic_for, Frame};
use crate::strategy::StrategyType;

/// What the live transport reports to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveMessage {
    /// The topic subscription is in place.
    Subscribed { attempt: u32 },
    /// One MESSAGE body, undecoded.
    Event(String),
    Disconnected,
    Reconnecting { attempt: u32, delay_ms: u64 },
}

/// Exponential backoff for reconnection.
#[derive(Debug)]
struct ExponentialBackoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            current: initial,
            initial,
            max,
            factor,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::from_secs_f64(
            (self.current.as_secs_f64() * self.factor).min(self.max.as_secs_f64()),
        );
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// STOMP-over-websocket subscriber for one strategy topic.
pub struct LiveClient {
    url: String,
    host: String,
    topic: String,
}

impl LiveClient {
    pub fn new(ws_url: &str, chat_id: &str, strategy_type: StrategyType) -> Result<Self> {
        let parsed =
            Url::parse(ws_url).with_context(|| format!("invalid ws_url: {}", ws_url))?;
        let host = parsed.host_str().unwrap_or("localhost").to_string();
        Ok(Self {
            url: parsed.to_string(),
            host,
            topic: topic_for(chat_id, strategy_type),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Connect and run the subscription loop with automatic reconnection.
    /// Message bodies and connection status go out through `tx`.
    pub async fn connect_and_run(
        &self,
        tx: mpsc::Sender<LiveMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut backoff = ExponentialBackoff::new(
            Duration::from_secs(1),
            Duration::from_secs(60),
            2.0,
        );
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.connect_once(attempt, &tx, &mut backoff, &mut shutdown).await {
                Ok(()) => {
                    let _ = tx.send(LiveMessage::Disconnected).await;
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Live subscription dropped");
                    if tx.send(LiveMessage::Disconnected).await.is_err() {
                        break;
                    }

                    let delay = backoff.next_delay();
                    let _ = tx
                        .send(LiveMessage::Reconnecting {
                            attempt,
                            delay_ms: delay.as_millis() as u64,
                        })
                        .await;

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = shutdown.changed() => {
                            tracing::info!("Shutdown during reconnect");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn connect_once(
        &self,
        attempt: u32,
        tx: &mpsc::Sender<LiveMessage>,
        backoff: &mut ExponentialBackoff,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        tracing::info!(url = %self.url, attempt, "Connecting live stream");

        let (ws_stream, _resp) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .context("WebSocket connect failed")?;
        let (mut write, mut read) = ws_stream.split();

        write
            .send(tungstenite::Message::Text(Frame::connect(&self.host).encode()))
            .await
            .context("STOMP CONNECT send failed")?;

        let subscription_id = format!("sub-{}", uuid::Uuid::new_v4());
        let mut subscribed = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    let text = match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => text,
                        Some(Ok(tungstenite::Message::Close(_))) | None => {
                            return Err(anyhow::anyhow!("WebSocket stream ended"));
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            return Err(anyhow::anyhow!("WebSocket read error: {}", e));
                        }
                    };

                    let frame = match Frame::decode(&text) {
                        Ok(Some(frame)) => frame,
                        Ok(None) => continue,
                        Err(e) => {
                            tracing::debug!(error = %e, "Failed to decode STOMP frame");
                            continue;
                        }
                    };

                    match frame.command.as_str() {
                        "CONNECTED" if !subscribed => {
                            write
                                .send(tungstenite::Message::Text(
                                    Frame::subscribe(&subscription_id, &self.topic).encode(),
                                ))
                                .await
                                .context("STOMP SUBSCRIBE send failed")?;
                            subscribed = true;
                            backoff.reset();
                            tracing::info!(topic = %self.topic, "Subscribed to live topic");
                            if tx.send(LiveMessage::Subscribed { attempt }).await.is_err() {
                                return Ok(());
                            }
                        }
                        "MESSAGE" => {
                            if tx.send(LiveMessage::Event(frame.body)).await.is_err() {
                                return Ok(());
                            }
                        }
                        "ERROR" => {
                            let reason = frame.header("message").unwrap_or("no message").to_string();
                            return Err(anyhow::anyhow!("STOMP error frame: {}", reason));
                        }
                        other => {
                            tracing::debug!(command = other, "Ignoring STOMP frame");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    let _ = write
                        .send(tungstenite::Message::Text(Frame::disconnect().encode()))
                        .await;
                    return Ok(());
                }
            }
        }
    }
}
