use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};

use chart_sync::config::Config;
use chart_sync::dashboard::Dashboard;
use chart_sync::surface::{RecordingSurface, SharedSurface};
use chart_sync::transport::{LiveClient, LiveMessage, SnapshotClient, SnapshotQuery};

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required by rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Make sure config/default.toml exists and chart.chat_id is set");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.logging.level.as_str())
            }),
        )
        .init();

    tracing::info!(
        chat_id = %config.chart.chat_id,
        strategy = %config.chart.normalized_strategy_type(),
        symbol = %config.chart.symbol,
        timeframe = %config.chart.timeframe,
        rest_url = %config.server.rest_base_url,
        ws_url = %config.server.ws_url,
        "Starting chart-sync"
    );

    let query = SnapshotQuery::from_config(&config.chart)?;
    let client = SnapshotClient::new(&config.server.rest_base_url)?;
    let live = LiveClient::new(&config.server.ws_url, &query.chat_id, query.strategy_type)?;

    let recording = RecordingSurface::shared();
    let surface: SharedSurface = recording.clone();
    let dashboard =
        Dashboard::from_config(surface, &config.chart).context("failed to build dashboard")?;

    let (live_tx, live_rx) = mpsc::channel::<LiveMessage>(256);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ws_shutdown = shutdown_rx.clone();
    let ws_task = tokio::spawn(async move {
        if let Err(e) = live.connect_and_run(live_tx, ws_shutdown).await {
            tracing::error!(error = %e, "Live transport stopped");
        }
    });

    // Ctrl+C handler
    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Ctrl+C received");
        let _ = ctrl_c_shutdown.send(true);
    });

    let dashboard = dashboard
        .run(
            client,
            query,
            live_rx,
            Duration::from_millis(config.chart.frame_interval_ms.max(1)),
            shutdown_rx,
        )
        .await;

    let _ = shutdown_tx.send(true);
    let _ = ws_task.await;

    let surface = recording.borrow();
    tracing::info!(
        candles = dashboard.chart().candles().len(),
        last_price = ?dashboard.chart().last_price(),
        price_lines = surface.line_count(),
        bands = surface.band_count(),
        markers = surface.markers().len(),
        cooldown_secs = ?dashboard.strategy().cooldown_seconds(),
        "Chart state at shutdown"
    );
    Ok(())
}
