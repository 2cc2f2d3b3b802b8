//! GDAX Stream Bridge Binary
//!
//! Starts the feed-to-broker bridge.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin gdax-stream-bridge
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `GDAX_CLIENT_PRODUCT_IDS`: Comma-separated products (e.g. `BTC-EUR,LTC-EUR`)
//!
//! ## Optional
//! - `GDAX_CLIENT_CHANNELS`: Comma-separated channels (default: `matches`)
//! - `GDAX_WS_URL`: Feed websocket URL (default: `wss://ws-feed.gdax.com`)
//! - `GDAX_CLIENT_TIMEOUT_SECS`: Open/receive timeout (default: 30)
//! - `GDAX_CLIENT_PING_INTERVAL_SECS`: Liveness ping cadence (default: 10)
//! - `GDAX_KAFKA_TOPIC`: Broker topic (default: `gdax`)
//! - `KAFKA_BOOTSTRAP_SERVERS`: Broker addresses (default: `localhost:9092`)
//! - `GDAX_KAFKA_ACK_TIMEOUT_SECS`: Publish acknowledgment bound (default: 5)
//! - `GDAX_MATCHES_ONLY`: Forward only `match` messages (default: false)
//! - `GDAX_FORWARD_LAST_MATCH`: Forward `last_match` snapshots (default: true)
//! - `BRIDGE_RECONNECT_DELAY_INITIAL_MS` / `BRIDGE_RECONNECT_DELAY_MAX_SECS` /
//!   `BRIDGE_RECONNECT_DELAY_MULTIPLIER` / `BRIDGE_MAX_RECONNECT_ATTEMPTS`:
//!   Reconnect backoff tuning (0 attempts = unlimited)
//! - `RUST_LOG`: Log level (default: info)

use anyhow::Context;
use gdax_stream_bridge::infrastructure::telemetry;
use gdax_stream_bridge::{
    BridgeConfig, ConsoleConnector, FeedClient, FeedControl, FeedError, PublisherBridge,
    WebSocketTransport, run_supervised,
};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();
    telemetry::init();

    tracing::info!("starting gdax stream bridge");

    let config = BridgeConfig::from_env().context("loading configuration")?;
    log_config(&config);

    let subscription = config
        .feed
        .subscription()
        .context("building subscription request")?;

    let control = FeedControl::new();

    let signal_control = control.clone();
    tokio::spawn(async move {
        await_shutdown().await;
        signal_control.stop();
    });

    let result = run_supervised(
        &control,
        |ctl| {
            let bridge = PublisherBridge::new(
                config.broker.topic.clone(),
                config.routing,
                ConsoleConnector::new(),
                ctl.clone(),
            )
            .with_ack_timeout(config.broker.ack_timeout);

            FeedClient::with_control(
                WebSocketTransport::new(),
                bridge,
                subscription.clone(),
                config.feed.client_config(),
                ctl,
            )
        },
        config.reconnect.clone(),
        |error| match error {
            FeedError::Transport(_) => true,
            FeedError::Handler(e) => e.is_transport(),
            _ => false,
        },
    )
    .await;

    match result {
        Ok(()) => {
            tracing::info!("bridge stopped");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &BridgeConfig) {
    tracing::info!(
        url = %config.feed.url,
        products = config.feed.products.join(","),
        channels = config.feed.channels.join(","),
        topic = %config.broker.topic,
        bootstrap_servers = %config.broker.bootstrap_servers,
        matches_only = config.routing.matches_only,
        forward_last_match = config.routing.forward_last_match,
        "configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, initiating shutdown");
        }
    }
}
