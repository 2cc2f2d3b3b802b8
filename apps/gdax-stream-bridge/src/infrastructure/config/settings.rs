//! Bridge Configuration Settings
//!
//! Configuration types for the stream bridge, loaded from environment
//! variables. The core components take these structs explicitly; nothing
//! reads the environment after startup.

use std::time::Duration;

use crate::domain::routing::RoutingPolicy;
use crate::domain::subscription::{SubscriptionError, SubscriptionRequest};
use crate::infrastructure::bridge::DEFAULT_ACK_TIMEOUT;
use crate::infrastructure::feed::client::{
    DEFAULT_FEED_URL, DEFAULT_PING_INTERVAL, DEFAULT_RECEIVE_TIMEOUT, FeedClientConfig,
};
use crate::infrastructure::feed::reconnect::ReconnectConfig;

/// Default broker topic.
pub const DEFAULT_TOPIC: &str = "gdax";

/// Default broker bootstrap address.
pub const DEFAULT_BOOTSTRAP_SERVERS: &str = "localhost:9092";

/// Feed connection settings.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Feed websocket URL.
    pub url: String,
    /// Products to subscribe to.
    pub products: Vec<String>,
    /// Channels to subscribe to (heartbeat is added implicitly).
    pub channels: Vec<String>,
    /// Bound on connection open and frame receive.
    pub timeout: Duration,
    /// Liveness ping cadence.
    pub ping_interval: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            products: Vec::new(),
            channels: vec!["matches".to_string()],
            timeout: DEFAULT_RECEIVE_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }
}

impl FeedSettings {
    /// Build the validated subscription request.
    ///
    /// # Errors
    ///
    /// Returns a [`SubscriptionError`] when products or channels are empty.
    pub fn subscription(&self) -> Result<SubscriptionRequest, SubscriptionError> {
        SubscriptionRequest::new(self.products.clone(), self.channels.clone())
    }

    /// Connection parameters for the feed client.
    #[must_use]
    pub fn client_config(&self) -> FeedClientConfig {
        FeedClientConfig {
            url: self.url.clone(),
            timeout: self.timeout,
            ping_interval: self.ping_interval,
        }
    }
}

/// Broker settings.
///
/// `bootstrap_servers` is part of the deployment surface consumed by real
/// broker adapters; the bundled console sink ignores it.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// Broker bootstrap addresses.
    pub bootstrap_servers: String,
    /// Topic records are published to.
    pub topic: String,
    /// Bound on the acknowledgment wait per publish.
    pub ack_timeout: Duration,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            bootstrap_servers: DEFAULT_BOOTSTRAP_SERVERS.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Feed connection settings.
    pub feed: FeedSettings,
    /// Broker settings.
    pub broker: BrokerSettings,
    /// Forwarding policy.
    pub routing: RoutingPolicy,
    /// Reconnect backoff settings for the supervisor.
    pub reconnect: ReconnectConfig,
}

impl BridgeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when `GDAX_CLIENT_PRODUCT_IDS` is missing or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let products = parse_env_list("GDAX_CLIENT_PRODUCT_IDS")
            .ok_or_else(|| ConfigError::MissingEnvVar("GDAX_CLIENT_PRODUCT_IDS".to_string()))?;
        if products.is_empty() {
            return Err(ConfigError::EmptyValue("GDAX_CLIENT_PRODUCT_IDS".to_string()));
        }

        let defaults = FeedSettings::default();
        let feed = FeedSettings {
            url: std::env::var("GDAX_WS_URL").unwrap_or(defaults.url),
            products,
            channels: parse_env_list("GDAX_CLIENT_CHANNELS").unwrap_or(defaults.channels),
            timeout: parse_env_duration_secs("GDAX_CLIENT_TIMEOUT_SECS", defaults.timeout),
            ping_interval: parse_env_duration_secs(
                "GDAX_CLIENT_PING_INTERVAL_SECS",
                defaults.ping_interval,
            ),
        };

        let broker_defaults = BrokerSettings::default();
        let broker = BrokerSettings {
            bootstrap_servers: std::env::var("KAFKA_BOOTSTRAP_SERVERS")
                .unwrap_or(broker_defaults.bootstrap_servers),
            topic: std::env::var("GDAX_KAFKA_TOPIC").unwrap_or(broker_defaults.topic),
            ack_timeout: parse_env_duration_secs(
                "GDAX_KAFKA_ACK_TIMEOUT_SECS",
                broker_defaults.ack_timeout,
            ),
        };

        let routing = RoutingPolicy {
            matches_only: parse_env_bool("GDAX_MATCHES_ONLY", false),
            forward_last_match: parse_env_bool("GDAX_FORWARD_LAST_MATCH", true),
        };

        let reconnect_defaults = ReconnectConfig::default();
        let reconnect = ReconnectConfig {
            initial_delay: parse_env_duration_millis(
                "BRIDGE_RECONNECT_DELAY_INITIAL_MS",
                reconnect_defaults.initial_delay,
            ),
            max_delay: parse_env_duration_secs(
                "BRIDGE_RECONNECT_DELAY_MAX_SECS",
                reconnect_defaults.max_delay,
            ),
            multiplier: parse_env_f64(
                "BRIDGE_RECONNECT_DELAY_MULTIPLIER",
                reconnect_defaults.multiplier,
            ),
            jitter_factor: reconnect_defaults.jitter_factor,
            max_attempts: parse_env_u32(
                "BRIDGE_MAX_RECONNECT_ATTEMPTS",
                reconnect_defaults.max_attempts,
            ),
        };

        Ok(Self {
            feed,
            broker,
            routing,
            reconnect,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has an empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

/// Split a comma-separated value, trimming entries and dropping empties.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|v| parse_list(&v))
}

fn parse_env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
