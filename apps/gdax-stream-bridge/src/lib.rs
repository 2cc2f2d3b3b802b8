#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! GDAX Stream Bridge - Feed to Broker Forwarder
//!
//! Maintains a persistent streaming connection to the GDAX websocket
//! feed, validates and classifies inbound messages, and forwards a
//! filtered subset to a durable broker with per-product ordering.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure message model and policies
//!   - `message`: classified feed messages over a loose JSON mapping
//!   - `subscription`: validated subscription request and wire frame
//!   - `routing`: which messages the bridge forwards
//!
//! - **Application**: Port definitions
//!   - `ports`: feed transport, handler hooks, broker publishing
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `feed`: client state machine, websocket adapter, reconnect
//!   - `bridge`: the broker-forwarding handler
//!   - `broker`: bundled publish-port adapters
//!   - `config`: environment-backed settings
//!   - `telemetry`: tracing initialization
//!
//! # Data Flow
//!
//! ```text
//! Feed WS ──► FeedClient ──► FeedHandler hooks ──► PublisherBridge ──► Broker port
//!             (parse + classify)                   (filter + key + forward)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure message model and policies.
pub mod domain;

/// Application layer - Port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::message::{FeedMessage, RawMessage};
pub use domain::routing::RoutingPolicy;
pub use domain::subscription::{SubscriptionError, SubscriptionRequest};

// Ports
pub use application::ports::{
    BrokerConnector, BrokerPublisher, FeedConnection, FeedHandler, FeedTransport, PublishAck,
    PublishError, TransportError,
};

// Feed client
pub use infrastructure::feed::{
    ConnectionState, FeedClient, FeedClientConfig, FeedControl, FeedError, ReconnectConfig,
    ReconnectPolicy, WebSocketTransport, run_supervised,
};

// Publisher bridge
pub use infrastructure::bridge::{BridgeError, PublisherBridge};

// Broker adapters
pub use infrastructure::broker::{ConsoleConnector, ConsolePublisher};

// Configuration
pub use infrastructure::config::{BridgeConfig, BrokerSettings, ConfigError, FeedSettings};
