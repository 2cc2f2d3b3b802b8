//! Port Interfaces
//!
//! Contracts for the external systems the bridge collaborates with,
//! following the Hexagonal Architecture pattern. Infrastructure adapters
//! implement these; the core never names a concrete transport or broker.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`FeedTransport`] / [`FeedConnection`]: streaming connection to the
//!   feed (send / receive-with-timeout / ping / close)
//! - [`BrokerConnector`] / [`BrokerPublisher`]: durable broker publishing
//!   (`publish(topic, key, value)` with an acknowledgment)
//!
//! ## Extension Points
//!
//! - [`FeedHandler`]: the hook set invoked by the feed client's receive
//!   loop. All hooks default to no-ops except `on_connection_error`, which
//!   re-raises.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::message::{FeedMessage, RawMessage};

// =============================================================================
// Feed Transport
// =============================================================================

/// Errors surfaced by the feed transport.
///
/// Adapters map their library errors onto these variants; the core never
/// sees transport-library types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No frame arrived within the allotted time.
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),
    /// The peer closed the connection.
    #[error("connection closed")]
    Closed,
    /// Any other transport failure.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Opens streaming connections to a feed URL.
#[async_trait]
pub trait FeedTransport: Send {
    /// The connection type this transport produces.
    type Connection: FeedConnection + Send;

    /// Open a connection, bounded by `timeout`.
    async fn open(&self, url: &str, timeout: Duration)
        -> Result<Self::Connection, TransportError>;
}

/// An open streaming connection to the feed.
#[async_trait]
pub trait FeedConnection: Send {
    /// Send a text frame.
    async fn send(&mut self, frame: &str) -> Result<(), TransportError>;

    /// Receive the next text frame, waiting at most `timeout`.
    async fn receive(&mut self, timeout: Duration) -> Result<String, TransportError>;

    /// Send a protocol-level liveness ping.
    async fn ping(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Close the connection, swallowing errors.
    async fn close(&mut self);
}

// =============================================================================
// Feed Handler Hooks
// =============================================================================

/// Callback hooks invoked by the feed client.
///
/// Implementations override the hooks they care about; the rest default to
/// no-ops. `on_message` fires for every parsed message before the
/// type-specific hook; unrecognized message types reach only `on_message`.
///
/// The associated error must be constructible from [`TransportError`] so
/// the default `on_connection_error` can re-raise, making any transport
/// error fatal unless the implementation decides otherwise.
#[async_trait]
pub trait FeedHandler: Send {
    /// Error type surfaced by the hooks.
    type Error: std::error::Error + From<TransportError> + Send + Sync + 'static;

    /// Called before the transport connects.
    async fn on_setup(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called once the transport connection is open.
    async fn on_connected(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called after the connection has been closed.
    ///
    /// Also runs when the transport open fails, so resources acquired in
    /// `on_setup` can be released either way.
    async fn on_disconnected(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for every parsed message, before type-specific dispatch.
    async fn on_message(&mut self, _msg: &FeedMessage) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for `heartbeat` messages.
    async fn on_heartbeat(&mut self, _msg: &RawMessage) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for the `last_match` snapshot sent after subscribing.
    async fn on_last_match(&mut self, _msg: &RawMessage) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for subscription confirmations.
    async fn on_subscriptions(&mut self, _msg: &RawMessage) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for each trade execution.
    async fn on_match(&mut self, _msg: &RawMessage) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when subscribing, receiving, or pinging fails.
    ///
    /// Returning `Ok` lets the client terminate cleanly so an external
    /// supervisor can reconnect; the default re-raises, making transport
    /// errors fatal.
    async fn on_connection_error(&mut self, error: TransportError) -> Result<(), Self::Error> {
        Err(Self::Error::from(error))
    }
}

// =============================================================================
// Broker Publishing
// =============================================================================

/// Acknowledgment returned by a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishAck {
    /// Partition the record landed on.
    pub partition: i32,
    /// Offset assigned to the record.
    pub offset: i64,
}

/// Errors surfaced by the broker publish port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// The broker could not be reached.
    #[error("broker unavailable: {0}")]
    Unavailable(String),
    /// The broker rejected or failed the publish.
    #[error("publish failed: {0}")]
    Failed(String),
    /// No acknowledgment arrived within the allotted time.
    #[error("acknowledgment timed out after {0:?}")]
    AckTimeout(Duration),
}

/// A connected broker producer.
#[async_trait]
pub trait BrokerPublisher: Send {
    /// Publish a keyed record and wait for the broker's acknowledgment.
    async fn publish(
        &mut self,
        topic: &str,
        key: &str,
        value: &Value,
    ) -> Result<PublishAck, PublishError>;

    /// Close the producer, flushing anything pending.
    async fn close(&mut self);
}

/// Builds broker publishers.
///
/// The bridge connects during setup, before the feed transport opens, so a
/// broker that cannot be reached fails the run before any feed traffic is
/// accepted.
#[async_trait]
pub trait BrokerConnector: Send {
    /// The publisher type this connector produces.
    type Publisher: BrokerPublisher + Send;

    /// Establish the producer connection.
    async fn connect(&self) -> Result<Self::Publisher, PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        assert_eq!(
            TransportError::Timeout(Duration::from_secs(30)).to_string(),
            "connection timed out after 30s"
        );
        assert_eq!(TransportError::Closed.to_string(), "connection closed");
        assert_eq!(
            TransportError::Failed("boom".to_string()).to_string(),
            "transport failure: boom"
        );
    }

    #[test]
    fn publish_error_display() {
        assert_eq!(
            PublishError::AckTimeout(Duration::from_secs(5)).to_string(),
            "acknowledgment timed out after 5s"
        );
    }
}
