//! Publisher Bridge
//!
//! A [`FeedHandler`] that forwards classified feed messages to a durable
//! broker. Records are keyed by `product_id` so everything for one
//! instrument lands on one partition, preserving per-instrument order;
//! cross-instrument ordering is neither guaranteed nor required.
//!
//! A publish failure is fatal: the bridge signals stop and re-raises
//! rather than retrying, since silent partial publishing could violate the
//! per-product ordering contract. Retry is the job of whatever supervises
//! the process.

use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{
    BrokerConnector, BrokerPublisher, FeedHandler, PublishError, TransportError,
};
use crate::domain::message::{FeedMessage, RawMessage};
use crate::domain::routing::RoutingPolicy;
use crate::infrastructure::feed::client::FeedControl;

/// Default bound on the broker acknowledgment wait.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced by the publisher bridge hooks.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A feed transport error re-raised by the default connection hook.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Publishing to the broker failed or timed out.
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),
    /// A forwarded message carried no `product_id` to key by.
    #[error("message has no product_id to use as partition key")]
    MissingPartitionKey,
    /// A message arrived before the broker publisher was connected.
    #[error("broker publisher is not connected")]
    PublisherNotReady,
}

impl BridgeError {
    /// Whether this error came from the feed side rather than the broker.
    ///
    /// Supervisors use this to classify which failures warrant a reconnect.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Forwards feed messages to a broker topic.
///
/// Lifecycle: the broker publisher is connected in `on_setup`, before the
/// feed transport opens, and closed in `on_disconnected`.
pub struct PublisherBridge<C>
where
    C: BrokerConnector,
{
    topic: String,
    policy: RoutingPolicy,
    ack_timeout: Duration,
    connector: C,
    publisher: Option<C::Publisher>,
    control: FeedControl,
}

impl<C> PublisherBridge<C>
where
    C: BrokerConnector,
{
    /// Create a bridge publishing to `topic` under `policy`.
    ///
    /// `control` must be the stop control shared with the feed client so a
    /// publish failure can halt the receive loop.
    #[must_use]
    pub fn new(topic: String, policy: RoutingPolicy, connector: C, control: FeedControl) -> Self {
        Self {
            topic,
            policy,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            connector,
            publisher: None,
            control,
        }
    }

    /// Override the acknowledgment wait bound.
    #[must_use]
    pub const fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    /// Topic records are published to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Strip internal fields, key by product, publish, and wait (bounded)
    /// for the acknowledgment.
    async fn forward(&mut self, msg: &RawMessage) -> Result<(), BridgeError> {
        let key = msg
            .product_id()
            .ok_or(BridgeError::MissingPartitionKey)?
            .to_string();
        let value = msg.sanitized();

        let publisher = self
            .publisher
            .as_mut()
            .ok_or(BridgeError::PublisherNotReady)?;

        let ack = tokio::time::timeout(
            self.ack_timeout,
            publisher.publish(&self.topic, &key, &value),
        )
        .await
        .map_err(|_| PublishError::AckTimeout(self.ack_timeout))??;

        tracing::debug!(
            topic = %self.topic,
            key = %key,
            partition = ack.partition,
            offset = ack.offset,
            "record published"
        );
        Ok(())
    }
}

#[async_trait]
impl<C> FeedHandler for PublisherBridge<C>
where
    C: BrokerConnector + Send,
    C::Publisher: Send,
{
    type Error = BridgeError;

    /// Connect the broker publisher before the feed transport opens;
    /// broker readiness is a precondition for accepting feed traffic.
    async fn on_setup(&mut self) -> Result<(), BridgeError> {
        let publisher = self.connector.connect().await?;
        self.publisher = Some(publisher);
        tracing::info!(topic = %self.topic, "broker publisher connected");
        Ok(())
    }

    async fn on_disconnected(&mut self) -> Result<(), BridgeError> {
        if let Some(mut publisher) = self.publisher.take() {
            publisher.close().await;
            tracing::info!("broker publisher closed");
        }
        Ok(())
    }

    /// Apply the routing policy; on publish failure, signal stop once and
    /// re-raise.
    async fn on_message(&mut self, msg: &FeedMessage) -> Result<(), BridgeError> {
        if !self.policy.should_forward(msg) {
            return Ok(());
        }

        match self.forward(msg.raw()).await {
            Ok(()) => Ok(()),
            Err(error) => {
                tracing::error!(error = %error, "publish failed, stopping feed client");
                self.control.stop();
                Err(error)
            }
        }
    }
}
