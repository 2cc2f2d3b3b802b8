//! Subscription Request
//!
//! The subscription handshake payload: which products and channels the
//! client wants from the feed. The heartbeat channel is always added so
//! liveness can be validated independently of whatever business channels
//! the caller asked for.

use serde::Serialize;

/// Channel implicitly added to every subscription.
pub const HEARTBEAT_CHANNEL: &str = "heartbeat";

/// Errors raised when a subscription request is constructed from bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    /// No product identifiers were supplied.
    #[error("no products configured")]
    NoProducts,
    /// No channel identifiers were supplied.
    #[error("no channels configured")]
    NoChannels,
}

/// A validated, immutable subscription request.
///
/// Product and channel lists are deduplicated (first occurrence wins) and
/// the channel list always contains [`HEARTBEAT_CHANNEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    products: Vec<String>,
    channels: Vec<String>,
}

/// Outbound subscribe frame, serialized bit-exactly as the feed expects.
#[derive(Serialize)]
struct SubscribeFrame<'a> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    product_ids: &'a [String],
    channels: &'a [String],
}

impl SubscriptionRequest {
    /// Build a request from the configured product and channel lists.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::NoProducts`] or
    /// [`SubscriptionError::NoChannels`] when the corresponding input is
    /// empty.
    pub fn new<P, C>(products: P, channels: C) -> Result<Self, SubscriptionError>
    where
        P: IntoIterator<Item = String>,
        C: IntoIterator<Item = String>,
    {
        let products = dedup(products);
        if products.is_empty() {
            return Err(SubscriptionError::NoProducts);
        }

        let mut channels = dedup(channels);
        if channels.is_empty() {
            return Err(SubscriptionError::NoChannels);
        }
        if !channels.iter().any(|c| c == HEARTBEAT_CHANNEL) {
            channels.push(HEARTBEAT_CHANNEL.to_string());
        }

        Ok(Self { products, channels })
    }

    /// Deduplicated product identifiers.
    #[must_use]
    pub fn products(&self) -> &[String] {
        &self.products
    }

    /// Deduplicated channel identifiers, heartbeat included.
    #[must_use]
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Serialize the subscribe frame sent on the wire.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if serialization fails.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&SubscribeFrame {
            msg_type: "subscribe",
            product_ids: &self.products,
            channels: &self.channels,
        })
    }
}

/// Deduplicate preserving first-occurrence order.
fn dedup<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}
