//! Feed Message Model
//!
//! Inbound feed frames are loosely-typed JSON objects carrying a `type`
//! discriminator. Known types get their own variant so dispatch stays
//! exhaustive; everything else (including frames with no `type` at all)
//! lands in the `Other` catch-all rather than failing, keeping the client
//! forward-compatible with new feed message types.

use serde_json::{Map, Value};

/// Discriminator value for heartbeat messages.
pub const TYPE_HEARTBEAT: &str = "heartbeat";
/// Discriminator value for last-match messages.
pub const TYPE_LAST_MATCH: &str = "last_match";
/// Discriminator value for subscription confirmations.
pub const TYPE_SUBSCRIPTIONS: &str = "subscriptions";
/// Discriminator value for trade executions.
pub const TYPE_MATCH: &str = "match";

/// Order-book internal identifiers stripped before forwarding downstream.
pub const STRIPPED_FIELDS: [&str; 2] = ["maker_order_id", "taker_order_id"];

/// A raw feed message: a string-keyed JSON object.
///
/// Field access is by name; no schema is enforced beyond the object shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    fields: Map<String, Value>,
}

impl RawMessage {
    /// Wrap a JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The `type` discriminator, if present and a string.
    #[must_use]
    pub fn message_type(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    /// The `product_id` field, if present and a string.
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        self.fields.get("product_id").and_then(Value::as_str)
    }

    /// Look up an arbitrary field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Copy of the message with order-book internal identifiers removed,
    /// ready to forward downstream.
    #[must_use]
    pub fn sanitized(&self) -> Value {
        let mut fields = self.fields.clone();
        for key in STRIPPED_FIELDS {
            fields.remove(key);
        }
        Value::Object(fields)
    }

}

/// A classified inbound feed message.
///
/// Classification is by the `type` field only; every variant carries the
/// full raw mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// Periodic liveness message from the feed (`type: "heartbeat"`).
    Heartbeat(RawMessage),
    /// Last trade snapshot sent after subscribing (`type: "last_match"`).
    LastMatch(RawMessage),
    /// Subscription confirmation (`type: "subscriptions"`).
    Subscriptions(RawMessage),
    /// Trade execution event (`type: "match"`).
    Match(RawMessage),
    /// Any other (or missing) message type, carried untouched.
    Other(RawMessage),
}

impl FeedMessage {
    /// Parse a text frame into a classified message.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the frame is not a JSON object.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_str(text)?;
        Ok(Self::from_fields(fields))
    }

    /// Classify an already-parsed JSON object.
    #[must_use]
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let raw = RawMessage::new(fields);
        match raw.message_type() {
            Some(TYPE_HEARTBEAT) => Self::Heartbeat(raw),
            Some(TYPE_LAST_MATCH) => Self::LastMatch(raw),
            Some(TYPE_SUBSCRIPTIONS) => Self::Subscriptions(raw),
            Some(TYPE_MATCH) => Self::Match(raw),
            _ => Self::Other(raw),
        }
    }

    /// The raw mapping behind any variant.
    #[must_use]
    pub const fn raw(&self) -> &RawMessage {
        match self {
            Self::Heartbeat(raw)
            | Self::LastMatch(raw)
            | Self::Subscriptions(raw)
            | Self::Match(raw)
            | Self::Other(raw) => raw,
        }
    }

    /// The `type` discriminator of the underlying message.
    #[must_use]
    pub fn message_type(&self) -> Option<&str> {
        self.raw().message_type()
    }
}
