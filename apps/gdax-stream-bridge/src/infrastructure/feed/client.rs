//! Feed Client
//!
//! Owns the connection lifecycle against the feed: open, subscription
//! handshake, liveness pings, and the receive loop that classifies frames
//! and dispatches them to the [`FeedHandler`] hooks.
//!
//! The loop is a single logical task. Each iteration performs at most one
//! bounded I/O await; cancellation is cooperative through [`FeedControl`]
//! and is observed once per iteration, never interrupting an in-flight
//! receive.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{FeedConnection, FeedHandler, FeedTransport, TransportError};
use crate::domain::message::FeedMessage;
use crate::domain::subscription::SubscriptionRequest;

/// Default feed websocket endpoint.
pub const DEFAULT_FEED_URL: &str = "wss://ws-feed.gdax.com";

/// Default bound on connection open and frame receive.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Cadence of protocol-level liveness pings.
///
/// Deliberately shorter than typical idle-timeout windows so the socket
/// stays alive through intermediary proxies; the feed's own ~1 s heartbeat
/// messages are a separate, application-level signal.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(10);

/// Payload attached to liveness pings.
pub const PING_PAYLOAD: &[u8] = b"keepalive";

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state of a feed client.
///
/// Owned exclusively by the client; hooks request a stop transition only
/// through [`FeedControl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection open.
    Disconnected,
    /// Transport connection established.
    Connected,
    /// Subscription frame sent, awaiting traffic.
    SubscriptionSent,
    /// Receive loop active.
    Running,
    /// Loop exited, connection being torn down.
    Stopping,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::SubscriptionSent => "subscription-sent",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Stop Signal
// =============================================================================

/// Cooperative stop signal shared between a client and its collaborators.
///
/// Cloning hands out another handle to the same signal. A stopped control
/// stays stopped; reconnecting means building a fresh client with a fresh
/// control (or a [`child`](Self::child) of a still-live parent).
#[derive(Debug, Clone, Default)]
pub struct FeedControl {
    cancel: CancellationToken,
}

impl FeedControl {
    /// Create a new, un-stopped control.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent; safe to call from hooks or other tasks.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Derive a control that also stops when this one does.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
        }
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        self.cancel.cancelled().await;
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by [`FeedClient::start`].
#[derive(Debug, thiserror::Error)]
pub enum FeedError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// A lifecycle method was called in the wrong state.
    #[error("invalid connection state: expected {expected}, found {found}")]
    InvalidState {
        /// State the operation requires.
        expected: ConnectionState,
        /// State the client was actually in.
        found: ConnectionState,
    },
    /// The connection handle is missing.
    #[error("connection is not open")]
    NotConnected,
    /// Opening the transport connection failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// An inbound frame was not a JSON object.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),
    /// A handler hook failed.
    #[error(transparent)]
    Handler(E),
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Connection parameters for a feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// Feed websocket URL.
    pub url: String,
    /// Bound on connection open and on each frame receive.
    pub timeout: Duration,
    /// Liveness ping cadence.
    pub ping_interval: Duration,
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            timeout: DEFAULT_RECEIVE_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }
}

// =============================================================================
// Feed Client
// =============================================================================

/// Streaming feed client.
///
/// Drives the state machine
/// `Disconnected → Connected → SubscriptionSent → Running → Stopping →
/// Disconnected` and proxies every parsed message to the handler hooks.
pub struct FeedClient<T, H>
where
    T: FeedTransport,
    H: FeedHandler,
{
    transport: T,
    handler: H,
    subscription: SubscriptionRequest,
    config: FeedClientConfig,
    control: FeedControl,
    state: ConnectionState,
    connection: Option<T::Connection>,
    pinged_at: Instant,
}

impl<T, H> FeedClient<T, H>
where
    T: FeedTransport,
    H: FeedHandler,
{
    /// Create a client with its own stop control.
    #[must_use]
    pub fn new(
        transport: T,
        handler: H,
        subscription: SubscriptionRequest,
        config: FeedClientConfig,
    ) -> Self {
        Self::with_control(transport, handler, subscription, config, FeedControl::new())
    }

    /// Create a client sharing an externally owned stop control.
    ///
    /// Use this when a collaborator (such as the publisher bridge) needs to
    /// signal a stop from inside a hook.
    #[must_use]
    pub fn with_control(
        transport: T,
        handler: H,
        subscription: SubscriptionRequest,
        config: FeedClientConfig,
        control: FeedControl,
    ) -> Self {
        Self {
            transport,
            handler,
            subscription,
            config,
            control,
            state: ConnectionState::Disconnected,
            connection: None,
            pinged_at: Instant::now(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Handle to the client's stop control.
    #[must_use]
    pub fn control(&self) -> FeedControl {
        self.control.clone()
    }

    /// Run the client until stopped or a fatal error occurs.
    ///
    /// Sequence: `on_setup`, transport open (open failures propagate
    /// directly, not through `on_connection_error`), `on_connected`,
    /// subscription handshake, then the receive loop. On every exit past
    /// `on_setup` — including a failed open — the connection (if any) is
    /// closed best-effort, `on_disconnected` fires so setup-acquired
    /// resources are released, and the state ends `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`] on transport open failure, on a malformed
    /// inbound frame, or when a hook fails (the default
    /// `on_connection_error` turns any subscribe/receive/ping failure into
    /// a hook failure).
    pub async fn start(&mut self) -> Result<(), FeedError<H::Error>> {
        if self.state != ConnectionState::Disconnected {
            return Err(FeedError::InvalidState {
                expected: ConnectionState::Disconnected,
                found: self.state,
            });
        }

        self.handler.on_setup().await.map_err(FeedError::Handler)?;

        tracing::info!(url = %self.config.url, "connecting to feed");
        match self
            .transport
            .open(&self.config.url, self.config.timeout)
            .await
        {
            Ok(connection) => {
                self.connection = Some(connection);
                self.state = ConnectionState::Connected;
            }
            Err(error) => {
                return self.shutdown(Err(FeedError::Transport(error))).await;
            }
        }

        let result = self.run_connected().await;
        self.shutdown(result).await
    }

    /// Request a stop and close any open connection best-effort.
    ///
    /// Idempotent. While `start` is running, use the [`FeedControl`]
    /// obtained from [`control`](Self::control) instead; the loop observes
    /// it after the current iteration.
    pub async fn stop(&mut self) {
        self.control.stop();
        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
            self.state = ConnectionState::Disconnected;
        }
    }

    async fn run_connected(&mut self) -> Result<(), FeedError<H::Error>> {
        self.handler
            .on_connected()
            .await
            .map_err(FeedError::Handler)?;
        self.subscribe().await?;
        self.run_loop().await
    }

    /// Send the subscription frame.
    ///
    /// Send failures route through `on_connection_error`; if the hook
    /// swallows the error the client proceeds into the receive loop anyway
    /// and lets the next receive decide the connection's fate.
    async fn subscribe(&mut self) -> Result<(), FeedError<H::Error>> {
        if self.state != ConnectionState::Connected {
            return Err(FeedError::InvalidState {
                expected: ConnectionState::Connected,
                found: self.state,
            });
        }

        let frame = self.subscription.to_frame()?;
        tracing::info!(frame = %frame, "sending subscription");

        let connection = self.connection.as_mut().ok_or(FeedError::NotConnected)?;
        match connection.send(&frame).await {
            Ok(()) => {
                self.state = ConnectionState::SubscriptionSent;
                Ok(())
            }
            Err(error) => {
                tracing::warn!(error = %error, "subscription send failed");
                self.handler
                    .on_connection_error(error)
                    .await
                    .map_err(FeedError::Handler)
            }
        }
    }

    /// The receive loop.
    ///
    /// Per iteration: ping if the cadence is due, then one bounded receive.
    /// Receive and ping errors route through `on_connection_error` and its
    /// result is the loop's terminal value.
    async fn run_loop(&mut self) -> Result<(), FeedError<H::Error>> {
        self.state = ConnectionState::Running;
        self.pinged_at = Instant::now();

        while !self.control.is_stopped() {
            let ping_due = self.pinged_at.elapsed() >= self.config.ping_interval;
            let timeout = self.config.timeout;
            let connection = self.connection.as_mut().ok_or(FeedError::NotConnected)?;

            let received = if ping_due {
                match connection.ping(PING_PAYLOAD).await {
                    Ok(()) => {
                        tracing::debug!("liveness ping sent");
                        self.pinged_at = Instant::now();
                        connection.receive(timeout).await
                    }
                    Err(error) => Err(error),
                }
            } else {
                connection.receive(timeout).await
            };

            match received {
                Ok(frame) => {
                    tracing::trace!(frame = %frame, "frame received");
                    let msg = FeedMessage::parse(&frame)?;
                    self.dispatch(&msg).await.map_err(FeedError::Handler)?;
                }
                Err(error) => {
                    tracing::warn!(error = %error, "connection error in receive loop");
                    return self
                        .handler
                        .on_connection_error(error)
                        .await
                        .map_err(FeedError::Handler);
                }
            }
        }

        Ok(())
    }

    /// Proxy one classified message to the hooks: `on_message` always,
    /// then the type-specific hook. Unknown types reach only `on_message`.
    async fn dispatch(&mut self, msg: &FeedMessage) -> Result<(), H::Error> {
        self.handler.on_message(msg).await?;
        match msg {
            FeedMessage::Heartbeat(raw) => self.handler.on_heartbeat(raw).await,
            FeedMessage::LastMatch(raw) => self.handler.on_last_match(raw).await,
            FeedMessage::Subscriptions(raw) => self.handler.on_subscriptions(raw).await,
            FeedMessage::Match(raw) => self.handler.on_match(raw).await,
            FeedMessage::Other(_) => Ok(()),
        }
    }

    /// Tear down on any exit past `on_setup`: close the connection if one
    /// is open, fire `on_disconnected`, end `Disconnected`. A hook failure
    /// here only surfaces when the run itself was clean.
    async fn shutdown(
        &mut self,
        result: Result<(), FeedError<H::Error>>,
    ) -> Result<(), FeedError<H::Error>> {
        self.state = ConnectionState::Stopping;
        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
        }
        self.state = ConnectionState::Disconnected;

        let disconnected = self.handler.on_disconnected().await;
        match (result, disconnected) {
            (Err(error), _) => Err(error),
            (Ok(()), Err(error)) => Err(FeedError::Handler(error)),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_state_display() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
        assert_eq!(
            ConnectionState::SubscriptionSent.to_string(),
            "subscription-sent"
        );
        assert_eq!(ConnectionState::Running.to_string(), "running");
    }

    #[test]
    fn control_stop_is_idempotent() {
        let control = FeedControl::new();
        assert!(!control.is_stopped());

        control.stop();
        control.stop();
        assert!(control.is_stopped());
    }

    #[test]
    fn control_clones_share_the_signal() {
        let control = FeedControl::new();
        let clone = control.clone();

        clone.stop();
        assert!(control.is_stopped());
    }

    #[test]
    fn child_control_follows_parent() {
        let parent = FeedControl::new();
        let child = parent.child();
        assert!(!child.is_stopped());

        parent.stop();
        assert!(child.is_stopped());
    }

    #[test]
    fn child_stop_does_not_affect_parent() {
        let parent = FeedControl::new();
        let child = parent.child();

        child.stop();
        assert!(child.is_stopped());
        assert!(!parent.is_stopped());
    }

    #[test]
    fn default_config_values() {
        let config = FeedClientConfig::default();
        assert_eq!(config.url, DEFAULT_FEED_URL);
        assert_eq!(config.timeout, DEFAULT_RECEIVE_TIMEOUT);
        assert_eq!(config.ping_interval, DEFAULT_PING_INTERVAL);
    }
}
