//! Feed infrastructure: client state machine, websocket transport adapter,
//! and reconnect supervision.

pub mod client;
pub mod reconnect;
pub mod supervisor;
pub mod websocket;

pub use client::{
    ConnectionState, DEFAULT_FEED_URL, DEFAULT_PING_INTERVAL, DEFAULT_RECEIVE_TIMEOUT, FeedClient,
    FeedClientConfig, FeedControl, FeedError,
};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use supervisor::run_supervised;
pub use websocket::{WebSocketFeedConnection, WebSocketTransport};
