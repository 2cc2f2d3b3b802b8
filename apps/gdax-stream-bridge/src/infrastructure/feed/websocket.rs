//! WebSocket Transport Adapter
//!
//! Thin tokio-tungstenite implementation of the feed transport port.
//! Text frames map to receives, server pings are answered inline, and
//! close/EOF surface as [`TransportError::Closed`]; every other frame type
//! carries no feed data and is skipped.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::application::ports::{FeedConnection, FeedTransport, TransportError};

/// Transport backed by tokio-tungstenite.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Create a new transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// An open websocket connection.
pub struct WebSocketFeedConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FeedTransport for WebSocketTransport {
    type Connection = WebSocketFeedConnection;

    async fn open(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Self::Connection, TransportError> {
        let connect = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?;
        let (stream, _response) = connect.map_err(|e| map_error(&e))?;
        Ok(WebSocketFeedConnection { stream })
    }
}

#[async_trait]
impl FeedConnection for WebSocketFeedConnection {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(frame.to_string().into()))
            .await
            .map_err(|e| map_error(&e))
    }

    async fn receive(&mut self, timeout: Duration) -> Result<String, TransportError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.stream.next())
                .await
                .map_err(|_| TransportError::Timeout(timeout))?;

            match frame {
                None => return Err(TransportError::Closed),
                Some(Err(e)) => return Err(map_error(&e)),
                Some(Ok(Message::Text(text))) => return Ok(text.to_string()),
                Some(Ok(Message::Ping(payload))) => {
                    self.stream
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| map_error(&e))?;
                }
                Some(Ok(Message::Close(_))) => return Err(TransportError::Closed),
                Some(Ok(_)) => {}
            }
        }
    }

    async fn ping(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.stream
            .send(Message::Ping(payload.to_vec().into()))
            .await
            .map_err(|e| map_error(&e))
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Map tungstenite errors onto the transport port's taxonomy.
fn map_error(error: &tokio_tungstenite::tungstenite::Error) -> TransportError {
    use tokio_tungstenite::tungstenite::Error;
    match error {
        Error::ConnectionClosed | Error::AlreadyClosed => TransportError::Closed,
        other => TransportError::Failed(other.to_string()),
    }
}
