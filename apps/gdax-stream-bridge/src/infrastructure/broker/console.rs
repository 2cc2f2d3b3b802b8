//! Console Broker Sink
//!
//! Publish-port adapter that writes records to stdout as
//! `topic<TAB>key<TAB>json` lines, one per publish, acknowledging with a
//! monotonically increasing offset. Useful for local runs and for piping
//! into a broker's console producer; production deployments plug their own
//! adapter into the same port.

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncWriteExt, Stdout};

use crate::application::ports::{BrokerConnector, BrokerPublisher, PublishAck, PublishError};

/// Connector producing console publishers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleConnector;

impl ConsoleConnector {
    /// Create a new connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Publisher writing tab-separated records to stdout.
pub struct ConsolePublisher {
    out: Stdout,
    offset: i64,
}

#[async_trait]
impl BrokerConnector for ConsoleConnector {
    type Publisher = ConsolePublisher;

    async fn connect(&self) -> Result<Self::Publisher, PublishError> {
        Ok(ConsolePublisher {
            out: tokio::io::stdout(),
            offset: 0,
        })
    }
}

#[async_trait]
impl BrokerPublisher for ConsolePublisher {
    async fn publish(
        &mut self,
        topic: &str,
        key: &str,
        value: &Value,
    ) -> Result<PublishAck, PublishError> {
        let line = format!("{topic}\t{key}\t{value}\n");
        self.out
            .write_all(line.as_bytes())
            .await
            .map_err(|e| PublishError::Failed(e.to_string()))?;

        let offset = self.offset;
        self.offset += 1;
        Ok(PublishAck {
            partition: 0,
            offset,
        })
    }

    async fn close(&mut self) {
        let _ = self.out.flush().await;
    }
}
