//! Shared test doubles: a scripted feed transport and a recording broker.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use gdax_stream_bridge::{
    BrokerConnector, BrokerPublisher, FeedConnection, FeedControl, FeedHandler, FeedMessage,
    FeedTransport, PublishAck, PublishError, RawMessage, TransportError,
};

// =============================================================================
// Scripted Transport
// =============================================================================

/// One step of a scripted connection.
#[derive(Debug, Clone)]
pub enum Step {
    /// `receive` returns this frame.
    Frame(String),
    /// Sleep before serving the next step (drives the paused clock).
    Delay(Duration),
    /// `receive` returns this error.
    Error(TransportError),
}

/// Everything a scripted connection observed, in order.
#[derive(Debug, Default)]
pub struct TransportLog {
    pub opens: usize,
    pub sent: Vec<String>,
    pub pings: usize,
    pub events: Vec<String>,
}

/// Transport serving a single scripted connection.
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Step>>>,
    log: Arc<Mutex<TransportLog>>,
    fail_open: Option<TransportError>,
    fail_send: Option<TransportError>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into())),
            log: Arc::new(Mutex::new(TransportLog::default())),
            fail_open: None,
            fail_send: None,
        }
    }

    pub fn failing_open(mut self, error: TransportError) -> Self {
        self.fail_open = Some(error);
        self
    }

    pub fn failing_send(mut self, error: TransportError) -> Self {
        self.fail_send = Some(error);
        self
    }

    pub fn log(&self) -> Arc<Mutex<TransportLog>> {
        Arc::clone(&self.log)
    }
}

/// Connection handed out by [`ScriptedTransport`].
pub struct ScriptedConnection {
    script: Arc<Mutex<VecDeque<Step>>>,
    log: Arc<Mutex<TransportLog>>,
    fail_send: Option<TransportError>,
}

#[async_trait]
impl FeedTransport for ScriptedTransport {
    type Connection = ScriptedConnection;

    async fn open(
        &self,
        _url: &str,
        _timeout: Duration,
    ) -> Result<Self::Connection, TransportError> {
        self.log.lock().unwrap().opens += 1;
        if let Some(error) = &self.fail_open {
            return Err(error.clone());
        }
        Ok(ScriptedConnection {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
            fail_send: self.fail_send.clone(),
        })
    }
}

#[async_trait]
impl FeedConnection for ScriptedConnection {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        if let Some(error) = &self.fail_send {
            self.log.lock().unwrap().events.push("send-error".to_string());
            return Err(error.clone());
        }
        let mut log = self.log.lock().unwrap();
        log.sent.push(frame.to_string());
        log.events.push("send".to_string());
        Ok(())
    }

    async fn receive(&mut self, _timeout: Duration) -> Result<String, TransportError> {
        loop {
            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(Step::Frame(frame)) => {
                    self.log.lock().unwrap().events.push("recv".to_string());
                    return Ok(frame);
                }
                Some(Step::Delay(duration)) => tokio::time::sleep(duration).await,
                Some(Step::Error(error)) => return Err(error),
                None => return Err(TransportError::Closed),
            }
        }
    }

    async fn ping(&mut self, _payload: &[u8]) -> Result<(), TransportError> {
        let mut log = self.log.lock().unwrap();
        log.pings += 1;
        log.events.push("ping".to_string());
        Ok(())
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().events.push("close".to_string());
    }
}

// =============================================================================
// Recording Handler
// =============================================================================

/// Handler that records every hook invocation.
#[derive(Default)]
pub struct RecordingHandler {
    pub events: Arc<Mutex<Vec<String>>>,
    /// Stop this control when a message of the given type arrives.
    pub stop_on: Option<(String, FeedControl)>,
    /// Swallow connection errors instead of re-raising.
    pub swallow_connection_errors: bool,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.events)
    }

    fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

#[async_trait]
impl FeedHandler for RecordingHandler {
    type Error = TransportError;

    async fn on_setup(&mut self) -> Result<(), Self::Error> {
        self.push("setup");
        Ok(())
    }

    async fn on_connected(&mut self) -> Result<(), Self::Error> {
        self.push("connected");
        Ok(())
    }

    async fn on_disconnected(&mut self) -> Result<(), Self::Error> {
        self.push("disconnected");
        Ok(())
    }

    async fn on_message(&mut self, msg: &FeedMessage) -> Result<(), Self::Error> {
        let msg_type = msg.message_type().unwrap_or("none").to_string();
        self.push(format!("message:{msg_type}"));
        if let Some((stop_type, control)) = &self.stop_on {
            if *stop_type == msg_type {
                control.stop();
            }
        }
        Ok(())
    }

    async fn on_heartbeat(&mut self, _msg: &RawMessage) -> Result<(), Self::Error> {
        self.push("heartbeat");
        Ok(())
    }

    async fn on_last_match(&mut self, _msg: &RawMessage) -> Result<(), Self::Error> {
        self.push("last_match");
        Ok(())
    }

    async fn on_subscriptions(&mut self, _msg: &RawMessage) -> Result<(), Self::Error> {
        self.push("subscriptions");
        Ok(())
    }

    async fn on_match(&mut self, _msg: &RawMessage) -> Result<(), Self::Error> {
        self.push("match");
        Ok(())
    }

    async fn on_connection_error(&mut self, error: TransportError) -> Result<(), Self::Error> {
        self.push("connection_error");
        if self.swallow_connection_errors {
            Ok(())
        } else {
            Err(error)
        }
    }
}

// =============================================================================
// Recording Broker
// =============================================================================

/// How the recording publisher behaves on publish.
#[derive(Debug, Clone)]
pub enum PublishMode {
    Succeed,
    Fail(PublishError),
    /// Never resolve, for acknowledgment-timeout tests.
    Hang,
}

/// Everything the broker observed.
#[derive(Debug, Default)]
pub struct BrokerLog {
    pub records: Vec<(String, String, Value)>,
    pub closed: bool,
}

/// Connector producing recording publishers.
pub struct RecordingConnector {
    log: Arc<Mutex<BrokerLog>>,
    mode: PublishMode,
    connect_error: Option<PublishError>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(BrokerLog::default())),
            mode: PublishMode::Succeed,
            connect_error: None,
        }
    }

    pub fn with_mode(mut self, mode: PublishMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn failing_connect(mut self, error: PublishError) -> Self {
        self.connect_error = Some(error);
        self
    }

    pub fn log(&self) -> Arc<Mutex<BrokerLog>> {
        Arc::clone(&self.log)
    }
}

/// Publisher recording every record it is given.
pub struct RecordingPublisher {
    log: Arc<Mutex<BrokerLog>>,
    mode: PublishMode,
    offset: i64,
}

#[async_trait]
impl BrokerConnector for RecordingConnector {
    type Publisher = RecordingPublisher;

    async fn connect(&self) -> Result<Self::Publisher, PublishError> {
        if let Some(error) = &self.connect_error {
            return Err(error.clone());
        }
        Ok(RecordingPublisher {
            log: Arc::clone(&self.log),
            mode: self.mode.clone(),
            offset: 0,
        })
    }
}

#[async_trait]
impl BrokerPublisher for RecordingPublisher {
    async fn publish(
        &mut self,
        topic: &str,
        key: &str,
        value: &Value,
    ) -> Result<PublishAck, PublishError> {
        match &self.mode {
            PublishMode::Succeed => {
                self.log
                    .lock()
                    .unwrap()
                    .records
                    .push((topic.to_string(), key.to_string(), value.clone()));
                let offset = self.offset;
                self.offset += 1;
                Ok(PublishAck {
                    partition: 0,
                    offset,
                })
            }
            PublishMode::Fail(error) => Err(error.clone()),
            PublishMode::Hang => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().closed = true;
    }
}
