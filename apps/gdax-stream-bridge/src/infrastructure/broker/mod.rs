//! Broker-port adapters bundled with the bridge.

pub mod console;

pub use console::{ConsoleConnector, ConsolePublisher};
