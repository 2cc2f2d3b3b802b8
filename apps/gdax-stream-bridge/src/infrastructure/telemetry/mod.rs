//! Tracing Initialization
//!
//! Structured logging via `tracing-subscriber`: an `EnvFilter` honoring
//! `RUST_LOG` on top of a crate-level info default, with a compact fmt
//! layer.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Call once at startup; later calls are ignored (the global subscriber
/// can only be installed once).
#[allow(clippy::expect_used)]
pub fn init() {
    let env_filter = EnvFilter::from_default_env().add_directive(
        "gdax_stream_bridge=info"
            .parse()
            .expect("static directive 'gdax_stream_bridge=info' is valid"),
    );

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_reentrant() {
        init();
        init();
    }
}
