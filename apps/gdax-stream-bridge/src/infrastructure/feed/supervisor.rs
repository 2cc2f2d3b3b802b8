//! Feed Supervisor
//!
//! Restarts a feed client after recoverable failures, with backoff from
//! [`ReconnectPolicy`](super::reconnect::ReconnectPolicy). The client
//! itself treats connection errors as fatal; supervision is the layer that
//! turns them into reconnects.
//!
//! Each attempt gets a fresh client (and a child stop control), because a
//! stopped control stays stopped and a used client ends `Disconnected`.

use crate::application::ports::{FeedHandler, FeedTransport};
use crate::infrastructure::feed::client::{FeedClient, FeedControl, FeedError};
use crate::infrastructure::feed::reconnect::{ReconnectConfig, ReconnectPolicy};

/// Run a feed client under supervision until it stops cleanly, fails
/// unrecoverably, or exhausts the reconnect policy.
///
/// `factory` builds a fresh client per attempt from the child control it is
/// given; `is_recoverable` classifies which errors warrant a restart.
/// Signalling `control` ends supervision at the next opportunity (between
/// attempts or during a backoff delay; a running attempt observes its child
/// control cooperatively).
///
/// # Errors
///
/// Returns the first unrecoverable error, or the last recoverable one once
/// the policy allows no further attempts.
pub async fn run_supervised<T, H, F, R>(
    control: &FeedControl,
    mut factory: F,
    config: ReconnectConfig,
    mut is_recoverable: R,
) -> Result<(), FeedError<H::Error>>
where
    T: FeedTransport,
    H: FeedHandler,
    F: FnMut(FeedControl) -> FeedClient<T, H>,
    R: FnMut(&FeedError<H::Error>) -> bool,
{
    let mut policy = ReconnectPolicy::new(config);

    loop {
        if control.is_stopped() {
            return Ok(());
        }

        let mut client = factory(control.child());
        match client.start().await {
            Ok(()) => {
                tracing::info!("feed client stopped cleanly");
                return Ok(());
            }
            Err(error) if is_recoverable(&error) => {
                let Some(delay) = policy.next_delay() else {
                    tracing::error!(error = %error, "reconnect attempts exhausted");
                    return Err(error);
                };
                tracing::warn!(
                    error = %error,
                    attempt = policy.attempt_count(),
                    delay_ms = delay.as_millis(),
                    "feed run failed, reconnecting"
                );
                tokio::select! {
                    () = control.stopped() => return Ok(()),
                    () = tokio::time::sleep(delay) => {}
                }
            }
            Err(error) => return Err(error),
        }
    }
}
