//! Retrying connect loop.
//!
//! The engine opens its debug port some time after launch, so the first
//! attempts are usually refused. Transport failures are swallowed and the
//! attempt repeated immediately until the deadline passes.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::wire::{WireConnection, WireConnector};
use crate::{AppError, Result};

/// Connect to `host:port`, retrying transport failures for up to `timeout`.
///
/// The deadline is checked between attempts, so a failing call returns no
/// earlier than `timeout` and no later than `timeout` plus one attempt.
///
/// # Errors
///
/// - `AppError::Timeout` when no attempt succeeded before the deadline.
/// - Any non-transport error from the connector, returned immediately.
pub async fn connect_with_retry(
    connector: &dyn WireConnector,
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<WireConnection> {
    let started = Instant::now();
    let mut attempts: u32 = 0;

    while started.elapsed() < timeout {
        attempts += 1;
        match connector.connect(host, port).await {
            Ok(connection) => {
                info!(host, port, attempts, "connected to debuggee");
                return Ok(connection);
            }
            Err(AppError::Transport(msg)) => {
                debug!(host, port, attempts, error = %msg, "connect attempt failed, retrying");
                tokio::task::yield_now().await;
            }
            Err(err) => return Err(err),
        }
    }

    Err(AppError::Timeout(format!(
        "no debuggee at {host}:{port} after {attempts} attempt(s) in {}ms",
        timeout.as_millis()
    )))
}
