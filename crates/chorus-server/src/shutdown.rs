//! Server shutdown: one `CancellationToken` shared by the listener and the
//! hub, plus reaping of their tasks.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A background task the server owns, labelled for shutdown logs.
pub type NamedTask = (&'static str, JoinHandle<()>);

/// Owns the server-wide cancellation token.
///
/// Cancelling it stops the HTTP listener from accepting and makes the hub
/// drop every peer, which closes their queues and sends each client a close
/// frame.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a coordinator with a fresh token.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clone of the token, for the listener and the hub.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel the token. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel, then give `tasks` until `grace` elapses to finish.
    ///
    /// Tasks still running at the deadline are aborted. Returns how many
    /// were aborted.
    pub async fn drain(&self, mut tasks: Vec<NamedTask>, grace: Duration) -> usize {
        self.cancel();
        info!(
            tasks = tasks.len(),
            grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
            "draining server tasks"
        );

        let deadline = Instant::now() + grace;
        let mut aborted = 0;
        for (name, handle) in &mut tasks {
            match tokio::time::timeout_at(deadline, &mut *handle).await {
                Ok(Ok(())) => debug!(task = *name, "task stopped"),
                Ok(Err(e)) => warn!(task = *name, error = %e, "task ended abnormally"),
                Err(_) => {
                    handle.abort();
                    aborted += 1;
                    warn!(task = *name, "task still running at shutdown deadline, aborted");
                }
            }
        }
        aborted
    }
}
