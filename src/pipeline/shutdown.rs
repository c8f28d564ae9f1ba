// src/pipeline/shutdown.rs

//! Shutdown coordination.
//!
//! Shutdown is cooperative and two-layered: the termination flag stops the
//! poll loop at its checkpoints, and the cancellation token aborts whatever
//! network call is in flight.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Termination flag plus ambient cancellation token, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    terminate: Arc<AtomicBool>,
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag, then cancel the token.
    ///
    /// Returns `false` if shutdown was already triggered; repeated calls have no effect.
    pub fn trigger(&self) -> bool {
        let first = !self.terminate.swap(true, Ordering::SeqCst);
        self.token.cancel();
        first
    }

    pub fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Wait for a single interrupt, then trigger shutdown.
pub async fn watch_interrupt<F>(shutdown: Shutdown, interrupt: F)
where
    F: Future<Output = ()>,
{
    interrupt.await;
    log::info!("Interrupt received, shutting down");
    shutdown.trigger();
}

/// Resolves on the first Ctrl+C.
///
/// If the signal handler cannot be installed this never resolves.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for interrupt: {e}");
        std::future::pending::<()>().await;
    }
}
