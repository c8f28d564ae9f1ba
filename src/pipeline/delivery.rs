// src/pipeline/delivery.rs

//! Delivery workers draining the output and error routes.
//!
//! Both run until their route is closed and empty. A failed paste
//! notification is fed back into the error route; a failed error escalation
//! is only logged so errors never loop.

use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::{OperationalError, Stage};
use crate::models::MatchedPaste;
use crate::services::Notifier;

/// Counters reported by a drained worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub received: usize,
    pub failed: usize,
}

/// Send a notification for every matched paste.
pub async fn run_output_worker(
    mut pastes: UnboundedReceiver<MatchedPaste>,
    notifier: Arc<dyn Notifier>,
    errors: UnboundedSender<OperationalError>,
) -> DeliveryStats {
    let mut stats = DeliveryStats::default();

    while let Some(paste) = pastes.recv().await {
        stats.received += 1;
        log::debug!("Found paste {}:\n{}", paste.paste.key, paste.format_message());

        if let Err(e) = notifier.send_paste(&paste).await {
            stats.failed += 1;
            let error = OperationalError::new(
                Stage::Delivery,
                format!("paste {}: {e}", paste.paste.key),
            );
            if let Err(e) = errors.send(error) {
                log::error!("Error route closed: {}", e.0);
            }
        }
    }

    log::info!(
        "Output worker drained ({} received, {} failed)",
        stats.received,
        stats.failed
    );
    stats
}

/// Log every operational error, escalating it when `escalate` is set.
pub async fn run_error_worker(
    mut errors: UnboundedReceiver<OperationalError>,
    notifier: Arc<dyn Notifier>,
    escalate: bool,
) -> DeliveryStats {
    let mut stats = DeliveryStats::default();

    while let Some(error) = errors.recv().await {
        stats.received += 1;
        log::error!("{error}");

        if escalate {
            if let Err(e) = notifier.send_error(&error).await {
                stats.failed += 1;
                log::error!("Failed to escalate error: {e}");
            }
        }
    }

    log::info!(
        "Error worker drained ({} received, {} escalations failed)",
        stats.received,
        stats.failed
    );
    stats
}
