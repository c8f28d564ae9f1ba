// src/pipeline/monitor.rs

//! Wires the poll loop, delivery workers and shutdown coordinator together.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::delivery::{DeliveryStats, run_error_worker, run_output_worker};
use crate::pipeline::poll::Poller;
use crate::pipeline::shutdown::{Shutdown, watch_interrupt};
use crate::services::{KeywordMatcher, Notifier, PasteSource};

/// What the monitor did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    pub cycles: u64,
    pub output: DeliveryStats,
    pub errors: DeliveryStats,
}

/// Run the monitor until `interrupt` resolves, then drain both routes.
///
/// Keyword compilation happens before any task starts; a bad keyword is fatal.
pub async fn run_monitor<I>(
    config: &Config,
    source: Arc<dyn PasteSource>,
    notifier: Arc<dyn Notifier>,
    interrupt: I,
) -> Result<MonitorSummary>
where
    I: Future<Output = ()> + Send + 'static,
{
    let matcher = Arc::new(KeywordMatcher::compile(&config.keywords)?);
    log::info!("Watching {} keywords", matcher.len());

    let shutdown = Shutdown::new();
    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let (error_tx, error_rx) = mpsc::unbounded_channel();

    let output_worker = tokio::spawn(run_output_worker(
        output_rx,
        Arc::clone(&notifier),
        error_tx.clone(),
    ));
    let error_worker = tokio::spawn(run_error_worker(
        error_rx,
        Arc::clone(&notifier),
        config.mail_on_error,
    ));
    let coordinator = tokio::spawn(watch_interrupt(shutdown.clone(), interrupt));

    let poller = Poller::new(
        &config.scraper,
        source,
        matcher,
        output_tx,
        error_tx.clone(),
        shutdown,
    );

    // Drain both routes even if the poller died; its senders are gone either way.
    let polled = tokio::spawn(poller.run()).await;

    // The poller owned the only output sender; the output worker exits once drained.
    let output = output_worker.await;

    // Last error sender; the output worker's clone went away with it.
    drop(error_tx);
    let errors = error_worker.await;

    coordinator.abort();

    let cycles = polled.map_err(join_error)?;
    let output = output.map_err(join_error)?;
    let errors = errors.map_err(join_error)?;

    Ok(MonitorSummary {
        cycles,
        output,
        errors,
    })
}

fn join_error(e: tokio::task::JoinError) -> AppError {
    AppError::Task(e.to_string())
}
