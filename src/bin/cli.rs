//! pastewatch CLI
//!
//! Polls the paste list, alerts on watched keywords, and shuts down cleanly
//! on Ctrl+C.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pastewatch::{
    error::Result,
    models::Config,
    pipeline,
    services::{PastebinClient, WebhookNotifier},
    utils::http,
};

/// pastewatch - Paste Keyword Monitor
#[derive(Parser, Debug)]
#[command(
    name = "pastewatch",
    version,
    about = "Alerts on watched keywords in newly published pastes"
)]
struct Cli {
    /// Print debug output
    #[arg(short, long)]
    debug: bool,

    /// Config file to use
    #[arg(short, long)]
    config: PathBuf,
}

/// Initialize logging based on the debug flag.
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)?;
    config.validate()?;
    Ok(config)
}

async fn run(config: Config) -> Result<()> {
    let client = http::create_async_client(&config.scraper)?;
    let source = Arc::new(PastebinClient::with_client(client.clone(), &config.scraper)?);
    let notifier = Arc::new(WebhookNotifier::new(client, &config.notify)?);

    let summary = pipeline::run_monitor(&config, source, notifier, pipeline::ctrl_c()).await?;

    log::info!(
        "Stopped after {} cycles: {} matches delivered, {} errors",
        summary.cycles,
        summary.output.received - summary.output.failed,
        summary.errors.received
    );
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Error loading config file {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    log::info!("Starting paste monitor");

    if let Err(e) = run(config).await {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
