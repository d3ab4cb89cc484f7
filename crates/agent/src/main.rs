//! jslwatcher - Log file tailing and forwarding agent
//!
//! # Usage
//!
//! ```bash
//! # Run with the default config path
//! jslwatcher
//!
//! # Use a custom config file
//! jslwatcher --config /path/to/config.yaml
//!
//! # Validate a config file and exit
//! jslwatcher --test --config /path/to/config.yaml
//!
//! # Run with periodic status logs
//! jslwatcher --daemon
//! ```

mod dispatcher;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loghud_config::{Config, DEFAULT_CONFIG_PATH};
use loghud_tailer::{FileTailer, TailedFileConfig};

use crate::dispatcher::Dispatcher;

/// jslwatcher - Log file tailing and forwarding agent
#[derive(Parser, Debug)]
#[command(name = "jslwatcher")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    test: bool,

    /// Run with periodic status logging
    #[arg(long)]
    daemon: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    if cli.test {
        println!("Configuration is valid");
        return Ok(());
    }

    init_logging(&config.general.log_level)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        files = config.files.len(),
        "jslwatcher starting"
    );

    run(config, cli.daemon).await
}

/// Wire the tailer and dispatcher together and run until a signal
async fn run(config: Config, daemon: bool) -> Result<()> {
    let files: Vec<TailedFileConfig> = config
        .files
        .iter()
        .map(|f| TailedFileConfig::new(&f.path, f.format.as_str(), f.paths.iter().cloned()))
        .collect();

    let (tailer, records) = FileTailer::new(files, config.general.buffer_size)
        .context("failed to create file tailer")?;
    let tailer_metrics = tailer.metrics();

    let dispatcher = Dispatcher::new(records);
    let dispatcher_metrics = dispatcher.metrics();

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let tailer_handle = tokio::spawn(tailer.run(cancel.clone()));
    let dispatcher_handle = tokio::spawn(dispatcher.run(cancel.clone()));

    if daemon {
        tokio::spawn(status::run(
            Arc::clone(&tailer_metrics),
            Arc::clone(&dispatcher_metrics),
            cancel.clone(),
        ));
    }

    info!("jslwatcher started");
    cancel.cancelled().await;
    info!("shutting down");

    let _ = tailer_handle.await;
    let _ = dispatcher_handle.await;

    let t = tailer_metrics.snapshot();
    info!(
        lines_emitted = t.lines_emitted,
        lines_dropped = t.lines_dropped,
        "jslwatcher stopped"
    );
    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    Ok(())
}

/// Cancel the root token on ctrl-c or SIGTERM
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(term) => term,
                Err(_) => {
                    let _ = ctrl_c.await;
                    cancel.cancel();
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => {}
                _ = term.recv() => {}
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }

        info!("shutdown signal received");
        cancel.cancel();
    });
}
