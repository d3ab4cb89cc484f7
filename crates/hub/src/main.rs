//! loghud-hub - Channel hub binary
//!
//! ```bash
//! PORT=8080 NODE_ID=node-a CLUSTER_KEY=... PEERS=https://hub-b.example.com loghud-hub
//! ```

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loghud_hub::{serve, HubConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = HubConfig::from_env()?;
    let cancel = CancellationToken::new();

    spawn_signal_handler(cancel.clone());

    serve(config, cancel).await?;
    info!("shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

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
