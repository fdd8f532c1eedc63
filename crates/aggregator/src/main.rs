//! Aggregator service entry point.
//!
//! Startup order mirrors §4.6 of the design: open the store, rehydrate
//! stats, construct the queue, start the Consumer, then bind the
//! listener. Shutdown reverses it: stop accepting requests, let the
//! Consumer drain within a bounded deadline, exit.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use aggregator_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    aggregator_common::init_tracing();

    info!("starting aggregator");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        bind = %config.bind_addr(),
        queue_capacity = config.queue_capacity,
        "configuration loaded"
    );

    let (app, consumer) = aggregator::build(config.queue_capacity)
        .await
        .context("failed to initialize store and stats")?;

    let consumer_handle = tokio::spawn(consumer.run());

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    info!(addr = %config.bind_addr(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("http listener closed, draining consumer");

    let drain_deadline = Duration::from_secs(config.shutdown_drain_secs);
    if tokio::time::timeout(drain_deadline, consumer_handle).await.is_err() {
        warn!(
            "consumer did not finish draining within {:?}, exiting anyway",
            drain_deadline
        );
    }

    info!("aggregator stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("received Ctrl+C, shutting down"),
        _ = terminate => warn!("received terminate signal, shutting down"),
    }
}
