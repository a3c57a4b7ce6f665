//! chatrelayd - line-oriented chat relay daemon.
//!
//! Clients connect over TCP, pick a nickname and every line they type is
//! relayed to everyone else. Recent lines are kept in an append-only log and
//! replayed to newcomers.

mod config;
mod error;
mod handlers;
mod http;
mod metrics;
mod network;
mod state;
mod telemetry;

use chatrelay::history;
use chatrelay::signal::shutdown_signal;

use crate::config::{Config, validation};
use crate::history::{FileHistory, HistoryProvider, NoOpProvider};
use crate::network::Gateway;
use crate::state::Hub;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!(
            "Refusing to start with {} configuration error(s). See messages above.",
            errors.len()
        );
    }

    info!(
        server = %config.server.name,
        address = %config.listen.address,
        policy = ?config.delivery.policy,
        "Starting chatrelay"
    );

    // Initialize history provider
    let history: Arc<dyn HistoryProvider> = if config.history.enabled {
        let log = FileHistory::open(&config.history.path).await?;
        info!(
            path = %log.path().display(),
            replay = config.history.replay_count,
            "Chat log opened"
        );
        Arc::new(log)
    } else {
        info!("History disabled. Using NoOp provider.");
        Arc::new(NoOpProvider)
    };

    let hub = Arc::new(Hub::new(&config, history));

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port;
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        info!("Metrics initialized");

        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
    }

    let gateway = Gateway::bind(config.listen.address, Arc::clone(&hub)).await?;
    let sessions = gateway.sessions();
    let mut gateway_task = tokio::spawn(gateway.run());

    tokio::select! {
        _ = shutdown_signal() => info!("Shutdown signal received"),
        result = &mut gateway_task => {
            // The gateway only returns on its own if accepting broke down.
            hub.shutdown();
            return match result {
                Ok(r) => r,
                Err(e) => Err(e.into()),
            };
        }
    }

    hub.shutdown();
    match gateway_task.await {
        Ok(Err(e)) => warn!(error = %e, "Gateway stopped with error"),
        Err(e) => warn!(error = %e, "Gateway task failed"),
        Ok(Ok(())) => {}
    }

    let grace = config.timeouts.shutdown_grace();
    if tokio::time::timeout(grace, sessions.wait()).await.is_err() {
        warn!(
            remaining = sessions.len(),
            grace = ?grace,
            "Sessions still running after grace period"
        );
    }

    info!("Shutdown complete");
    Ok(())
}
