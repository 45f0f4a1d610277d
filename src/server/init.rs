//! Server initialization and main run loop

use super::config::AppConfig;
use super::loader::load_config;
use super::providers::resolve_llm_provider;
use anyhow::{Context, Result};
use plantworks_core::{Coordinator, MemoryStore, SessionStore};
use plantworks_llm::LlmProvider;
use plantworks_tools::{register_plant_tools, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Build the coordinator from configuration
///
/// Registers every plant tool, then wires the tools, the model and an
/// in-memory session store into a coordinator.
pub fn build_coordinator(config: &AppConfig, llm: Arc<dyn LlmProvider>) -> Result<Arc<Coordinator>> {
    let mut registry = ToolRegistry::new(config.tools.clone());
    register_plant_tools(&mut registry, &config.credentials)
        .context("Failed to register plant tools")?;
    debug!(
        tools = registry.len(),
        live = config.tools.live_enabled,
        credentials = ?config.credentials,
        "Tool registry ready"
    );

    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let coordinator = Coordinator::new(config.coordinator.clone(), Arc::new(registry), llm, store)
        .context("Failed to create coordinator")?;
    Ok(Arc::new(coordinator))
}

/// Load configuration and build the coordinator
pub fn init_coordinator() -> Result<(AppConfig, Arc<Coordinator>)> {
    let config = load_config().context("Failed to load configuration")?;
    info!("Configuration loaded");

    let llm = resolve_llm_provider(&config.llm)?;
    let coordinator = build_coordinator(&config, llm)?;
    Ok((config, coordinator))
}

/// Run the server
///
/// `host` and `port` override the configured listen address.
pub async fn run(host: Option<String>, port: Option<u16>) -> Result<()> {
    info!("Starting Plantworks v{}", env!("CARGO_PKG_VERSION"));

    let (mut config, coordinator) = init_coordinator()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let app = crate::api::router(
        coordinator,
        &config.app_name,
        Duration::from_secs(config.server.turn_timeout_secs),
    );

    let addr = config.server.socket_addr()?;
    info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Plantworks shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
