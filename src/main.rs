//! OCPP 1.6 central system entry point
//!
//! Wires the in-memory engine, schema registry, router and WebSocket
//! endpoint together. Reads configuration from CSMS_CONFIG (default
//! ./config.toml).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use gridwave_csms::config::AppConfig;
use gridwave_csms::handlers::ocpp16;
use gridwave_csms::router::pending::PendingCallRegistry;
use gridwave_csms::schema::{DirSchemaSource, SchemaRegistry};
use gridwave_csms::server::{OcppServer, ShutdownCoordinator};
use gridwave_csms::services::UnconfiguredPki;
use gridwave_csms::session::SessionManager;
use gridwave_csms::store::memory::InMemoryEngine;
use gridwave_csms::support::SystemClock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("CSMS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./config.toml"));
    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&config);
    info!(config = %config_path.display(), "starting central system");

    let engine = Arc::new(InMemoryEngine::new());
    let schemas = Arc::new(SchemaRegistry::new(DirSchemaSource::new(
        config.schemas.root.clone(),
    )));
    let sessions = Arc::new(SessionManager::new());
    let pending = Arc::new(PendingCallRegistry::new(config.ocpp.pending_call_timeout()));

    let pki = Arc::new(UnconfiguredPki);
    let router = Arc::new(ocpp16::new_router(
        sessions.clone(),
        Arc::new(SystemClock),
        engine.clone(),
        pki.clone(),
        pki.clone(),
        pki,
        config.ocpp.heartbeat_interval(),
        schemas,
        pending,
    ));

    let sweeper = router.start_expiry_sweeper(Duration::from_secs(5));

    let coordinator = ShutdownCoordinator::new();
    let server = OcppServer::new(
        config.server.address(),
        config.ws_auth.mode,
        sessions,
        router,
        engine,
    )
    .with_shutdown(coordinator.subscribe());

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        info!("shutdown requested");
        coordinator.shutdown();
    });

    let result = server.run().await;
    sweeper.abort();
    result
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    if config.logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
