//! DataGov Pipeline server
//!
//! Binds a governance client to the configured store and exposes the
//! single-file and directory entry points over HTTP.

use datagov_pipeline::config::Settings;
use datagov_pipeline::engine::ImputerConfig;
use datagov_pipeline::pipeline::{GovernanceClient, LogNarrator};
use datagov_pipeline::routes::create_router;
use datagov_pipeline::state::AppState;
use datagov_pipeline::storage::FsStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting DataGov Pipeline...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    if settings.pipeline.sensitive_fields.is_empty() {
        warn!("⚠️  SENSITIVE_FIELDS not set, requests without sensitiveFields anonymize nothing");
    }

    tokio::fs::create_dir_all(&settings.store.root).await?;
    let store = Arc::new(FsStore::new(settings.store.root.clone()));
    info!("🗄️  Object store rooted at {}", settings.store.root.display());

    let imputer = ImputerConfig {
        max_iter: settings.pipeline.imputer_max_iter,
        tol: settings.pipeline.imputer_tol,
        ..ImputerConfig::default()
    };
    let client = GovernanceClient::connect(
        store,
        &settings.store.bucket,
        &settings.store.base_path,
        Arc::new(LogNarrator),
    )
    .await?
    .with_imputer(imputer);
    info!(
        "✅ Bound to {}/{}",
        settings.store.bucket, settings.store.base_path
    );

    let state = Arc::new(AppState::new(client, settings.clone()));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("📚 API Endpoints:");
    info!("   GET  /health             - Liveness check");
    info!("   POST /api/files/process  - Process one raw file");
    info!("   POST /api/batches        - Process the whole raw directory");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,datagov_pipeline=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
