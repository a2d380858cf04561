//! receipt-ocr - Receipt OCR ingestion service
//!
//! Accepts receipt photos from authenticated users, recognizes them with
//! the external OCR provider and stores one record per receipt.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use receipt_common::auth::TokenAuthority;
use receipt_common::config::{CliOverrides, ServiceConfig};
use receipt_common::db::{init_database_pool, PersistenceGuard, SqliteRecordStore};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use receipt_ocr::services::{
    ClovaOcrClient, FanOutCoordinator, IngestPipeline, NumberPolicy, ResultNormalizer,
};
use receipt_ocr::{build_router, AppState};

/// Command-line arguments for receipt-ocr
#[derive(Parser, Debug)]
#[command(name = "receipt-ocr")]
#[command(about = "Receipt OCR ingestion service")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:5000
    #[arg(short, long)]
    bind: Option<String>,

    /// Default log level (RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = CliOverrides {
        config_path: args.config,
        bind_addr: args.bind,
        private_key_path: None,
        log_level: args.log_level.clone(),
    };

    // Resolved before tracing init: the subscriber needs the configured level
    let config = ServiceConfig::resolve(&overrides).context("Failed to resolve configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=debug", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting receipt-ocr v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let (ocr_url, ocr_secret) = config.ocr_endpoint()?;

    // Verification only; this process never issues tokens
    let authority = TokenAuthority::from_files(None, &config.public_key_path)
        .with_context(|| format!("Failed to load public key {}", config.public_key_path.display()))?;
    info!("Public key loaded: {}", config.public_key_path.display());

    info!("Database: {}", config.database_path.display());
    let pool = init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    let provider = ClovaOcrClient::new(ocr_url, ocr_secret, config.ocr.deadline)
        .context("Failed to create OCR client")?;
    let fan_out = FanOutCoordinator::new(
        Arc::new(provider),
        config.ocr.version.clone(),
        config.ocr.lang.clone(),
        config.ocr.deadline,
    );
    let normalizer = ResultNormalizer::new(NumberPolicy::from_strict_flag(config.ocr.strict_numbers));
    let guard = PersistenceGuard::new(
        Arc::new(SqliteRecordStore::new(pool)),
        config.storage_timeout,
    );
    let pipeline = IngestPipeline::new(fan_out, normalizer, guard, config.ocr.default_format.clone());

    info!(
        deadline_secs = config.ocr.deadline.as_secs(),
        storage_timeout_secs = config.storage_timeout.as_secs(),
        number_policy = ?normalizer.policy(),
        "Ingest pipeline ready"
    );

    let state = AppState::new(Arc::new(pipeline), Arc::new(authority));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("Listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
