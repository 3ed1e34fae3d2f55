//! Wayquest server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use std::net::SocketAddr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wayquest_core::config::AppConfig;
use wayquest_server::reconcile::reconcile_photo_scores;
use wayquest_server::{create_router, AppState};
use wayquest_storage::ObjectStore;

/// Wayquest - location-based quest server
#[derive(Parser, Debug)]
#[command(name = "wayquestd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "WAYQUEST_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Wayquest v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();

    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}, using defaults", args.config);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("WAYQUEST_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize storage backend
    let storage = wayquest_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;

    // Verify storage connectivity before accepting requests. This catches
    // configuration errors early instead of failing the first upload.
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(backend = storage.backend_name(), "Storage backend initialized");

    // Initialize metadata store
    let metadata = wayquest_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    tracing::info!("Metadata store initialized");

    // Backfill score records for historical photo-mission uploads. Individual
    // failures are logged inside the job and never block startup.
    let stats = reconcile_photo_scores(metadata.as_ref()).await;
    if stats.backfilled > 0 || stats.errors > 0 {
        tracing::info!(
            backfilled = stats.backfilled,
            errors = stats.errors,
            "startup reconciliation complete"
        );
    }

    // Create application state and router
    let state = AppState::new(config.clone(), storage, metadata);
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
