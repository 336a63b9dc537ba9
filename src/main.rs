//! Bank ledger service - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Pick the storage backend (memory, or PostgreSQL with migrations)
//! 3. Build HTTP router with routes and middleware
//! 4. Start server on configured port

use std::sync::Arc;

use bank_ledger_web_server::{
    app,
    config::{Config, StorageProfile},
    db,
    registry::{MemoryRegistry, PgRegistry, Registry},
    state::AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(profile = ?config.storage_profile, "Configuration loaded");

    let registry: Arc<dyn Registry> = match config.storage_profile {
        StorageProfile::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryRegistry::new())
        }
        StorageProfile::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;

            Arc::new(PgRegistry::new(db::connect(database_url).await?))
        }
    };

    let app = app::build_router(AppState::new(registry, config.account_defaults()));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
