mod auth;
mod config;
mod db;
mod errors;
mod identity;
mod models;
mod profile;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::db::{create_pool, run_migrations};
use crate::identity::{MemoryUserDirectory, PgUserDirectory, UserDirectory};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemorySectionStore, PgSectionStore, SectionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Elevate profile API v{}", env!("CARGO_PKG_VERSION"));

    let (store, users) = build_backends(&config).await?;

    // Build app state
    let state = AppState::new(store, users, config.clone());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Section store and user directory for the configured backend.
async fn build_backends(
    config: &Config,
) -> Result<(Arc<dyn SectionStore>, Arc<dyn UserDirectory>)> {
    match config.store {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            let pool = create_pool(url, config.database_max_connections).await?;
            run_migrations(&pool).await?;
            Ok((
                Arc::new(PgSectionStore::new(pool.clone())),
                Arc::new(PgUserDirectory::new(pool)),
            ))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory profile store, data is lost on restart");
            Ok((
                Arc::new(MemorySectionStore::new()),
                Arc::new(MemoryUserDirectory::new(true)),
            ))
        }
    }
}
