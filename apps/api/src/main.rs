mod analytics;
mod cache;
mod config;
mod errors;
mod events;
mod models;
mod provider;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{CacheLayer, RedisBackend};
use crate::config::Config;
use crate::events::service::EventsService;
use crate::provider::postgres::PgDataProvider;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Event Analytics API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL-backed data provider
    let provider = PgDataProvider::connect(&config.database_url).await?;

    // Initialize Redis cache layer
    let redis = redis::Client::open(config.redis_url.clone())?;
    let cache = CacheLayer::new(Arc::new(RedisBackend::new(redis)));
    info!("Redis cache layer initialized");

    // Compose the analytics facade
    let service = EventsService::new(Arc::new(provider), cache);

    let state = AppState {
        service,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
