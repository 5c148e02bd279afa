//! Chirpy API Server

use chirpy_api::{create_router, state::AppState};
use chirpy_core::{config::AppConfig, ChirpyStore, MemoryStore, PgStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration; CHIRPY_CONFIG points at an optional TOML file
    let config = match std::env::var("CHIRPY_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };

    init_tracing(&config);

    let store: Arc<dyn ChirpyStore> = if config.database.url.is_empty() {
        tracing::warn!("DB_URL is not set, using the in-memory store; data will not persist");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(PgStore::new(&config.database.url, config.database.pool_size).await?)
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(platform = ?config.platform, "Configuration loaded");

    let state = Arc::new(AppState::new(config, store));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Chirpy API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// RUST_LOG wins over the configured level
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json_format {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
