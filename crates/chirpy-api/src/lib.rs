//! Chirpy API - HTTP server
//!
//! Provides the user, session, chirp and webhook endpoints plus the admin
//! pages and the counted static file server.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use chirpy_core::config::ServerConfig;
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let fileserver = Router::new()
        .nest_service("/app", ServeDir::new(&state.config.server.fileserver_root))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::fileserver_hits_middleware,
        ));

    Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .nest("/admin", routes::admin_routes())
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .merge(fileserver)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.server))
        .with_state(state)
}

/// CORS for the configured origins; none configured means no cross-origin access
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Signing secret used by `create_router_for_testing`
#[cfg(feature = "test-utils")]
pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

/// Webhook key used by `create_router_for_testing`
#[cfg(feature = "test-utils")]
pub const TEST_POLKA_KEY: &str = "test-polka-key";

/// In-memory state on the dev platform with cheap password hashing
#[cfg(feature = "test-utils")]
pub fn create_state_for_testing() -> Arc<AppState> {
    use chirpy_core::{config::AppConfig, MemoryStore, Platform};

    let mut config = AppConfig::default();
    config.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    config.auth.polka_key = TEST_POLKA_KEY.to_string();
    config.platform = Platform::Dev;

    Arc::new(AppState::with_password_config(
        config,
        Arc::new(MemoryStore::new()),
        auth::PasswordConfig::light(),
    ))
}

/// Router over a fresh `create_state_for_testing` state
#[cfg(feature = "test-utils")]
pub fn create_router_for_testing() -> Router {
    create_router(create_state_for_testing())
}
