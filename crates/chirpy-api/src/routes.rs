//! API route definitions

use crate::auth::middleware::{api_key_middleware, auth_middleware};
use crate::handlers::{admin, auth, chirps, health, polka};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Routes mounted under `/api`
///
/// Chirp reads are public while writes on the same paths require an access
/// token, so auth is attached per method with `route_layer`.
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/users", post(auth::create_user))
        .route("/login", post(auth::login))
        // Refresh and revoke read the refresh token themselves
        .route("/refresh", post(auth::refresh))
        .route("/revoke", post(auth::revoke))
        .route("/validate_chirp", post(chirps::validate_chirp));

    let chirp_routes = Router::new()
        .route(
            "/chirps",
            post(chirps::create_chirp)
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .get(chirps::list_chirps),
        )
        .route(
            "/chirps/:chirp_id",
            delete(chirps::delete_chirp)
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .get(chirps::get_chirp),
        );

    // Webhook routes (API key required)
    let webhook_routes = Router::new()
        .route("/polka/webhooks", post(polka::polka_webhook))
        .route_layer(middleware::from_fn_with_state(state, api_key_middleware));

    Router::new()
        .merge(public_routes)
        .merge(chirp_routes)
        .merge(webhook_routes)
}

/// Routes mounted under `/admin`
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/metrics", get(admin::metrics))
        .route("/reset", post(admin::reset))
}
