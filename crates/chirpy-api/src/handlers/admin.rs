//! Admin handlers
//!
//! Not part of the OpenAPI document.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, response::Html};
use std::sync::Arc;

/// File server hit count as an HTML page
pub async fn metrics(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        "<html>\n  <body>\n    <h1>Welcome, Chirpy Admin</h1>\n    <p>Chirpy has been visited {} times!</p>\n  </body>\n</html>\n",
        state.hits()
    ))
}

/// Zero the hit counter and delete every user
///
/// Only available when the platform is `dev`.
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<&'static str, AppError> {
    if !state.config.platform.is_dev() {
        tracing::warn!("Reset attempted outside the dev platform");
        return Err(AppError::Forbidden(
            "Reset is only allowed in dev environment".to_string(),
        ));
    }

    state.reset_hits();
    state.store.delete_users().await?;
    tracing::info!("Hit counter and users reset");

    Ok("Hits reset to 0 and all users deleted")
}
