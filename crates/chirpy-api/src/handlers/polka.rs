//! Polka payment webhook
//!
//! Reached only through `api_key_middleware`. Polka retries anything that is
//! not a 2xx, so events we do not handle are acknowledged with 204.

use crate::error::{AppError, AppJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Event that upgrades a user to Chirpy Red
pub const USER_UPGRADED: &str = "user.upgraded";

/// Webhook payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PolkaWebhookRequest {
    pub event: String,
    #[serde(default)]
    pub data: PolkaWebhookData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PolkaWebhookData {
    pub user_id: Option<Uuid>,
}

/// Handle a Polka event
#[utoipa::path(
    post,
    path = "/api/polka/webhooks",
    tag = "webhooks",
    request_body = PolkaWebhookRequest,
    responses(
        (status = 204, description = "Event processed or ignored"),
        (status = 400, description = "Upgrade event without a user_id", body = crate::error::ApiError),
        (status = 401, description = "Missing or wrong API key", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
    ),
    security(
        ("api_key" = [])
    )
)]
pub async fn polka_webhook(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<PolkaWebhookRequest>,
) -> Result<StatusCode, AppError> {
    if request.event != USER_UPGRADED {
        tracing::debug!(event = %request.event, "Ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = request
        .data
        .user_id
        .ok_or_else(|| AppError::BadRequest("Missing user_id".to_string()))?;

    state.store.upgrade_user_to_chirpy_red(user_id).await?;
    tracing::info!(user_id = %user_id, "User upgraded to Chirpy Red");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_without_data() {
        let request: PolkaWebhookRequest =
            serde_json::from_str(r#"{"event": "user.payment_failed"}"#).unwrap();

        assert_eq!(request.event, "user.payment_failed");
        assert!(request.data.user_id.is_none());
    }

    #[test]
    fn test_payload_with_user_id() {
        let id = Uuid::new_v4();
        let request: PolkaWebhookRequest = serde_json::from_value(serde_json::json!({
            "event": USER_UPGRADED,
            "data": { "user_id": id }
        }))
        .unwrap();

        assert_eq!(request.data.user_id, Some(id));
    }
}
