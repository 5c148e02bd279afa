//! OpenAPI document for the public API

use crate::auth::{CredentialsRequest, TokenResponse, UserResponse};
use crate::error::ApiError;
use crate::handlers::chirps::{ChirpRequest, ValidateChirpResponse};
use crate::handlers::polka::{PolkaWebhookData, PolkaWebhookRequest};
use axum::Json;
use chirpy_core::Chirp;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chirpy API",
        description = "Short posts with accounts, session tokens and a payment webhook"
    ),
    paths(
        crate::handlers::health::healthz,
        crate::handlers::auth::create_user,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
        crate::handlers::auth::revoke,
        crate::handlers::chirps::validate_chirp,
        crate::handlers::chirps::create_chirp,
        crate::handlers::chirps::list_chirps,
        crate::handlers::chirps::get_chirp,
        crate::handlers::chirps::delete_chirp,
        crate::handlers::polka::polka_webhook,
    ),
    components(schemas(
        ApiError,
        Chirp,
        ChirpRequest,
        CredentialsRequest,
        PolkaWebhookData,
        PolkaWebhookRequest,
        TokenResponse,
        UserResponse,
        ValidateChirpResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "users", description = "Accounts and sessions"),
        (name = "chirps", description = "Posts"),
        (name = "webhooks", description = "Payment provider callbacks"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` and `api_key` schemes referenced by paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            // Sent as `Authorization: ApiKey <key>`
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
        }
    }
}

/// Serve the OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/users"));
        assert!(paths.contains_key("/api/chirps/{chirp_id}"));
        assert!(paths.contains_key("/api/polka/webhooks"));
        assert!(!paths.contains_key("/admin/reset"));
    }

    #[test]
    fn test_security_schemes_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();

        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.security_schemes.contains_key("api_key"));
    }
}
