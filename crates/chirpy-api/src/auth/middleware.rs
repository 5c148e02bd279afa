//! Authorization middleware for protected routes
//!
//! `auth_middleware` resolves `Authorization: Bearer <access token>` into an
//! `AuthenticatedUser` in the request extensions. `api_key_middleware` gates
//! the payment webhook on `Authorization: ApiKey <key>`. Every failure is
//! answered with the same generic 401; the cause only reaches the logs.

use super::header::{extract_api_key, extract_bearer, HeaderError};
use super::jwt::JwtError;
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Caller identity resolved from a valid access token
///
/// Added to request extensions by `auth_middleware`; extract it in handlers
/// with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl AuthenticatedUser {
    /// Exact identity comparison, no elevation
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid Authorization header: {0}")]
    Header(#[from] HeaderError),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("API key mismatch")]
    InvalidApiKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "Unauthorized",
        });

        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Authentication middleware that requires a valid access token
///
/// # Usage
///
/// ```ignore
/// use axum::{middleware, routing::post, Router};
/// use chirpy_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/chirps", post(create_chirp))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user_id = match extract_bearer(request.headers())
        .map_err(AuthError::from)
        .and_then(|token| state.jwt.validate(&token).map_err(AuthError::from))
    {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected access token");
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
                context: AuditContext::from_headers(request.headers()),
            });
            return Err(e);
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}

/// Webhook gate: exact comparison against the configured API key
///
/// An empty configured key never matches.
pub async fn api_key_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let result = extract_api_key(request.headers())
        .map_err(AuthError::from)
        .and_then(|key| {
            let expected = state.polka_key();
            if !expected.is_empty() && key == expected {
                Ok(())
            } else {
                Err(AuthError::InvalidApiKey)
            }
        });

    if let Err(e) = result {
        tracing::debug!(error = %e, "Rejected webhook call");
        audit_log(&AuditEvent::InvalidApiKey {
            reason: e.to_string(),
            context: AuditContext::from_headers(request.headers()),
        });
        return Err(e);
    }

    Ok(next.run(request).await)
}

/// Check that `user` owns a resource owned by `owner_id`
///
/// Call after fetching the resource and before mutating it.
pub fn ensure_owner(
    owner_id: Uuid,
    user: &AuthenticatedUser,
    resource: &str,
    context: &AuditContext,
) -> Result<(), AppError> {
    if user.owns(owner_id) {
        return Ok(());
    }

    audit_log(&AuditEvent::AccessDenied {
        user_id: user.user_id,
        resource: resource.to_string(),
        context: context.clone(),
    });
    Err(AppError::Forbidden("Forbidden".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owns_is_exact() {
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
        };

        assert!(user.owns(user.user_id));
        assert!(!user.owns(Uuid::new_v4()));
        assert!(!user.owns(Uuid::nil()));
    }

    #[test]
    fn test_ensure_owner() {
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
        };
        let ctx = AuditContext::default();

        assert!(ensure_owner(user.user_id, &user, "chirp", &ctx).is_ok());
        assert!(matches!(
            ensure_owner(Uuid::new_v4(), &user, "chirp", &ctx),
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_auth_error_is_generic() {
        let errors = [
            AuthError::Header(HeaderError::MissingHeader),
            AuthError::Header(HeaderError::MalformedHeader),
            AuthError::InvalidToken(JwtError::ExpiredToken),
            AuthError::InvalidToken(JwtError::InvalidSignature),
            AuthError::InvalidApiKey,
        ];

        for error in errors {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json, serde_json::json!({ "error": "Unauthorized" }));
        }
    }
}
