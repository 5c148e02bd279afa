//! User and session API handlers
//!
//! Thin wrappers over `AuthService`; all validation and error collapsing
//! happens there.

use crate::audit::AuditContext;
use crate::auth::{CredentialsRequest, TokenResponse, UserResponse};
use crate::error::{AppError, AppJson};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// Create a user account
///
/// # Responses
///
/// * `201 Created` - User created; body has public fields only
/// * `400 Bad Request` - Invalid email, empty password or email already registered
/// * `500 Internal Server Error` - Hashing or store failure
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(request): AppJson<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let context = AuditContext::from_headers(&headers);
    let user = state.auth.signup(request, &context).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with email and password
///
/// Returns the user with a 1 hour access token and a 60 day refresh token.
/// Unknown email and wrong password get the same 401.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "users",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 400, description = "Invalid email address", body = crate::error::ApiError),
        (status = 401, description = "Incorrect email or password", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(request): AppJson<CredentialsRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let context = AuditContext::from_headers(&headers);
    let response = state.auth.login(request, &context).await?;

    Ok(Json(response))
}

/// Mint a new access token
///
/// The refresh token goes in `Authorization: Bearer <refresh token>`.
/// The refresh token itself is not rotated.
#[utoipa::path(
    post,
    path = "/api/refresh",
    tag = "users",
    responses(
        (status = 200, description = "New access token", body = TokenResponse),
        (status = 401, description = "Invalid refresh token", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    let response = state.auth.refresh(&headers).await?;

    Ok(Json(response))
}

/// Revoke a refresh token
///
/// Answers 204 whether or not the token existed.
#[utoipa::path(
    post,
    path = "/api/revoke",
    tag = "users",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing or malformed Authorization header", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn revoke(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    state.auth.revoke(&headers).await?;

    Ok(StatusCode::NO_CONTENT)
}
