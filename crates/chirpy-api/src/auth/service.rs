//! Session lifecycle service
//!
//! Signup, login, refresh and revoke, coordinated against the store.
//!
//! Refresh tokens move through three states: Active → Expired (time passes
//! `expires_at`, never persisted) and Active → Revoked (explicit, terminal).
//! Refresh does not rotate the refresh token, and there is no cap on live
//! tokens per user.

use super::header::extract_bearer;
use super::jwt::JwtConfig;
use super::models::{CredentialsRequest, TokenResponse, UserResponse};
use super::password::{hash_password_with_config, verify_password, PasswordConfig};
use super::refresh::generate_refresh_token;
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::error::AppError;
use axum::http::HeaderMap;
use chirpy_core::{ChirpyStore, RefreshTokenState, StoreError};
use chrono::{Duration, Utc};
use std::sync::Arc;
use validator::ValidateEmail;

/// Login failure message; identical for unknown email and wrong password
pub const INVALID_CREDENTIALS: &str = "Incorrect email or password";

/// Refresh/revoke failure message
pub const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

/// Authentication service
pub struct AuthService {
    store: Arc<dyn ChirpyStore>,
    jwt: JwtConfig,
    password: PasswordConfig,
    refresh_token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn ChirpyStore>,
        jwt: JwtConfig,
        password: PasswordConfig,
        refresh_token_ttl: Duration,
    ) -> Self {
        Self {
            store,
            jwt,
            password,
            refresh_token_ttl,
        }
    }

    /// Register a new user
    ///
    /// # Returns
    ///
    /// * `Ok(UserResponse)` - Public fields of the new user
    /// * `Err(AppError::BadRequest)` - Bad email, empty password or email taken
    /// * `Err(AppError::Internal)` - Hashing or store failure
    pub async fn signup(
        &self,
        request: CredentialsRequest,
        context: &AuditContext,
    ) -> Result<UserResponse, AppError> {
        if !request.email.validate_email() {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }
        if request.password.is_empty() {
            return Err(AppError::BadRequest(
                "Password must not be empty".to_string(),
            ));
        }

        let hashed_password = self.hash(request.password).await?;

        let user = match self.store.create_user(&request.email, &hashed_password).await {
            Ok(user) => user,
            Err(StoreError::Conflict(_)) => {
                audit_log(&AuditEvent::RegistrationFailure {
                    email: request.email,
                    reason: "Email already registered".to_string(),
                    context: context.clone(),
                });
                return Err(AppError::BadRequest(
                    "Email already registered".to_string(),
                ));
            }
            Err(e) => return Err(AppError::Internal(format!("Failed to create user: {e}"))),
        };

        audit_log(&AuditEvent::RegistrationSuccess {
            user_id: user.id,
            email: user.email.clone(),
            context: context.clone(),
        });

        Ok(UserResponse::from(&user))
    }

    /// Login with email and password
    ///
    /// Issues an access token and a refresh token. The refresh record is
    /// persisted before either token is returned.
    pub async fn login(
        &self,
        request: CredentialsRequest,
        context: &AuditContext,
    ) -> Result<UserResponse, AppError> {
        if !request.email.validate_email() {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }

        let user = match self.store.get_user_by_email(&request.email).await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(error = %e, "Login lookup failed");
                self.login_failed(request.email, "Unknown user or lookup failure", context);
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if self
            .verify(user.hashed_password.clone(), request.password)
            .await?
            .is_err()
        {
            self.login_failed(request.email, "Password mismatch", context);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let access_token = self
            .jwt
            .issue(user.id)
            .map_err(|e| AppError::Internal(format!("Failed to issue access token: {e}")))?;

        let refresh_token = generate_refresh_token()
            .map_err(|e| AppError::Internal(format!("Failed to generate refresh token: {e}")))?;

        let expires_at = Utc::now()
            .checked_add_signed(self.refresh_token_ttl)
            .ok_or_else(|| AppError::Internal("Refresh token expiry overflows".to_string()))?;
        self.store
            .create_refresh_token(user.id, &refresh_token, expires_at)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store refresh token: {e}")))?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.id,
            email: user.email.clone(),
            context: context.clone(),
        });

        Ok(UserResponse::from(&user).with_tokens(access_token, refresh_token))
    }

    /// Exchange the refresh token in `Authorization: Bearer` for a new access token
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<TokenResponse, AppError> {
        let context = AuditContext::from_headers(headers);

        let token = extract_bearer(headers).map_err(|e| self.refresh_denied(&e, &context))?;

        let record = match self.store.get_refresh_token(&token).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => return Err(self.refresh_denied(&e, &context)),
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "Failed to look up refresh token: {e}"
                )))
            }
        };

        match record.state_at(Utc::now()) {
            RefreshTokenState::Active => {}
            state => return Err(self.refresh_denied(&format!("{state:?}"), &context)),
        }

        let token = self
            .jwt
            .issue(record.user_id)
            .map_err(|e| AppError::Internal(format!("Failed to issue access token: {e}")))?;

        audit_log(&AuditEvent::TokenRefresh {
            user_id: record.user_id,
            context,
        });

        Ok(TokenResponse { token })
    }

    /// Revoke the refresh token in `Authorization: Bearer`
    ///
    /// Succeeds whether or not the token existed or was already revoked.
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let context = AuditContext::from_headers(headers);

        let token = extract_bearer(headers).map_err(|e| self.refresh_denied(&e, &context))?;

        self.store
            .revoke_refresh_token(&token)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to revoke refresh token: {e}")))?;

        audit_log(&AuditEvent::TokenRevoked { context });
        Ok(())
    }

    async fn hash(&self, password: String) -> Result<String, AppError> {
        let config = self.password.clone();
        tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn verify(
        &self,
        hash: String,
        password: String,
    ) -> Result<Result<(), super::password::PasswordError>, AppError> {
        tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {e}")))
    }

    fn login_failed(&self, email: String, reason: &str, context: &AuditContext) {
        audit_log(&AuditEvent::LoginFailure {
            email,
            reason: reason.to_string(),
            context: context.clone(),
        });
    }

    fn refresh_denied(&self, reason: &dyn std::fmt::Display, context: &AuditContext) -> AppError {
        audit_log(&AuditEvent::RefreshDenied {
            reason: reason.to_string(),
            context: context.clone(),
        });
        AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string())
    }
}
