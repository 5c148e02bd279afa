//! JWT access token generation and validation
//!
//! Access tokens are HS256-signed, carry the user ID as the subject and
//! expire after a fixed lifetime. They are stateless and cannot be revoked
//! before expiry.

use chirpy_core::AuthConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Issuer claim for every access token
pub const ISSUER: &str = "chirpy";

/// JWT claims embedded in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer (always "chirpy")
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    /// Unique token ID; tokens minted in the same second still differ
    pub jti: String,
}

/// JWT token generation and validation errors
///
/// The variants are distinguished for logging and tests only. Callers
/// facing clients collapse all of them into one generic response.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token subject is not a valid user ID")]
    InvalidSubject,

    #[error("Token lifetime overflows the expiry timestamp")]
    InvalidLifetime,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

impl JwtError {
    pub fn is_expired(&self) -> bool {
        matches!(self, JwtError::ExpiredToken)
    }
}

/// Signing secret and access token lifetime, fixed at startup
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Access token lifetime (default: 1 hour)
    pub access_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, access_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
        }
    }

    /// Build from the `[auth]` configuration section
    pub fn from_auth_config(auth: &AuthConfig) -> Self {
        Self::new(
            auth.jwt_secret.clone(),
            Duration::from_secs(auth.access_token_ttl_secs),
        )
    }

    /// Issue an access token for `user_id` with the configured lifetime
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        generate_access_token(user_id, &self.secret, self.access_ttl)
    }

    /// Validate an access token and return its subject
    pub fn validate(&self, token: &str) -> Result<Uuid, JwtError> {
        validate_access_token(token, &self.secret)
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .finish()
    }
}

fn now_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Generate a signed access token
///
/// # Arguments
///
/// * `user_id` - Subject of the token
/// * `secret` - HMAC signing secret
/// * `ttl` - Lifetime; `exp = iat + ttl`
///
/// # Example
///
/// ```no_run
/// use chirpy_api::auth::jwt::{generate_access_token, validate_access_token};
/// use std::time::Duration;
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = generate_access_token(user_id, "secret", Duration::from_secs(3600)).unwrap();
/// assert_eq!(validate_access_token(&token, "secret").unwrap(), user_id);
/// ```
pub fn generate_access_token(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
) -> Result<String, JwtError> {
    let now = now_secs()?;
    let exp = now
        .checked_add(ttl.as_secs())
        .ok_or(JwtError::InvalidLifetime)?;

    let claims = Claims {
        iss: ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now,
        exp,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate an access token and extract the user ID
///
/// Rejects the token when the signature does not verify, the token is
/// malformed, the issuer is wrong, `now >= exp`, or the subject is not a
/// UUID. No clock-skew leeway is applied.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::InvalidToken,
    })?;

    // jsonwebtoken only rejects exp < now; a token is already dead at exp
    if now_secs()? >= token_data.claims.exp {
        return Err(JwtError::ExpiredToken);
    }

    Uuid::parse_str(&token_data.claims.sub).map_err(|_| JwtError::InvalidSubject)
}
