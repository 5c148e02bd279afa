//! Chirpy Core - Domain models, persistence contract, and shared types
//!
//! This crate defines the core abstractions used throughout Chirpy:
//! - User, chirp and refresh token records
//! - The `ChirpyStore` persistence contract and its implementations
//! - Configuration management

pub mod config;
pub mod store;

pub use config::{
    AppConfig, AuthConfig, ChirpConfig, ConfigError, DatabaseConfig, LoggingConfig, Platform,
    ServerConfig,
};
pub use store::{ChirpyStore, MemoryStore, PgStore, StoreError, StoreResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ============================================================================
// Users
// ============================================================================

/// User account record
///
/// `hashed_password` holds the PHC-format credential string and is never
/// serialized. API responses use a separate public view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    #[serde(default)]
    pub is_chirpy_red: bool,
}

impl User {
    /// Create a new user record with a fresh ID
    pub fn new(email: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.into(),
            hashed_password: hashed_password.into(),
            is_chirpy_red: false,
        }
    }
}

// ============================================================================
// Chirps
// ============================================================================

/// A short post owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    /// Owning user
    pub user_id: Uuid,
}

impl Chirp {
    pub fn new(body: impl Into<String>, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.into(),
            user_id,
        }
    }

    /// Whether `user_id` owns this chirp
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

// ============================================================================
// Refresh Tokens
// ============================================================================

/// Lifecycle state of a refresh token
///
/// `Expired` is never persisted; it is derived from `expires_at`.
/// `Revoked` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTokenState {
    Active,
    Expired,
    Revoked,
}

/// Server-side record of an issued refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Opaque token value (64 hex characters)
    pub token: String,
    /// User this token is bound to
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn new(token: impl Into<String>, user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            token: token.into(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Resolve the token state at `now`. Revocation wins over expiry.
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.is_revoked() {
            RefreshTokenState::Revoked
        } else if self.is_expired_at(now) {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }

    /// A refresh token may mint access tokens only while active
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == RefreshTokenState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_user_serialization_hides_password() {
        let user = User::new("a@b.com", "$argon2id$v=19$secret");
        let json = serde_json::to_string(&user).unwrap();

        assert!(json.contains("a@b.com"));
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("argon2id"));
        assert!(!user.is_chirpy_red);
    }

    #[test]
    fn test_chirp_ownership() {
        let owner = Uuid::new_v4();
        let chirp = Chirp::new("hello", owner);

        assert!(chirp.is_owned_by(owner));
        assert!(!chirp.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn test_refresh_token_states() {
        let now = Utc::now();
        let mut record = RefreshTokenRecord::new("abc", Uuid::new_v4(), now + Duration::days(60));

        assert_eq!(record.state_at(now), RefreshTokenState::Active);
        assert!(record.is_active_at(now));

        // Exactly at expiry the token is no longer usable
        assert_eq!(
            record.state_at(record.expires_at),
            RefreshTokenState::Expired
        );

        record.revoked_at = Some(now);
        assert_eq!(record.state_at(now), RefreshTokenState::Revoked);
        assert_eq!(
            record.state_at(now + Duration::days(90)),
            RefreshTokenState::Revoked
        );
        assert!(!record.is_active_at(now));
    }
}
