//! Persistence contract
//!
//! `ChirpyStore` is the data-access seam the service depends on. Two
//! implementations are provided:
//! - `MemoryStore`: in-process tables, used for tests and local development
//! - `PgStore`: PostgreSQL via SQLx
//!
//! Callers only distinguish `NotFound` (and `Conflict` on inserts) from
//! everything else. Atomicity of individual operations is the store's
//! responsibility; callers take no locks.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{Chirp, RefreshTokenRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Data-access operations used by the service
#[async_trait]
pub trait ChirpyStore: Send + Sync {
    // Users

    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<User>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;

    /// Insert a user. Fails with `Conflict` when the email is taken.
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User>;

    /// Mark a user as a Chirpy Red subscriber
    async fn upgrade_user_to_chirpy_red(&self, id: Uuid) -> StoreResult<User>;

    /// Remove every user together with their chirps and refresh tokens
    async fn delete_users(&self) -> StoreResult<()>;

    // Refresh tokens

    async fn create_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord>;

    /// Look up a refresh token record, revoked or not
    async fn get_refresh_token(&self, token: &str) -> StoreResult<RefreshTokenRecord>;

    /// Set `revoked_at` if unset. Unknown tokens are not an error.
    async fn revoke_refresh_token(&self, token: &str) -> StoreResult<()>;

    // Chirps

    async fn create_chirp(&self, body: &str, user_id: Uuid) -> StoreResult<Chirp>;

    /// All chirps, oldest first
    async fn get_chirps(&self) -> StoreResult<Vec<Chirp>>;

    /// Chirps by one author, oldest first
    async fn get_chirps_by_author(&self, user_id: Uuid) -> StoreResult<Vec<Chirp>>;

    async fn get_chirp(&self, id: Uuid) -> StoreResult<Chirp>;

    async fn delete_chirp(&self, id: Uuid) -> StoreResult<()>;
}
