//! PostgreSQL store
//!
//! Expects the `users`, `refresh_tokens` and `chirps` tables to exist.
//! `refresh_tokens.user_id` and `chirps.user_id` reference `users(id)` with
//! `ON DELETE CASCADE`; `users.email` is unique.

use super::{ChirpyStore, StoreError, StoreResult};
use crate::{Chirp, RefreshTokenRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store connection
    pub async fn new(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("PostgreSQL connection failed: {e}")))?;

        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    email: String,
    hashed_password: String,
    is_chirpy_red: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            email: row.email,
            hashed_password: row.hashed_password,
            is_chirpy_red: row.is_chirpy_red,
        }
    }
}

/// Refresh token row from database
#[derive(Debug, FromRow)]
struct RefreshTokenRow {
    token: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<RefreshTokenRow> for RefreshTokenRecord {
    fn from(row: RefreshTokenRow) -> Self {
        RefreshTokenRecord {
            token: row.token,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
        }
    }
}

/// Chirp row from database
#[derive(Debug, FromRow)]
struct ChirpRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    body: String,
    user_id: Uuid,
}

impl From<ChirpRow> for Chirp {
    fn from(row: ChirpRow) -> Self {
        Chirp {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            body: row.body,
            user_id: row.user_id,
        }
    }
}

const USER_COLUMNS: &str = "id, created_at, updated_at, email, hashed_password, is_chirpy_red";
const CHIRP_COLUMNS: &str = "id, created_at, updated_at, body, user_id";

fn db_error(context: &str, e: sqlx::Error) -> StoreError {
    StoreError::Database(format!("{context}: {e}"))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[async_trait]
impl ChirpyStore for PgStore {
    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<User> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to get user", e))?;

        row.map(User::from).ok_or(StoreError::NotFound("User"))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to get user", e))?;

        row.map(User::from).ok_or(StoreError::NotFound("User"))
    }

    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, created_at, updated_at, email, hashed_password)
            VALUES (gen_random_uuid(), NOW(), NOW(), $1, $2)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("Email")
            } else {
                db_error("Failed to create user", e)
            }
        })?;

        Ok(row.into())
    }

    async fn upgrade_user_to_chirpy_red(&self, id: Uuid) -> StoreResult<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users SET is_chirpy_red = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to upgrade user", e))?;

        row.map(User::from).ok_or(StoreError::NotFound("User"))
    }

    async fn delete_users(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete users", e))?;

        Ok(())
    }

    async fn create_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        let row: RefreshTokenRow = sqlx::query_as(
            r#"
            INSERT INTO refresh_tokens (token, created_at, updated_at, user_id, expires_at, revoked_at)
            VALUES ($1, NOW(), NOW(), $2, $3, NULL)
            RETURNING token, user_id, created_at, updated_at, expires_at, revoked_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("Refresh token")
            } else if is_foreign_key_violation(&e) {
                StoreError::NotFound("User")
            } else {
                db_error("Failed to store refresh token", e)
            }
        })?;

        Ok(row.into())
    }

    async fn get_refresh_token(&self, token: &str) -> StoreResult<RefreshTokenRecord> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            r#"
            SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get refresh token", e))?;

        row.map(RefreshTokenRecord::from)
            .ok_or(StoreError::NotFound("Refresh token"))
    }

    async fn revoke_refresh_token(&self, token: &str) -> StoreResult<()> {
        // Only the first revocation sets the timestamp
        sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked_at = NOW(), updated_at = NOW()
            WHERE token = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to revoke refresh token", e))?;

        Ok(())
    }

    async fn create_chirp(&self, body: &str, user_id: Uuid) -> StoreResult<Chirp> {
        let row: ChirpRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO chirps (id, created_at, updated_at, body, user_id)
            VALUES (gen_random_uuid(), NOW(), NOW(), $1, $2)
            RETURNING {CHIRP_COLUMNS}
            "#
        ))
        .bind(body)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::NotFound("User")
            } else {
                db_error("Failed to create chirp", e)
            }
        })?;

        Ok(row.into())
    }

    async fn get_chirps(&self) -> StoreResult<Vec<Chirp>> {
        let rows: Vec<ChirpRow> = sqlx::query_as(&format!(
            "SELECT {CHIRP_COLUMNS} FROM chirps ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list chirps", e))?;

        Ok(rows.into_iter().map(Chirp::from).collect())
    }

    async fn get_chirps_by_author(&self, user_id: Uuid) -> StoreResult<Vec<Chirp>> {
        let rows: Vec<ChirpRow> = sqlx::query_as(&format!(
            "SELECT {CHIRP_COLUMNS} FROM chirps WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list chirps", e))?;

        Ok(rows.into_iter().map(Chirp::from).collect())
    }

    async fn get_chirp(&self, id: Uuid) -> StoreResult<Chirp> {
        let row: Option<ChirpRow> =
            sqlx::query_as(&format!("SELECT {CHIRP_COLUMNS} FROM chirps WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to get chirp", e))?;

        row.map(Chirp::from).ok_or(StoreError::NotFound("Chirp"))
    }

    async fn delete_chirp(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete chirp", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Chirp"));
        }
        Ok(())
    }
}
