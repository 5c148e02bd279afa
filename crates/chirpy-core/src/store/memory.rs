//! In-memory store
//!
//! Each table sits behind its own `RwLock`; every operation takes the lock
//! for its whole read-modify-write, which gives per-row atomicity.

use super::{ChirpyStore, StoreError, StoreResult};
use crate::{Chirp, RefreshTokenRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process store for tests and local development
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    refresh_tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
    chirps: RwLock<HashMap<Uuid, Chirp>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn oldest_first(mut chirps: Vec<Chirp>) -> Vec<Chirp> {
    chirps.sort_by_key(|c| c.created_at);
    chirps
}

#[async_trait]
impl ChirpyStore for MemoryStore {
    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("User"))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound("User"))
    }

    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict("Email"));
        }

        let user = User::new(email, hashed_password);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn upgrade_user_to_chirpy_red(&self, id: Uuid) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        user.is_chirpy_red = true;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_users(&self) -> StoreResult<()> {
        // Same order as the foreign keys cascade
        self.chirps.write().await.clear();
        self.refresh_tokens.write().await.clear();
        self.users.write().await.clear();
        Ok(())
    }

    async fn create_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        if !self.users.read().await.contains_key(&user_id) {
            return Err(StoreError::NotFound("User"));
        }

        let mut tokens = self.refresh_tokens.write().await;
        if tokens.contains_key(token) {
            return Err(StoreError::Conflict("Refresh token"));
        }

        let record = RefreshTokenRecord::new(token, user_id, expires_at);
        tokens.insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn get_refresh_token(&self, token: &str) -> StoreResult<RefreshTokenRecord> {
        self.refresh_tokens
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(StoreError::NotFound("Refresh token"))
    }

    async fn revoke_refresh_token(&self, token: &str) -> StoreResult<()> {
        let mut tokens = self.refresh_tokens.write().await;
        if let Some(record) = tokens.get_mut(token) {
            if record.revoked_at.is_none() {
                let now = Utc::now();
                record.revoked_at = Some(now);
                record.updated_at = now;
            }
        }
        Ok(())
    }

    async fn create_chirp(&self, body: &str, user_id: Uuid) -> StoreResult<Chirp> {
        if !self.users.read().await.contains_key(&user_id) {
            return Err(StoreError::NotFound("User"));
        }

        let chirp = Chirp::new(body, user_id);
        self.chirps.write().await.insert(chirp.id, chirp.clone());
        Ok(chirp)
    }

    async fn get_chirps(&self) -> StoreResult<Vec<Chirp>> {
        let chirps = self.chirps.read().await.values().cloned().collect();
        Ok(oldest_first(chirps))
    }

    async fn get_chirps_by_author(&self, user_id: Uuid) -> StoreResult<Vec<Chirp>> {
        let chirps = self
            .chirps
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        Ok(oldest_first(chirps))
    }

    async fn get_chirp(&self, id: Uuid) -> StoreResult<Chirp> {
        self.chirps
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Chirp"))
    }

    async fn delete_chirp(&self, id: Uuid) -> StoreResult<()> {
        self.chirps
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("Chirp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();

        let by_email = store.get_user_by_email("a@b.com").await.unwrap();
        let by_id = store.get_user_by_id(user.id).await.unwrap();

        assert_eq!(by_email.id, user.id);
        assert_eq!(by_id.email, "a@b.com");
        assert!(store
            .get_user_by_email("missing@b.com")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user("a@b.com", "hash").await.unwrap();

        let err = store.create_user("a@b.com", "other").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_revoke_is_monotonic() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();
        store
            .create_refresh_token(user.id, "tok", Utc::now() + Duration::days(60))
            .await
            .unwrap();

        store.revoke_refresh_token("tok").await.unwrap();
        let first = store.get_refresh_token("tok").await.unwrap().revoked_at;
        assert!(first.is_some());

        // A second revoke keeps the original timestamp
        store.revoke_refresh_token("tok").await.unwrap();
        let second = store.get_refresh_token("tok").await.unwrap().revoked_at;
        assert_eq!(first, second);

        // Unknown tokens are not an error
        store.revoke_refresh_token("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_token_requires_user() {
        let store = MemoryStore::new();
        let err = store
            .create_refresh_token(Uuid::new_v4(), "tok", Utc::now())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_chirps_by_author_and_delete() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice@b.com", "hash").await.unwrap();
        let bob = store.create_user("bob@b.com", "hash").await.unwrap();

        let first = store.create_chirp("one", alice.id).await.unwrap();
        store.create_chirp("two", bob.id).await.unwrap();
        store.create_chirp("three", alice.id).await.unwrap();

        assert_eq!(store.get_chirps().await.unwrap().len(), 3);
        let alices = store.get_chirps_by_author(alice.id).await.unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|c| c.user_id == alice.id));

        store.delete_chirp(first.id).await.unwrap();
        assert!(store.get_chirp(first.id).await.unwrap_err().is_not_found());
        assert!(store.delete_chirp(first.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_users_cascades() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();
        store.create_chirp("hello", user.id).await.unwrap();
        store
            .create_refresh_token(user.id, "tok", Utc::now() + Duration::days(1))
            .await
            .unwrap();

        store.delete_users().await.unwrap();

        assert!(store.get_user_by_id(user.id).await.is_err());
        assert!(store.get_chirps().await.unwrap().is_empty());
        assert!(store.get_refresh_token("tok").await.is_err());
    }

    #[tokio::test]
    async fn test_upgrade_user() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();

        let upgraded = store.upgrade_user_to_chirpy_red(user.id).await.unwrap();
        assert!(upgraded.is_chirpy_red);
        assert!(store
            .upgrade_user_to_chirpy_red(Uuid::new_v4())
            .await
            .unwrap_err()
            .is_not_found());
    }
}
