//! Application state management

use crate::auth::{AuthService, JwtConfig, PasswordConfig};
use chirpy_core::config::AppConfig;
use chirpy_core::ChirpyStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Application state shared across handlers
///
/// Everything except the hit counter is fixed at startup.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Persistence backend
    pub store: Arc<dyn ChirpyStore>,
    /// Access token signing settings
    pub jwt: JwtConfig,
    /// Session lifecycle service
    pub auth: AuthService,
    /// Requests served under `/app/`
    pub fileserver_hits: AtomicU64,
}

impl AppState {
    /// Create application state with hashing parameters from config
    pub fn new(config: AppConfig, store: Arc<dyn ChirpyStore>) -> Self {
        let password = PasswordConfig::from_auth_config(&config.auth);
        Self::with_password_config(config, store, password)
    }

    /// Create application state with explicit hashing parameters
    pub fn with_password_config(
        config: AppConfig,
        store: Arc<dyn ChirpyStore>,
        password: PasswordConfig,
    ) -> Self {
        let jwt = JwtConfig::from_auth_config(&config.auth);
        // Out-of-range lifetimes (only possible without `validate`) issue
        // refresh tokens that are already expired
        let refresh_token_ttl = chrono::Duration::try_days(config.auth.refresh_token_ttl_days)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .unwrap_or_else(|| {
                tracing::warn!(
                    days = config.auth.refresh_token_ttl_days,
                    "Refresh token lifetime out of range"
                );
                chrono::Duration::zero()
            });
        let auth = AuthService::new(store.clone(), jwt.clone(), password, refresh_token_ttl);

        Self {
            config,
            store,
            jwt,
            auth,
            fileserver_hits: AtomicU64::new(0),
        }
    }

    /// Increment the file server hit counter
    pub fn increment_hits(&self) -> u64 {
        self.fileserver_hits.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current file server hit count
    pub fn hits(&self) -> u64 {
        self.fileserver_hits.load(Ordering::SeqCst)
    }

    pub fn reset_hits(&self) {
        self.fileserver_hits.store(0, Ordering::SeqCst);
    }

    /// Shared secret for the payment webhook
    pub fn polka_key(&self) -> &str {
        &self.config.auth.polka_key
    }
}
