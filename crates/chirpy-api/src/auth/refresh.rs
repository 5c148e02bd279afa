//! Opaque refresh token generation
//!
//! Refresh tokens are 32 bytes from the OS random source, hex-encoded.
//! Their lifecycle (expiry, revocation) lives in the store.

use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

/// Number of random bytes in a refresh token
pub const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("Random source failure: {0}")]
    Entropy(String),
}

/// Generate a new 64-character lowercase hex refresh token
pub fn generate_refresh_token() -> Result<String, RefreshTokenError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| RefreshTokenError::Entropy(e.to_string()))?;

    Ok(hex::encode(bytes))
}
