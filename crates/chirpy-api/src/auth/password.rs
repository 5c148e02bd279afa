/// Password hashing and verification using Argon2id
///
/// Every hash gets a fresh random salt, and the PHC string it produces
/// embeds the algorithm, parameters and salt, so no separate storage is needed.
/// Default parameters:
/// - Memory: 64 MB
/// - Iterations: 3
/// - Parallelism: 4 lanes
/// - Output: 32 bytes
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use chirpy_core::AuthConfig;
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    /// Any verification outcome other than a match
    #[error("Password does not match")]
    Mismatch,
}

/// Argon2id cost parameters
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KB (default: 65536 = 64 MB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism (lanes, default: 4)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
            output_len: Some(32),
        }
    }
}

impl PasswordConfig {
    /// Build from the `[auth]` configuration section
    pub fn from_auth_config(auth: &AuthConfig) -> Self {
        Self {
            memory_cost: auth.hash_memory_kib,
            time_cost: auth.hash_iterations,
            parallelism: auth.hash_parallelism,
            ..Self::default()
        }
    }

    /// Cheap parameters for tests. Never use in production.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn light() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        }
    }

    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

/// Hash a plaintext password with the default parameters
///
/// # Returns
///
/// * `Ok(String)` - PHC string format hash, e.g. `$argon2id$v=19$m=65536,t=3,p=4$...`
/// * `Err(PasswordError::HashingFailed)` - Only if the algorithm itself fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_config(password, &PasswordConfig::default())
}

/// Hash a password with custom parameters
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = config.to_params()?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash
///
/// Parameters are read from the hash itself. The comparison is the argon2
/// crate's constant-time check. An unparsable hash or any internal failure
/// is reported as `Mismatch`.
///
/// # Example
///
/// ```no_run
/// use chirpy_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("hunter2").unwrap();
/// assert!(verify_password(&hash, "hunter2").is_ok());
/// assert!(verify_password(&hash, "hunter3").is_err());
/// ```
pub fn verify_password(hash: &str, password: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::Mismatch)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_and_verify_password() {
        let config = PasswordConfig::light();
        let hash = hash_password_with_config("SecureP@ssw0rd!", &config).unwrap();

        assert!(verify_password(&hash, "SecureP@ssw0rd!").is_ok());
        assert!(matches!(
            verify_password(&hash, "WrongPassword"),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let config = PasswordConfig::light();

        let hash1 = hash_password_with_config("SamePassword123!", &config).unwrap();
        let hash2 = hash_password_with_config("SamePassword123!", &config).unwrap();

        // Random salt per call
        assert_ne!(hash1, hash2);
        assert!(verify_password(&hash1, "SamePassword123!").is_ok());
        assert!(verify_password(&hash2, "SamePassword123!").is_ok());
    }

    #[test]
    fn test_invalid_hash_fails_closed() {
        assert!(matches!(
            verify_password("invalid-hash-format", "password"),
            Err(PasswordError::Mismatch)
        ));
        assert!(matches!(
            verify_password("", ""),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn test_default_params_in_hash() {
        let hash = hash_password("pw").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_custom_config() {
        let config = PasswordConfig {
            memory_cost: 2048,
            time_cost: 2,
            parallelism: 2,
            output_len: Some(32),
        };

        let hash = hash_password_with_config("TestPassword123!", &config).unwrap();

        assert!(verify_password(&hash, "TestPassword123!").is_ok());
        assert!(hash.contains("m=2048"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=2"));
    }

    #[test]
    fn test_invalid_params_fail_hashing() {
        let config = PasswordConfig {
            memory_cost: 0,
            ..PasswordConfig::light()
        };
        assert!(matches!(
            hash_password_with_config("pw", &config),
            Err(PasswordError::HashingFailed(_))
        ));
    }

    #[test]
    fn test_from_auth_config() {
        let auth = AuthConfig::default();
        let config = PasswordConfig::from_auth_config(&auth);
        assert_eq!(config.memory_cost, 65536);
        assert_eq!(config.time_cost, 3);
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.output_len, Some(32));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_verify_accepts_only_original(p1 in ".{0,32}", p2 in ".{0,32}") {
            let config = PasswordConfig::light();
            let hash = hash_password_with_config(&p1, &config).unwrap();

            prop_assert!(verify_password(&hash, &p1).is_ok());
            if p1 != p2 {
                prop_assert!(verify_password(&hash, &p2).is_err());
            }
        }
    }
}
