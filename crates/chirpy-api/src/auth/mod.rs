//! Authentication and authorization module
//!
//! - Password hashing with Argon2id
//! - Access token generation and validation (JWT, HS256)
//! - Opaque refresh token generation
//! - `Authorization` header parsing (Bearer and ApiKey)
//! - Middleware for access tokens, the webhook API key and ownership checks
//! - Session lifecycle service (signup, login, refresh, revoke)

pub mod header;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod refresh;
pub mod service;

pub use header::{extract_api_key, extract_bearer, HeaderError};
pub use jwt::{generate_access_token, validate_access_token, Claims, JwtConfig, JwtError};
pub use middleware::{
    api_key_middleware, auth_middleware, ensure_owner, AuthError, AuthenticatedUser,
};
pub use models::{CredentialsRequest, TokenResponse, UserResponse};
pub use password::{hash_password, verify_password, PasswordConfig, PasswordError};
pub use refresh::{generate_refresh_token, RefreshTokenError};
pub use service::AuthService;
