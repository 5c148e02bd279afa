//! Request and response bodies for the user and session endpoints

use chirpy_core::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Email and password, used by both signup and login
///
/// Missing fields decode as empty strings and are rejected by validation.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of a user, optionally with a fresh session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
    /// Access token (login only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Refresh token (login only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl UserResponse {
    pub fn with_tokens(mut self, token: String, refresh_token: String) -> Self {
        self.token = Some(token);
        self.refresh_token = Some(refresh_token);
        self
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email.clone(),
            is_chirpy_red: user.is_chirpy_red,
            token: None,
            refresh_token: None,
        }
    }
}

/// New access token minted from a refresh token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_omits_absent_tokens() {
        let user = User::new("a@b.com", "$argon2id$secret");
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();

        assert_eq!(json["email"], "a@b.com");
        assert_eq!(json["is_chirpy_red"], false);
        assert!(json.get("token").is_none());
        assert!(json.get("refresh_token").is_none());
        assert!(json.get("hashed_password").is_none());
    }

    #[test]
    fn test_user_response_with_tokens() {
        let user = User::new("a@b.com", "hash");
        let response =
            UserResponse::from(&user).with_tokens("access".to_string(), "refresh".to_string());
        let json = serde_json::to_value(response).unwrap();

        assert_eq!(json["token"], "access");
        assert_eq!(json["refresh_token"], "refresh");
        assert_eq!(json["id"], user.id.to_string());
    }

    #[test]
    fn test_credentials_missing_fields_default_empty() {
        let request: CredentialsRequest = serde_json::from_str("{}").unwrap();
        assert!(request.email.is_empty());
        assert!(request.password.is_empty());
    }
}
