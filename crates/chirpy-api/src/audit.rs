//! Security audit logging for authentication events
//!
//! All audit events are logged at INFO level with the "audit" target,
//! so they can be filtered and routed separately from application logs.
//! Events never carry passwords, tokens, API keys or raw header values.
//!
//! # Example
//!
//! ```ignore
//! use chirpy_api::audit::{audit_log, AuditContext, AuditEvent};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     email: user.email.clone(),
//!     context: AuditContext::from_headers(&headers),
//! });
//! ```

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Request metadata attached to every audit event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    /// Client IP address (from proxy headers)
    pub ip_address: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
}

impl AuditContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user registration
    RegistrationSuccess {
        user_id: Uuid,
        email: String,
        context: AuditContext,
    },

    /// Failed registration attempt
    RegistrationFailure {
        email: String,
        reason: String,
        context: AuditContext,
    },

    /// Successful user login
    LoginSuccess {
        user_id: Uuid,
        email: String,
        context: AuditContext,
    },

    /// Failed login attempt
    LoginFailure {
        email: String,
        reason: String,
        context: AuditContext,
    },

    /// Access token minted from a refresh token
    TokenRefresh {
        user_id: Uuid,
        context: AuditContext,
    },

    /// Refresh token rejected
    RefreshDenied {
        reason: String,
        context: AuditContext,
    },

    /// Refresh token revoked
    TokenRevoked { context: AuditContext },

    /// Invalid, expired or missing access token
    InvalidToken {
        reason: String,
        context: AuditContext,
    },

    /// Webhook called without the right API key
    InvalidApiKey {
        reason: String,
        context: AuditContext,
    },

    /// Authenticated user tried to act on someone else's resource
    AccessDenied {
        user_id: Uuid,
        resource: String,
        context: AuditContext,
    },
}

/// Log a security audit event with structured fields
///
/// The event is also serialized to JSON in the `event` field for log
/// aggregators, e.g.:
///
/// ```json
/// {
///   "event_type": "login_success",
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "email": "user@example.com",
///   "context": { "ip_address": "192.168.1.1", "user_agent": "curl/8.0" }
/// }
/// ```
pub fn audit_log(event: &AuditEvent) {
    let timestamp: DateTime<Utc> = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::RegistrationSuccess {
            user_id,
            email,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?context.ip_address,
                "Registration successful"
            );
        }
        AuditEvent::RegistrationFailure {
            email,
            reason,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Registration failed"
            );
        }
        AuditEvent::LoginSuccess {
            user_id,
            email,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?context.ip_address,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure {
            email,
            reason,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Login failed"
            );
        }
        AuditEvent::TokenRefresh { user_id, context } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                ip_address = ?context.ip_address,
                "Token refresh"
            );
        }
        AuditEvent::RefreshDenied { reason, context } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Refresh denied"
            );
        }
        AuditEvent::TokenRevoked { context } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?context.ip_address,
                "Refresh token revoked"
            );
        }
        AuditEvent::InvalidToken { reason, context } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Invalid token"
            );
        }
        AuditEvent::InvalidApiKey { reason, context } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Invalid API key"
            );
        }
        AuditEvent::AccessDenied {
            user_id,
            resource,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                resource = %resource,
                ip_address = ?context.ip_address,
                "Access denied"
            );
        }
    }
}

/// Extract the client IP address from proxy headers
///
/// Checks X-Forwarded-For (first hop), then X-Real-IP.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// Extract the user agent from request headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AuditContext {
        AuditContext {
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: Some("Test Agent".to_string()),
        }
    }

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::LoginSuccess {
            user_id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            context: context(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("login_success"));
        assert!(json.contains("test@example.com"));
        assert!(json.contains("192.168.1.1"));
    }

    #[test]
    fn test_audit_log_all_events() {
        // Only checks that logging does not panic
        let user_id = Uuid::new_v4();
        let events = vec![
            AuditEvent::RegistrationSuccess {
                user_id,
                email: "a@b.com".to_string(),
                context: context(),
            },
            AuditEvent::RegistrationFailure {
                email: "a@b.com".to_string(),
                reason: "Email already registered".to_string(),
                context: context(),
            },
            AuditEvent::LoginFailure {
                email: "a@b.com".to_string(),
                reason: "Password mismatch".to_string(),
                context: context(),
            },
            AuditEvent::TokenRefresh {
                user_id,
                context: context(),
            },
            AuditEvent::RefreshDenied {
                reason: "revoked".to_string(),
                context: context(),
            },
            AuditEvent::TokenRevoked { context: context() },
            AuditEvent::InvalidToken {
                reason: "Token has expired".to_string(),
                context: AuditContext::default(),
            },
            AuditEvent::InvalidApiKey {
                reason: "Empty API key".to_string(),
                context: AuditContext::default(),
            },
            AuditEvent::AccessDenied {
                user_id,
                resource: "chirp".to_string(),
                context: context(),
            },
        ];

        for event in &events {
            audit_log(event);
        }
    }

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.1".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::USER_AGENT,
            "Mozilla/5.0 (Test)".parse().unwrap(),
        );

        let ctx = AuditContext::from_headers(&headers);
        assert_eq!(ctx.user_agent, Some("Mozilla/5.0 (Test)".to_string()));
        assert_eq!(ctx.ip_address, None);
    }

    #[test]
    fn test_extract_missing_headers() {
        let headers = HeaderMap::new();

        assert_eq!(extract_ip_address(&headers), None);
        assert_eq!(extract_user_agent(&headers), None);
    }
}
