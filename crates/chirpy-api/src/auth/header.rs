//! `Authorization` header parsing
//!
//! Two schemes are accepted:
//! - `Bearer <token>`: one or more whitespace characters, then a token of
//!   URL-safe base64 characters (`A-Z a-z 0-9 - _ . ~ +`) with optional
//!   trailing `=` padding, anchored at both ends.
//! - `ApiKey <key>`: case-sensitive prefix, remainder trimmed.
//!
//! Header values are never logged from here; they carry credentials.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static BEARER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Bearer\s+([A-Za-z0-9\-_.~+]+=*)$").expect("bearer pattern is valid")
});

const API_KEY_PREFIX: &str = "ApiKey ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Malformed Authorization header")]
    MalformedHeader,

    #[error("Empty API key")]
    EmptyKey,
}

fn authorization_value(headers: &HeaderMap) -> Result<&str, HeaderError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(HeaderError::MissingHeader)?;

    if value.is_empty() {
        return Err(HeaderError::MissingHeader);
    }

    value.to_str().map_err(|_| HeaderError::MalformedHeader)
}

/// Extract the token from `Authorization: Bearer <token>`
///
/// Returns exactly the captured token, unmodified.
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, HeaderError> {
    let value = authorization_value(headers)?;

    BEARER_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|token| token.as_str().to_string())
        .ok_or(HeaderError::MalformedHeader)
}

/// Extract the key from `Authorization: ApiKey <key>`
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, HeaderError> {
    let value = authorization_value(headers)?;

    let key = value
        .strip_prefix(API_KEY_PREFIX)
        .ok_or(HeaderError::MalformedHeader)?
        .trim();

    if key.is_empty() {
        return Err(HeaderError::EmptyKey);
    }

    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        let headers = headers_with("Bearer some.kind.of.token");
        assert_eq!(extract_bearer(&headers).unwrap(), "some.kind.of.token");
    }

    #[test]
    fn test_extract_bearer_padding_and_whitespace() {
        assert_eq!(extract_bearer(&headers_with("Bearer abc==")).unwrap(), "abc==");
        assert_eq!(extract_bearer(&headers_with("Bearer \t  abc")).unwrap(), "abc");
        assert_eq!(
            extract_bearer(&headers_with("Bearer a-b_c.d~e+f")).unwrap(),
            "a-b_c.d~e+f"
        );
    }

    #[test]
    fn test_extract_bearer_missing() {
        assert_eq!(
            extract_bearer(&HeaderMap::new()),
            Err(HeaderError::MissingHeader)
        );
        assert_eq!(
            extract_bearer(&headers_with("")),
            Err(HeaderError::MissingHeader)
        );
    }

    #[test]
    fn test_extract_bearer_malformed() {
        for value in [
            "Bearer",
            "Bearer ",
            "Bearer a b",
            "Bearer abc=def",
            "bearer abc",
            "Basic abc",
            "Bearerabc",
            "Bearer abc!",
            "Token Bearer abc",
        ] {
            assert_eq!(
                extract_bearer(&headers_with(value)),
                Err(HeaderError::MalformedHeader),
                "value: {value:?}"
            );
        }
    }

    #[test]
    fn test_extract_bearer_non_ascii_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );
        assert_eq!(extract_bearer(&headers), Err(HeaderError::MalformedHeader));
    }

    #[test]
    fn test_extract_api_key() {
        assert_eq!(
            extract_api_key(&headers_with("ApiKey abc123")).unwrap(),
            "abc123"
        );
        assert_eq!(
            extract_api_key(&headers_with("ApiKey   abc123  ")).unwrap(),
            "abc123"
        );
    }

    #[test]
    fn test_extract_api_key_failures() {
        assert_eq!(
            extract_api_key(&HeaderMap::new()),
            Err(HeaderError::MissingHeader)
        );
        assert_eq!(
            extract_api_key(&headers_with("")),
            Err(HeaderError::MissingHeader)
        );
        assert_eq!(
            extract_api_key(&headers_with("Bearer abc123")),
            Err(HeaderError::MalformedHeader)
        );
        assert_eq!(
            extract_api_key(&headers_with("apikey abc123")),
            Err(HeaderError::MalformedHeader)
        );
        assert_eq!(
            extract_api_key(&headers_with("ApiKey    ")),
            Err(HeaderError::EmptyKey)
        );
    }

    proptest! {
        #[test]
        fn prop_bearer_returns_token_unmodified(token in "[A-Za-z0-9._~+-]{1,64}={0,2}") {
            let headers = headers_with(&format!("Bearer {token}"));
            prop_assert_eq!(extract_bearer(&headers).unwrap(), token);
        }

        #[test]
        fn prop_bearer_rejects_embedded_space(
            left in "[A-Za-z0-9]{1,16}",
            right in "[A-Za-z0-9]{1,16}",
        ) {
            let headers = headers_with(&format!("Bearer {left} {right}"));
            prop_assert_eq!(extract_bearer(&headers), Err(HeaderError::MalformedHeader));
        }
    }
}
