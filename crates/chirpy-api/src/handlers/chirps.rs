//! Chirp handlers
//!
//! Reads are public. Creating and deleting require an access token, and
//! deletion additionally requires ownership.

use crate::audit::AuditContext;
use crate::auth::{ensure_owner, AuthenticatedUser};
use crate::error::{AppError, AppJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chirpy_core::{Chirp, ChirpConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Chirp body submitted for creation or validation
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ChirpRequest {
    #[serde(default)]
    pub body: String,
}

/// Validation result with banned words masked
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateChirpResponse {
    pub cleaned_body: String,
}

/// Listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListChirpsQuery {
    /// Only chirps by this user
    pub author_id: Option<String>,
    /// `asc` (default) or `desc` by creation time
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value {
            None | Some("") | Some("asc") => Ok(Self::Asc),
            Some("desc") => Ok(Self::Desc),
            Some(other) => Err(AppError::BadRequest(format!(
                "Invalid sort '{other}', must be 'asc' or 'desc'"
            ))),
        }
    }
}

/// Replace banned words with `****`
///
/// Words are split on single spaces and matched case-insensitively, so
/// punctuation attached to a word prevents a match.
pub fn clean_body(body: &str, banned_words: &[String]) -> String {
    body.split(' ')
        .map(|word| {
            let lower = word.to_lowercase();
            if banned_words.iter().any(|banned| *banned == lower) {
                "****"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Enforce the length limit, then mask banned words
fn checked_body(rules: &ChirpConfig, body: &str) -> Result<String, AppError> {
    if body.chars().count() > rules.max_length {
        return Err(AppError::BadRequest(format!(
            "Chirp is too long, must be at most {} characters",
            rules.max_length
        )));
    }

    Ok(clean_body(body, &rules.banned_words))
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {what}: '{raw}'")))
}

/// Check a chirp body without storing it
#[utoipa::path(
    post,
    path = "/api/validate_chirp",
    tag = "chirps",
    request_body = ChirpRequest,
    responses(
        (status = 200, description = "Chirp is valid", body = ValidateChirpResponse),
        (status = 400, description = "Chirp is too long", body = crate::error::ApiError),
    )
)]
pub async fn validate_chirp(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<ChirpRequest>,
) -> Result<Json<ValidateChirpResponse>, AppError> {
    let cleaned_body = checked_body(&state.config.chirps, &request.body)?;

    Ok(Json(ValidateChirpResponse { cleaned_body }))
}

/// Create a chirp owned by the caller
#[utoipa::path(
    post,
    path = "/api/chirps",
    tag = "chirps",
    request_body = ChirpRequest,
    responses(
        (status = 201, description = "Chirp created", body = Chirp),
        (status = 400, description = "Chirp is too long or user is gone", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_chirp(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    AppJson(request): AppJson<ChirpRequest>,
) -> Result<impl IntoResponse, AppError> {
    // A valid token can outlive its user
    if let Err(e) = state.store.get_user_by_id(user.user_id).await {
        return Err(match e {
            e if e.is_not_found() => AppError::BadRequest("User not found".to_string()),
            e => AppError::from(e),
        });
    }

    let body = checked_body(&state.config.chirps, &request.body)?;
    let chirp = state.store.create_chirp(&body, user.user_id).await?;

    tracing::debug!(chirp_id = %chirp.id, user_id = %user.user_id, "Chirp created");

    Ok((StatusCode::CREATED, Json(chirp)))
}

/// List chirps
#[utoipa::path(
    get,
    path = "/api/chirps",
    tag = "chirps",
    params(ListChirpsQuery),
    responses(
        (status = 200, description = "Chirps sorted by creation time", body = [Chirp]),
        (status = 400, description = "Invalid author_id or sort", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn list_chirps(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListChirpsQuery>,
) -> Result<Json<Vec<Chirp>>, AppError> {
    let order = SortOrder::parse(query.sort.as_deref())?;

    let mut chirps = match query.author_id.as_deref().filter(|id| !id.is_empty()) {
        Some(raw) => {
            let author_id = parse_id(raw, "author_id")?;
            state.store.get_chirps_by_author(author_id).await?
        }
        None => state.store.get_chirps().await?,
    };

    chirps.sort_by_key(|c| c.created_at);
    if order == SortOrder::Desc {
        chirps.reverse();
    }

    Ok(Json(chirps))
}

/// Get a single chirp
#[utoipa::path(
    get,
    path = "/api/chirps/{chirp_id}",
    tag = "chirps",
    params(
        ("chirp_id" = String, Path, description = "Chirp ID")
    ),
    responses(
        (status = 200, description = "Chirp found", body = Chirp),
        (status = 400, description = "Invalid chirp ID", body = crate::error::ApiError),
        (status = 404, description = "Chirp not found", body = crate::error::ApiError),
    )
)]
pub async fn get_chirp(
    State(state): State<Arc<AppState>>,
    Path(chirp_id): Path<String>,
) -> Result<Json<Chirp>, AppError> {
    let chirp_id = parse_id(&chirp_id, "chirp ID")?;
    let chirp = state.store.get_chirp(chirp_id).await?;

    Ok(Json(chirp))
}

/// Delete a chirp owned by the caller
///
/// The chirp is fetched and its owner checked before anything is deleted.
#[utoipa::path(
    delete,
    path = "/api/chirps/{chirp_id}",
    tag = "chirps",
    params(
        ("chirp_id" = String, Path, description = "Chirp ID")
    ),
    responses(
        (status = 204, description = "Chirp deleted"),
        (status = 400, description = "Invalid chirp ID", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Chirp belongs to another user", body = crate::error::ApiError),
        (status = 404, description = "Chirp not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_chirp(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    Path(chirp_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let chirp_id = parse_id(&chirp_id, "chirp ID")?;
    let chirp = state.store.get_chirp(chirp_id).await?;

    ensure_owner(
        chirp.user_id,
        &user,
        "chirp",
        &AuditContext::from_headers(&headers),
    )?;

    state.store.delete_chirp(chirp_id).await?;
    tracing::debug!(chirp_id = %chirp_id, user_id = %user.user_id, "Chirp deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banned() -> Vec<String> {
        ChirpConfig::default().banned_words
    }

    #[test]
    fn test_clean_body() {
        assert_eq!(
            clean_body("This is a kerfuffle opinion I need to share", &banned()),
            "This is a **** opinion I need to share"
        );
        assert_eq!(
            clean_body("Sharbert and FORNAX", &banned()),
            "**** and ****"
        );
        // Attached punctuation is not a match
        assert_eq!(clean_body("Sharbert!", &banned()), "Sharbert!");
        assert_eq!(clean_body("", &banned()), "");
    }

    #[test]
    fn test_checked_body_length() {
        let rules = ChirpConfig::default();

        assert!(checked_body(&rules, &"a".repeat(140)).is_ok());
        assert!(matches!(
            checked_body(&rules, &"a".repeat(141)),
            Err(AppError::BadRequest(_))
        ));
        // Length is counted in characters
        assert!(checked_body(&rules, &"é".repeat(140)).is_ok());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse(None).unwrap(), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("")).unwrap(), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("asc")).unwrap(), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("desc")).unwrap(), SortOrder::Desc);
        assert!(SortOrder::parse(Some("DESC")).is_err());
        assert!(SortOrder::parse(Some("random")).is_err());
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "chirp ID").unwrap(), id);
        assert!(matches!(
            parse_id("nope", "chirp ID"),
            Err(AppError::BadRequest(_))
        ));
    }
}
