//! File server hit counting
//!
//! Every request that reaches the `/app/` service is counted, whatever the
//! response status.

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Count the request, then pass it on
pub async fn fileserver_hits_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let hits = state.increment_hits();
    tracing::trace!(hits, path = %request.uri().path(), "File server hit");

    next.run(request).await
}
