//! Stream resolution endpoint.
//!
//! An authenticated caller trades an opaque viewing token for a playback
//! descriptor. Resolution never constructs URLs itself; that is delegated to
//! the provider adapter selected through the startup registry. Each account
//! gets one resolve per limiter window; the limiter is in-process and resets
//! on restart.

pub(crate) mod adapter;
mod service;
mod storage;
pub(crate) mod types;


use axum::{extract::Extension, http::HeaderMap, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;

use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::session::authenticate_session;
use crate::api::error::{ApiError, ErrorBody};
use crate::api::state::AppState;
use types::{ResolveRequest, ResolveResponse};

/// Resolve a viewing token into a playable stream descriptor.
#[utoipa::path(
    post,
    path = "/streams/resolve",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Stream resolved", body = ResolveResponse),
        (status = 400, description = "Missing or malformed token", body = ErrorBody),
        (status = 401, description = "Missing or invalidated session", body = ErrorBody),
        (status = 404, description = "Unknown stream token", body = ErrorBody),
        (status = 410, description = "Stream flagged inactive", body = ErrorBody),
        (status = 429, description = "Resolve rate exceeded", body = ErrorBody),
        (status = 500, description = "Provider misconfiguration", body = ErrorBody)
    ),
    tag = "streams"
)]
pub async fn resolve(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ResolveRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = authenticate_session(&headers, &pool, &state).await?;

    // Limit before touching the payload; the window is per account, not per
    // token.
    if let RateLimitDecision::Limited = state
        .rate_limiter()
        .check_account(principal.account_id, RateLimitAction::ResolveStream)
    {
        return Err(ApiError::RateLimited("Too many requests".to_string()));
    }

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    if request.token.is_empty() {
        return Err(ApiError::Validation("Invalid token".to_string()));
    }

    let response = service::resolve_stream(&pool, state.adapters(), &request.token).await?;

    Ok(Json(response))
}
