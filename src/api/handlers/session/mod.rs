//! Session endpoints and the session-integrity guard.
//!
//! Sessions are stateless HS256 JWTs stamped with the account's session
//! version (`sv` claim). There is no session table: every authenticated
//! request re-reads the stored version and compares it against the claim, so
//! `POST /session/revoke-all` invalidates every outstanding token for the
//! caller with a single atomic increment.
//!
//! Tokens are accepted from an `Authorization: Bearer` header or the session
//! cookie, bearer first.

pub(crate) mod storage;
pub(crate) mod token;
pub(crate) mod types;


use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::normalize_email;
use super::register::password::verify_password;
use crate::api::error::{ApiError, ErrorBody};
use crate::api::state::{AppConfig, AppState};
use storage::CredentialRecord;
use types::{LoginRequest, LoginResponse, RevokeResponse, SessionResponse};

const SESSION_COOKIE_NAME: &str = "__streamix_session";

/// An authenticated caller, resolved from a stamped session token.
pub(crate) struct Principal {
    pub(crate) account_id: Uuid,
    pub(crate) email: String,
}

/// Outcome of the magic-link sign-in policy.
#[derive(Debug)]
pub enum MagicLinkOutcome {
    SignedIn { token: String },
    /// Distinguishable on purpose: the requester supplied the email, so its
    /// absence is not a disclosure.
    AccountNotFound,
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = LoginResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "session"
)]
pub async fn login(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::Validation("Missing credentials".to_string()));
    }

    let email = normalize_email(&request.email);

    // Every failure below is the same generic 401 so account state cannot be
    // probed through the login endpoint.
    let Some(record) = storage::lookup_credentials(&pool, &email).await? else {
        return Err(ApiError::InvalidCredentials);
    };

    let CredentialRecord {
        id,
        password_hash,
        verified,
        session_version,
    } = record;

    let Some(password_hash) = password_hash else {
        // Magic-link-only account.
        return Err(ApiError::InvalidCredentials);
    };

    if !verified || !verify_password(&request.password, &password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.signer().issue(id, &email, session_version)?;

    let mut response_headers = HeaderMap::new();
    let cookie =
        session_cookie(state.config(), &token).context("failed to build session cookie")?;
    response_headers.insert(SET_COOKIE, cookie);

    Ok((
        StatusCode::OK,
        response_headers,
        Json(LoginResponse { token }),
    ))
}

/// Apply the magic-link sign-in policy: the account must exist and be
/// verified, and the issued token is stamped like any credential sign-in.
///
/// There is no route for this; the email transport lives outside this
/// service.
pub async fn magic_link_sign_in(
    pool: &PgPool,
    state: &AppState,
    email: &str,
) -> Result<MagicLinkOutcome> {
    let email = normalize_email(email);

    let Some(record) = storage::lookup_credentials(pool, &email).await? else {
        return Ok(MagicLinkOutcome::AccountNotFound);
    };

    if !record.verified {
        return Ok(MagicLinkOutcome::AccountNotFound);
    }

    let token = state
        .signer()
        .issue(record.id, &email, record.session_version)?;
    Ok(MagicLinkOutcome::SignedIn { token })
}

/// Authenticate a request via the session-integrity guard.
///
/// A token whose `sv` claim no longer matches the stored session version is
/// fully unauthenticated, not merely stale; so is a token for a vanished
/// account.
pub(crate) async fn authenticate_session(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AppState,
) -> Result<Principal, ApiError> {
    let Some(raw_token) = extract_session_token(headers) else {
        return Err(ApiError::Unauthorized);
    };

    let Ok(claims) = state.signer().verify(&raw_token) else {
        return Err(ApiError::Unauthorized);
    };

    let Ok(account_id) = claims.sub.parse::<Uuid>() else {
        return Err(ApiError::Unauthorized);
    };

    match storage::lookup_session_version(pool, account_id).await? {
        Some(stored_version) if stored_version == claims.sv => Ok(Principal {
            account_id,
            email: claims.email,
        }),
        _ => Err(ApiError::Unauthorized),
    }
}

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "session"
)]
pub async fn session(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    match authenticate_session(&headers, &pool, &state).await {
        Ok(principal) => Ok((
            StatusCode::OK,
            Json(SessionResponse {
                account_id: principal.account_id.to_string(),
                email: principal.email,
            }),
        )
            .into_response()),
        // Missing or invalidated sessions read as "no session", not an error.
        Err(ApiError::Unauthorized) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(err) => Err(err),
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Session cookie cleared")
    ),
    tag = "session"
)]
pub async fn logout(state: Extension<Arc<AppState>>) -> impl IntoResponse {
    // Tokens are stateless; logout only clears the cookie and is idempotent.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, response_headers)
}

/// Revoke every outstanding session for the calling account.
#[utoipa::path(
    post,
    path = "/session/revoke-all",
    responses(
        (status = 200, description = "All sessions revoked", body = RevokeResponse),
        (status = 401, description = "Missing or invalidated session", body = ErrorBody),
        (status = 409, description = "Account no longer exists", body = ErrorBody)
    ),
    tag = "session"
)]
pub async fn revoke_all(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    // Always acts on the caller's own identity, never a third party's.
    let principal = authenticate_session(&headers, &pool, &state).await?;

    match storage::bump_session_version(&pool, principal.account_id).await? {
        Some(_) => Ok((StatusCode::OK, Json(RevokeResponse { success: true }))),
        None => Err(ApiError::Conflict("Account not found".to_string())),
    }
}

/// Build the `HttpOnly` session cookie for a freshly issued token.
fn session_cookie(config: &AppConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    // Only mark cookies secure when the frontend is served over HTTPS.
    let secure = config.session_cookie_secure();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AppConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = config.session_cookie_secure();
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        // Segments without `=` are skipped, not fatal.
        let Some((key, val)) = pair.trim().split_once('=') else {
            continue;
        };
        if key.trim() == SESSION_COOKIE_NAME {
            return Some(val.trim().to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
