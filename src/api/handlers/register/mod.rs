//! Registration and email verification endpoints.
//!
//! `POST /register` creates (or re-registers) an unverified account and
//! issues a 6-digit one-time code; `POST /register/resend` re-issues the code
//! for an existing unverified account; `POST /register/verify` consumes the
//! code and marks the account verified.
//!
//! Issuance is guarded twice: a rolling 24-hour quota of codes per email and a
//! cooldown between consecutive codes. Both are checked before anything is
//! written; the account upsert, quota increment, code replacement, and outbox
//! enqueue then share one transaction, so at most one live code exists per
//! email at any point.

pub(crate) mod password;
mod storage;
pub(crate) mod types;


use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use rand::{rngs::OsRng, Rng};
use sqlx::PgPool;
use std::sync::Arc;

use super::{normalize_email, valid_email};
use crate::api::error::{ApiError, ErrorBody};
use crate::api::state::AppState;
use password::{hash_password, strong_password, STRENGTH_MESSAGE};
use storage::{IssueOutcome, QuotaOutcome, VerifyOutcome};
use types::{MessageResponse, RegisterRequest, ResendRequest, VerifyRequest};

const DAILY_LIMIT_MESSAGE: &str = "Daily limit exceeded. Please try again tomorrow.";

/// Generate a six digit verification code, uniform over 100000..=999999.
fn generate_code() -> String {
    OsRng.gen_range(100_000u32..=999_999).to_string()
}

fn cooldown_message(wait_seconds: i64) -> String {
    format!("Please wait {wait_seconds}s before resending.")
}

/// Register a new account (or re-register an unverified one) and send a
/// verification code.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification code sent", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Email already registered and verified", body = ErrorBody),
        (status = 429, description = "Cooldown or daily quota hit", body = ErrorBody)
    ),
    tag = "register"
)]
pub async fn register(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::Validation("Missing fields".to_string()));
    }

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    if !strong_password(&request.password) {
        return Err(ApiError::Validation(STRENGTH_MESSAGE.to_string()));
    }

    // Format and strength errors surface before any account-state checks.
    if let Some(account) = storage::lookup_account(&pool, &email).await? {
        if account.verified {
            return Err(ApiError::Conflict("User already exists".to_string()));
        }
    }

    if let QuotaOutcome::Limited = storage::quota_check(&pool, &email, state.config()).await? {
        return Err(ApiError::RateLimited(DAILY_LIMIT_MESSAGE.to_string()));
    }

    if let Some(wait_seconds) = storage::cooldown_remaining(&pool, &email, state.config()).await? {
        return Err(ApiError::RateLimited(cooldown_message(wait_seconds)));
    }

    let password_hash = hash_password(&request.password)?;
    let code = generate_code();

    match storage::issue_code(&pool, &email, Some(&password_hash), &code, state.config()).await? {
        IssueOutcome::Issued => Ok((
            StatusCode::CREATED,
            Json(MessageResponse {
                message: "User created".to_string(),
            }),
        )),
        IssueOutcome::Conflict => Err(ApiError::Conflict("User already exists".to_string())),
    }
}

/// Re-issue the verification code for an unverified account.
#[utoipa::path(
    post,
    path = "/register/resend",
    request_body = ResendRequest,
    responses(
        (status = 200, description = "Verification code sent", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "No account for this email", body = ErrorBody),
        (status = 409, description = "Account already verified", body = ErrorBody),
        (status = 429, description = "Cooldown or daily quota hit", body = ErrorBody)
    ),
    tag = "register"
)]
pub async fn resend(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ResendRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    if request.email.trim().is_empty() {
        return Err(ApiError::Validation("Missing email".to_string()));
    }

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    match storage::lookup_account(&pool, &email).await? {
        None => return Err(ApiError::NotFound("User not found".to_string())),
        Some(account) if account.verified => {
            return Err(ApiError::Conflict("User already verified".to_string()));
        }
        Some(_) => {}
    }

    if let QuotaOutcome::Limited = storage::quota_check(&pool, &email, state.config()).await? {
        return Err(ApiError::RateLimited(DAILY_LIMIT_MESSAGE.to_string()));
    }

    if let Some(wait_seconds) = storage::cooldown_remaining(&pool, &email, state.config()).await? {
        return Err(ApiError::RateLimited(cooldown_message(wait_seconds)));
    }

    let code = generate_code();

    match storage::issue_code(&pool, &email, None, &code, state.config()).await? {
        IssueOutcome::Issued => Ok((
            StatusCode::OK,
            Json(MessageResponse {
                message: "Code sent".to_string(),
            }),
        )),
        IssueOutcome::Conflict => Err(ApiError::Conflict("User already verified".to_string())),
    }
}

/// Consume a verification code and mark the account verified.
#[utoipa::path(
    post,
    path = "/register/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Account verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired code", body = ErrorBody),
        (status = 409, description = "Account already verified or gone", body = ErrorBody)
    ),
    tag = "register"
)]
pub async fn verify(
    pool: Extension<PgPool>,
    payload: Option<Json<VerifyRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let code = request.code.trim();
    if request.email.trim().is_empty() || code.is_empty() {
        return Err(ApiError::Validation("Missing fields".to_string()));
    }

    let email = normalize_email(&request.email);

    match storage::verify_code(&pool, &email, code).await? {
        VerifyOutcome::Verified => Ok((
            StatusCode::OK,
            Json(MessageResponse {
                message: "Account verified".to_string(),
            }),
        )),
        VerifyOutcome::InvalidCode => Err(ApiError::InvalidCode),
        VerifyOutcome::CodeExpired => Err(ApiError::CodeExpired),
        VerifyOutcome::Conflict => Err(ApiError::Conflict("User already verified".to_string())),
    }
}
