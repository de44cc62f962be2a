//! Database helpers for registration, code issuance, and verification.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::api::email::{verification_payload, VERIFY_CODE_TEMPLATE};
use crate::api::state::AppConfig;

/// Outcome of the daily-quota gate.
#[derive(Debug)]
pub(super) enum QuotaOutcome {
    Allowed,
    Limited,
}

/// Outcome of a code issuance attempt.
#[derive(Debug)]
pub(super) enum IssueOutcome {
    Issued,
    /// The account is verified (or became verified concurrently); issuance
    /// refuses to touch it.
    Conflict,
}

/// Outcome of a verify attempt.
#[derive(Debug)]
pub(super) enum VerifyOutcome {
    Verified,
    InvalidCode,
    CodeExpired,
    /// The code was claimed but the account was already verified or gone.
    Conflict,
}

/// Account fields the registration flow decides on.
pub(super) struct AccountRecord {
    pub(super) id: Uuid,
    pub(super) verified: bool,
}

pub(super) async fn lookup_account(pool: &PgPool, email: &str) -> Result<Option<AccountRecord>> {
    let query = "SELECT id, email_verified_at IS NOT NULL AS verified FROM accounts WHERE email = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account")?;

    Ok(row.map(|row| AccountRecord {
        id: row.get("id"),
        verified: row.get("verified"),
    }))
}

/// Daily-quota check. Missing accounts are always allowed (a first request is
/// never capped); an elapsed window is allowed regardless of the counter, the
/// reset itself happens lazily in the issuance transaction.
pub(super) async fn quota_check(
    pool: &PgPool,
    email: &str,
    config: &AppConfig,
) -> Result<QuotaOutcome> {
    let query = r"
        SELECT verification_request_count,
               (NOW() - verification_window_start) > ($2 * INTERVAL '1 second') AS window_elapsed
        FROM accounts
        WHERE email = $1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(config.quota_window_seconds())
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check verification quota")?;

    let Some(row) = row else {
        return Ok(QuotaOutcome::Allowed);
    };

    let window_elapsed: bool = row.get("window_elapsed");
    if window_elapsed {
        return Ok(QuotaOutcome::Allowed);
    }

    let count: i32 = row.get("verification_request_count");
    if count >= config.daily_code_limit() {
        return Ok(QuotaOutcome::Limited);
    }

    Ok(QuotaOutcome::Allowed)
}

/// Remaining cooldown for the email's live code, if one is still cooling down.
///
/// The wait is computed SQL-side against the same clock that stamped
/// `created_at`, rounded up to whole seconds.
pub(super) async fn cooldown_remaining(
    pool: &PgPool,
    email: &str,
    config: &AppConfig,
) -> Result<Option<i64>> {
    let query = r"
        SELECT CEIL(EXTRACT(EPOCH FROM (created_at + ($2 * INTERVAL '1 second') - NOW())))::BIGINT AS wait_seconds
        FROM verification_codes
        WHERE email = $1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(config.resend_cooldown_seconds())
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check resend cooldown")?;

    Ok(row
        .map(|row| row.get::<i64, _>("wait_seconds"))
        .filter(|wait_seconds| *wait_seconds > 0))
}

/// Issue a verification code in one transaction: upsert the account (when a
/// password hash is supplied), apply the quota increment, replace any live
/// code, and enqueue the verification email.
///
/// The quota increment doubles as the verified/existence guard: it only
/// matches unverified rows, so issuance can never race a concurrent
/// verification into a bad state.
pub(super) async fn issue_code(
    pool: &PgPool,
    email: &str,
    password_hash: Option<&str>,
    code: &str,
    config: &AppConfig,
) -> Result<IssueOutcome> {
    let mut tx = pool.begin().await.context("begin issuance transaction")?;

    if let Some(password_hash) = password_hash {
        let query = r"
            INSERT INTO accounts (email, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE
            SET password_hash = EXCLUDED.password_hash,
                updated_at = NOW()
            WHERE accounts.email_verified_at IS NULL
            RETURNING id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(password_hash)
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await
            .context("failed to upsert account")?;

        if row.is_none() {
            // The conditional upsert refused a verified row.
            let _ = tx.rollback().await;
            return Ok(IssueOutcome::Conflict);
        }
    }

    let query = r"
        UPDATE accounts
        SET verification_request_count = CASE
                WHEN (NOW() - verification_window_start) > ($2 * INTERVAL '1 second') THEN 1
                ELSE verification_request_count + 1
            END,
            verification_window_start = CASE
                WHEN (NOW() - verification_window_start) > ($2 * INTERVAL '1 second') THEN NOW()
                ELSE verification_window_start
            END,
            updated_at = NOW()
        WHERE email = $1
          AND email_verified_at IS NULL
        RETURNING id
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(config.quota_window_seconds())
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to increment verification quota")?;

    if row.is_none() {
        let _ = tx.rollback().await;
        return Ok(IssueOutcome::Conflict);
    }

    let query = "DELETE FROM verification_codes WHERE email = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to delete superseded codes")?;

    let query = r"
        INSERT INTO verification_codes (email, code, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(code)
        .bind(config.code_ttl_seconds())
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to insert verification code")?;

    let payload_text = verification_payload(email, code)?;
    let query = r"
        INSERT INTO email_outbox (to_email, template, payload_json)
        VALUES ($1, $2, $3::jsonb)
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(VERIFY_CODE_TEMPLATE)
        .bind(payload_text)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to insert email outbox row")?;

    tx.commit().await.context("commit issuance transaction")?;

    Ok(IssueOutcome::Issued)
}

/// Consume a verification code and mark the account verified.
///
/// The in-transaction delete is keyed on the exact (email, code) pair: of two
/// concurrent verifies only one claims the row, and a code superseded between
/// lookup and delete claims nothing.
pub(super) async fn verify_code(pool: &PgPool, email: &str, code: &str) -> Result<VerifyOutcome> {
    let query = "SELECT expires_at < NOW() AS expired FROM verification_codes WHERE email = $1 AND code = $2";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(code)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup verification code")?;

    let Some(row) = row else {
        return Ok(VerifyOutcome::InvalidCode);
    };

    let expired: bool = row.get("expired");
    if expired {
        // The stale row stays in place; the next issuance clears it.
        return Ok(VerifyOutcome::CodeExpired);
    }

    let mut tx = pool.begin().await.context("begin verify transaction")?;

    let query = "DELETE FROM verification_codes WHERE email = $1 AND code = $2";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let deleted = sqlx::query(query)
        .bind(email)
        .bind(code)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to consume verification code")?;

    if deleted.rows_affected() == 0 {
        let _ = tx.rollback().await;
        return Ok(VerifyOutcome::InvalidCode);
    }

    let query = r"
        UPDATE accounts
        SET email_verified_at = NOW(),
            updated_at = NOW()
        WHERE email = $1
          AND email_verified_at IS NULL
        RETURNING id
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to mark account verified")?;

    if row.is_none() {
        let _ = tx.rollback().await;
        return Ok(VerifyOutcome::Conflict);
    }

    tx.commit().await.context("commit verify transaction")?;

    Ok(VerifyOutcome::Verified)
}
