//! Database helpers for credential lookup and session versions.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Account fields needed to decide a credential or magic-link sign-in.
pub(super) struct CredentialRecord {
    pub(super) id: Uuid,
    pub(super) password_hash: Option<String>,
    pub(super) verified: bool,
    pub(super) session_version: i64,
}

pub(super) async fn lookup_credentials(
    pool: &PgPool,
    email: &str,
) -> Result<Option<CredentialRecord>> {
    let query = r"
        SELECT id, password_hash, email_verified_at IS NOT NULL AS verified, session_version
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
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup credentials")?;

    Ok(row.map(|row| CredentialRecord {
        id: row.get("id"),
        password_hash: row.get("password_hash"),
        verified: row.get("verified"),
        session_version: row.get("session_version"),
    }))
}

/// Current session version for an account; `None` when the account is gone.
pub(super) async fn lookup_session_version(
    pool: &PgPool,
    account_id: Uuid,
) -> Result<Option<i64>> {
    let query = "SELECT session_version FROM accounts WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session version")?;

    Ok(row.map(|row| row.get("session_version")))
}

/// Atomically increment the session version, invalidating every token minted
/// before the increment. Returns the new version, or `None` when the account
/// is gone.
pub(super) async fn bump_session_version(pool: &PgPool, account_id: Uuid) -> Result<Option<i64>> {
    let query = r"
        UPDATE accounts
        SET session_version = session_version + 1,
            updated_at = NOW()
        WHERE id = $1
        RETURNING session_version
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to bump session version")?;

    Ok(row.map(|row| row.get("session_version")))
}
