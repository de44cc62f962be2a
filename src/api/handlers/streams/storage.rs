//! Database lookup for stream records.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// A stream row as stored. `provider_config` stays opaque until an adapter
/// interprets it.
pub(super) struct StreamRecord {
    pub(super) id: Uuid,
    pub(super) name: String,
    pub(super) active: bool,
    pub(super) provider_type: String,
    pub(super) provider_config: serde_json::Value,
}

/// Fetch a stream by its public viewing token, matched exactly.
pub(super) async fn lookup_stream_by_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<StreamRecord>> {
    let query = r"
        SELECT id, name, is_active, provider_type, provider_config
        FROM streams
        WHERE token = $1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup stream")?;

    Ok(row.map(|row| StreamRecord {
        id: row.get("id"),
        name: row.get("name"),
        active: row.get("is_active"),
        provider_type: row.get("provider_type"),
        provider_config: row.get("provider_config"),
    }))
}
