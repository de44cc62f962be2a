//! Stream resolution: token lookup, activity gate, adapter dispatch.

use sqlx::PgPool;

use super::adapter::{AdapterRegistry, ProviderKind};
use super::storage;
use super::types::ResolveResponse;
use crate::api::error::ApiError;

/// Resolve a viewing token into a playback descriptor.
///
/// The resolver owns lookup and the activity gate; everything URL-shaped is
/// the adapter's business. An inactive stream is reported distinctly from an
/// unknown one.
pub(super) async fn resolve_stream(
    pool: &PgPool,
    registry: &AdapterRegistry,
    token: &str,
) -> Result<ResolveResponse, ApiError> {
    let Some(record) = storage::lookup_stream_by_token(pool, token).await? else {
        return Err(ApiError::NotFound("Stream not found".to_string()));
    };

    if !record.active {
        return Err(ApiError::Inactive(
            "Stream is currently inactive".to_string(),
        ));
    }

    let kind = ProviderKind::parse(&record.provider_type)
        .map_err(|err| ApiError::Provider(err.to_string()))?;
    let Some(adapter) = registry.get(kind) else {
        return Err(ApiError::Provider(format!(
            "No adapter registered for provider type: {}",
            kind.as_str()
        )));
    };

    let playback = adapter
        .playback_info(&record.provider_config)
        .map_err(|err| ApiError::Provider(err.to_string()))?;

    Ok(ResolveResponse {
        id: record.id.to_string(),
        name: record.name,
        playback,
    })
}
