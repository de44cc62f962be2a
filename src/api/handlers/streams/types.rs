//! Wire types for stream resolution.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::adapter::PlaybackInfo;

/// Resolve request carrying the public viewing token.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResolveRequest {
    pub token: String,
}

/// Resolved stream and its playback descriptor.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResolveResponse {
    pub id: String,
    pub name: String,
    pub playback: PlaybackInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::streams::adapter::PlaybackKind;
    use anyhow::Result;

    #[test]
    fn resolve_response_uses_wire_field_names() -> Result<()> {
        let response = ResolveResponse {
            id: "stream-id".to_string(),
            name: "Launch Day".to_string(),
            playback: PlaybackInfo {
                url: "https://cdn.example.com/live.m3u8".to_string(),
                kind: PlaybackKind::Hls,
                headers: None,
            },
        };

        let value = serde_json::to_value(&response)?;
        assert_eq!(value["playback"]["type"], "hls");
        assert_eq!(value["playback"]["url"], "https://cdn.example.com/live.m3u8");
        // Absent headers stay off the wire entirely.
        assert!(value["playback"].get("headers").is_none());
        Ok(())
    }

    #[test]
    fn resolve_request_round_trips() -> Result<()> {
        let request: ResolveRequest = serde_json::from_str(r#"{"token":"tok_4f1a"}"#)?;
        assert_eq!(request.token, "tok_4f1a");
        Ok(())
    }
}
