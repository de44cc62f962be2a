//! OpenAPI document assembled from the annotated handlers.
//!
//! Add new endpoints to `paths(...)` and their request/response bodies to
//! `components(schemas(...))`; `/` and `OPTIONS /health` are intentionally
//! undocumented.

use super::error::ErrorBody;
use super::handlers::health::{Health, __path_health};
use super::handlers::register::types::{
    MessageResponse, RegisterRequest, ResendRequest, VerifyRequest,
};
use super::handlers::register::{__path_register, __path_resend, __path_verify};
use super::handlers::session::types::{
    LoginRequest, LoginResponse, RevokeResponse, SessionResponse,
};
use super::handlers::session::{__path_login, __path_logout, __path_revoke_all, __path_session};
use super::handlers::streams::__path_resolve;
use super::handlers::streams::adapter::{PlaybackInfo, PlaybackKind};
use super::handlers::streams::types::{ResolveRequest, ResolveResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        register,
        resend,
        verify,
        login,
        logout,
        session,
        revoke_all,
        resolve
    ),
    components(schemas(
        Health,
        ErrorBody,
        RegisterRequest,
        ResendRequest,
        VerifyRequest,
        MessageResponse,
        LoginRequest,
        LoginResponse,
        SessionResponse,
        RevokeResponse,
        ResolveRequest,
        ResolveResponse,
        PlaybackInfo,
        PlaybackKind
    )),
    tags(
        (name = "register", description = "Account registration and email verification"),
        (name = "session", description = "Sign-in, introspection, and revocation"),
        (name = "streams", description = "Viewing-token resolution"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn openapi_covers_documented_routes() {
        let spec = openapi();
        for path in [
            "/health",
            "/register",
            "/register/resend",
            "/register/verify",
            "/login",
            "/logout",
            "/session",
            "/session/revoke-all",
            "/streams/resolve",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing path {path}");
        }

        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "register"));
        assert!(tags.iter().any(|tag| tag.name == "streams"));
    }
}
