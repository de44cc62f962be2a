//! Shared application state and configuration.

use std::sync::Arc;

use super::handlers::rate_limit::RateLimiter;
use super::handlers::session::token::SessionSigner;
use super::handlers::streams::adapter::AdapterRegistry;

const DEFAULT_CODE_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_RESEND_COOLDOWN_SECONDS: i64 = 2 * 60;
const DEFAULT_DAILY_CODE_LIMIT: i32 = 5;
const DEFAULT_QUOTA_WINDOW_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
const DEFAULT_RESOLVE_WINDOW_SECONDS: u64 = 1;
const DEFAULT_SESSION_ISSUER: &str = "streamix";

#[derive(Clone, Debug)]
pub struct AppConfig {
    frontend_base_url: String,
    code_ttl_seconds: i64,
    resend_cooldown_seconds: i64,
    daily_code_limit: i32,
    quota_window_seconds: i64,
    session_ttl_seconds: i64,
    session_issuer: String,
    resolve_window_seconds: u64,
}

impl AppConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            resend_cooldown_seconds: DEFAULT_RESEND_COOLDOWN_SECONDS,
            daily_code_limit: DEFAULT_DAILY_CODE_LIMIT,
            quota_window_seconds: DEFAULT_QUOTA_WINDOW_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_issuer: DEFAULT_SESSION_ISSUER.to_string(),
            resolve_window_seconds: DEFAULT_RESOLVE_WINDOW_SECONDS,
        }
    }

    #[must_use]
    pub fn with_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_resend_cooldown_seconds(mut self, seconds: i64) -> Self {
        self.resend_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_daily_code_limit(mut self, limit: i32) -> Self {
        self.daily_code_limit = limit;
        self
    }

    #[must_use]
    pub fn with_quota_window_seconds(mut self, seconds: i64) -> Self {
        self.quota_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_issuer(mut self, issuer: String) -> Self {
        self.session_issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_resolve_window_seconds(mut self, seconds: u64) -> Self {
        self.resolve_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn code_ttl_seconds(&self) -> i64 {
        self.code_ttl_seconds
    }

    #[must_use]
    pub fn resend_cooldown_seconds(&self) -> i64 {
        self.resend_cooldown_seconds
    }

    #[must_use]
    pub fn daily_code_limit(&self) -> i32 {
        self.daily_code_limit
    }

    #[must_use]
    pub fn quota_window_seconds(&self) -> i64 {
        self.quota_window_seconds
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_issuer(&self) -> &str {
        &self.session_issuer
    }

    #[must_use]
    pub fn resolve_window_seconds(&self) -> u64 {
        self.resolve_window_seconds
    }

    /// Only mark session cookies secure when the frontend is served over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AppState {
    config: AppConfig,
    signer: SessionSigner,
    rate_limiter: Arc<dyn RateLimiter>,
    adapters: AdapterRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: AppConfig,
        signer: SessionSigner,
        rate_limiter: Arc<dyn RateLimiter>,
        adapters: AdapterRegistry,
    ) -> Self {
        Self {
            config,
            signer,
            rate_limiter,
            adapters,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn signer(&self) -> &SessionSigner {
        &self.signer
    }

    #[must_use]
    pub fn rate_limiter(&self) -> &dyn RateLimiter {
        self.rate_limiter.as_ref()
    }

    #[must_use]
    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = AppConfig::new("http://localhost:3000".to_string());
        assert_eq!(config.frontend_base_url(), "http://localhost:3000");
        assert_eq!(config.code_ttl_seconds(), 900);
        assert_eq!(config.resend_cooldown_seconds(), 120);
        assert_eq!(config.daily_code_limit(), 5);
        assert_eq!(config.quota_window_seconds(), 86_400);
        assert_eq!(config.session_ttl_seconds(), 2_592_000);
        assert_eq!(config.session_issuer(), "streamix");
        assert_eq!(config.resolve_window_seconds(), 1);
        assert!(!config.session_cookie_secure());
    }

    #[test]
    fn config_builders_override() {
        let config = AppConfig::new("https://app.streamix.dev".to_string())
            .with_code_ttl_seconds(60)
            .with_resend_cooldown_seconds(10)
            .with_daily_code_limit(2)
            .with_quota_window_seconds(3600)
            .with_session_ttl_seconds(900)
            .with_session_issuer("streamix-test".to_string())
            .with_resolve_window_seconds(5);

        assert_eq!(config.code_ttl_seconds(), 60);
        assert_eq!(config.resend_cooldown_seconds(), 10);
        assert_eq!(config.daily_code_limit(), 2);
        assert_eq!(config.quota_window_seconds(), 3600);
        assert_eq!(config.session_ttl_seconds(), 900);
        assert_eq!(config.session_issuer(), "streamix-test");
        assert_eq!(config.resolve_window_seconds(), 5);
        assert!(config.session_cookie_secure());
    }

    #[test]
    fn cooldown_stays_inside_code_ttl() {
        let config = AppConfig::new("http://localhost:3000".to_string());
        assert!(config.resend_cooldown_seconds() < config.code_ttl_seconds());
    }
}
