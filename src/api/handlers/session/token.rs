//! Stateless session tokens stamped with the account's session version.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Claims carried by a session JWT.
///
/// `sv` is the account's session version at issue time. Signature and expiry
/// validation alone never authenticate a request; the guard re-reads the
/// stored version on every use and rejects the token on mismatch.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub sv: i64,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// HS256 signer/verifier for session tokens.
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl_seconds: i64,
}

impl SessionSigner {
    #[must_use]
    pub fn new(secret: &[u8], issuer: String, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer,
            ttl_seconds,
        }
    }

    /// Issue a token for the account stamped with its current session version.
    pub fn issue(&self, account_id: Uuid, email: &str, session_version: i64) -> Result<String> {
        let now = unix_now();
        let claims = SessionClaims {
            sub: account_id.to_string(),
            email: email.to_string(),
            sv: session_version,
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
            iss: self.issuer.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding).context("failed to sign session token")
    }

    /// Decode a token and validate its signature, expiry, and issuer.
    ///
    /// The `sv` claim is not checked here; callers must compare it against the
    /// account's stored session version.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[self.issuer.as_str()]);
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)
            .context("invalid session token")?;
        Ok(data.claims)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
