//! # Streamix (Account Verification & Stream Resolution)
//!
//! `streamix` is the backend for a gated video-streaming product. It owns
//! account registration with one-time-code email verification, session
//! integrity, and resolution of opaque viewing tokens into playable stream
//! URLs.
//!
//! ## Registration & Verification
//!
//! Accounts register with email+password and stay unusable until the email is
//! proven with a 6-digit one-time code. Issuance is guarded by a per-email
//! cooldown and a rolling 24-hour quota. An unverified email may re-register
//! (overwriting its password) to recover from a lost code; verified emails are
//! immutable to this flow, which protects them from squatting.
//!
//! - **Email normalization:** emails are trimmed and lowercased before every
//!   lookup or write, so `User@Example.com` and `user@example.com` are the
//!   same account.
//! - **Single live code:** at most one verification code exists per email;
//!   issuing a new one atomically replaces any prior code.
//!
//! ## Session Integrity
//!
//! Sessions are HS256 tokens stamped with the account's current session
//! version. Every authenticated request re-reads the stored version; a
//! mismatch means the request is unauthenticated. `POST /session/revoke-all`
//! bumps the version, invalidating every outstanding token for the account in
//! O(1) with no session table.
//!
//! ## Stream Resolution
//!
//! `POST /streams/resolve` maps a public stream token to a playback
//! descriptor through a provider-adapter registry. Adding a delivery
//! mechanism means registering a new adapter, never touching the resolver.

pub mod api;
pub mod cli;

#[cfg(test)]
mod test_support;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
