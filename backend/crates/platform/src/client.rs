//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers.

use axum::http::{HeaderMap, header};

use crate::crypto::sha256;

/// Client fingerprint derived from request headers
///
/// Used to bind sessions to specific clients and detect session hijacking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFingerprint {
    /// SHA-256 hash of the User-Agent header
    pub hash: [u8; 32],
    /// Original User-Agent string (for logging)
    pub user_agent: String,
}

impl ClientFingerprint {
    /// Fingerprint a raw User-Agent string
    pub fn from_user_agent(user_agent: &str) -> Self {
        Self {
            hash: sha256(user_agent.as_bytes()),
            user_agent: user_agent.to_string(),
        }
    }

    /// Hash as lowercase hex (the form stored in session data)
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

/// Extract client fingerprint from request headers
///
/// A missing or non-ASCII User-Agent fingerprints as the empty string, so
/// clients that never send one still get a stable fingerprint.
pub fn extract_fingerprint(headers: &HeaderMap) -> ClientFingerprint {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    ClientFingerprint::from_user_agent(user_agent)
}

/// Whether the caller expects a JSON response rather than a page
///
/// True for `X-Requested-With: XMLHttpRequest` or an `Accept` header that
/// mentions `application/json`.
pub fn expects_json(headers: &HeaderMap) -> bool {
    let requested_with = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "XMLHttpRequest");

    let accepts_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    requested_with || accepts_json
}
