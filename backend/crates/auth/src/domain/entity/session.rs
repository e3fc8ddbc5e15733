//! Session Entity
//!
//! Server-side session state, keyed by an opaque random identifier that
//! travels in the session cookie. Application values and flash values are
//! free-form JSON; the keys the security machinery relies on (client
//! fingerprint, last ID rotation, CSRF token) are typed fields so that
//! application code cannot clobber them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entity::csrf_token::CsrfToken;

/// Number of random bytes in a session ID (hex-encoded to 64 chars)
pub const SESSION_ID_BYTES: usize = 32;

/// Session key marking an authenticated session
pub const AUTHENTICATED_KEY: &str = "authenticated";

/// Session key holding the authenticated username
pub const USERNAME_KEY: &str = "username";

/// Opaque session identifier
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh identifier from the OS CSPRNG
    pub fn generate() -> Self {
        Self(platform::crypto::random_hex(SESSION_ID_BYTES))
    }

    /// Parse an identifier presented by a client.
    ///
    /// Anything other than exactly 64 lowercase hex characters is rejected,
    /// so malformed cookies are indistinguishable from absent ones.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == SESSION_ID_BYTES * 2
            && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));

        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix suitable for log lines
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}..)", self.short())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything stored under one session ID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Application key/value pairs
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
    /// One-shot values, removed on first read
    #[serde(default)]
    pub flash: BTreeMap<String, Value>,
    /// Hex SHA-256 of the User-Agent that owns the session
    #[serde(default)]
    pub fingerprint: Option<String>,
    /// Unix seconds of the last ID rotation
    #[serde(default)]
    pub regenerated_at: Option<i64>,
    /// Current CSRF token
    #[serde(default)]
    pub csrf: Option<CsrfToken>,
}

impl SessionData {
    /// Whether the ID is due for rotation at `now` (unix seconds)
    pub fn needs_rotation_at(&self, now: i64, interval: Duration) -> bool {
        match self.regenerated_at {
            None => true,
            Some(at) => now - at > interval.num_seconds(),
        }
    }

    /// Drop application values and flash, keep the system fields
    pub fn clear_application_keys(&mut self) {
        self.values.clear();
        self.flash.clear();
    }
}

/// A persisted session
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: SessionId,
    pub data: SessionData,
    /// Expiration (unix seconds)
    pub expires_at: i64,
}

impl SessionRecord {
    /// Create a record that lives for `ttl` from now
    ///
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(id: SessionId, data: SessionData, ttl: Duration) -> Self {
        Self {
            id,
            data,
            expires_at: Utc::now()
                .checked_add_signed(ttl)
                .map_or(i64::MAX, |at| at.timestamp()),
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Check if session has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}
