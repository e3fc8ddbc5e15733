//! CSRF Token Entity

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use platform::crypto::{constant_time_eq, random_hex};

/// Random bytes per token (hex-encoded to 64 chars)
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Synchronizer token stored in the session
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfToken {
    pub value: String,
    /// Issue time (unix seconds)
    pub issued_at: i64,
}

impl CsrfToken {
    /// Issue a fresh token stamped with the current time
    pub fn issue() -> Self {
        Self {
            value: random_hex(CSRF_TOKEN_BYTES),
            issued_at: Utc::now().timestamp(),
        }
    }

    pub fn is_expired_at(&self, now: i64, lifetime: Duration) -> bool {
        now - self.issued_at > lifetime.num_seconds()
    }

    pub fn is_expired(&self, lifetime: Duration) -> bool {
        self.is_expired_at(Utc::now().timestamp(), lifetime)
    }

    /// Constant-time comparison against a submitted value
    pub fn matches(&self, candidate: &str) -> bool {
        constant_time_eq(self.value.as_bytes(), candidate.as_bytes())
    }
}

impl std::fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfToken")
            .field("value", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}
