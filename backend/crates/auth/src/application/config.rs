//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::{AES_256_KEY_LEN, constant_time_eq, random_bytes};
use platform::password::HashedPassword;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Longest lifetime any session, token or cookie may be configured with (ten years)
pub const MAX_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session: SessionConfig,
    pub csrf: CsrfConfig,
    pub remember: RememberConfig,
    pub api: ApiKeyConfig,
    pub credentials: Credentials,
    /// Where unauthenticated browsers are sent
    pub login_path: String,
    /// Where a successful login lands
    pub home_path: String,
}

impl AuthConfig {
    /// Create config with a random remember-me key (for development)
    pub fn with_random_key() -> Self {
        let mut key = [0u8; AES_256_KEY_LEN];
        key.copy_from_slice(&random_bytes(AES_256_KEY_LEN));

        let mut config = Self::default();
        config.remember.encryption_key = Some(key);
        config
    }

    /// Create config for development (insecure cookies)
    pub fn development() -> Self {
        let mut config = Self::with_random_key();
        config.session.cookie_secure = false;
        config.remember.cookie_secure = false;
        config
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            csrf: CsrfConfig::default(),
            remember: RememberConfig::default(),
            api: ApiKeyConfig::default(),
            credentials: Credentials::default(),
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
        }
    }
}

/// Session cookie and lifetime settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Idle lifetime; store TTL and cookie Max-Age
    pub lifetime: Duration,
    /// Maximum age of a session ID before it is rotated
    pub rotation_interval: Duration,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "inventory_session".to_string(),
            lifetime: Duration::from_secs(120 * 60), // 2 hours
            rotation_interval: Duration::from_secs(1800), // 30 minutes
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
        }
    }
}

impl SessionConfig {
    pub fn lifetime(&self) -> chrono::Duration {
        to_chrono(self.lifetime)
    }

    pub fn rotation_interval(&self) -> chrono::Duration {
        to_chrono(self.rotation_interval)
    }

    pub fn cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: self.cookie_http_only,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(clamp(self.lifetime).as_secs() as i64),
        }
    }
}

/// CSRF token settings
#[derive(Debug, Clone)]
pub struct CsrfConfig {
    /// Form field / header name carrying the token
    pub token_name: String,
    pub token_lifetime: Duration,
    /// Issue a new token after every successful gate validation
    pub rotate_on_validate: bool,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_name: "_csrf_token".to_string(),
            token_lifetime: Duration::from_secs(3600), // 1 hour
            rotate_on_validate: false,
        }
    }
}

impl CsrfConfig {
    pub fn token_lifetime(&self) -> chrono::Duration {
        to_chrono(self.token_lifetime)
    }
}

/// Remember-me cookie settings
#[derive(Clone)]
pub struct RememberConfig {
    pub cookie_name: String,
    pub lifetime: Duration,
    /// AES-256 / HMAC key; `None` disables remember-me
    pub encryption_key: Option<[u8; AES_256_KEY_LEN]>,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
}

impl Default for RememberConfig {
    fn default() -> Self {
        Self {
            cookie_name: "inventory_remember".to_string(),
            lifetime: Duration::from_secs(30 * 24 * 3600), // 30 days
            encryption_key: None,
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
        }
    }
}

impl RememberConfig {
    pub fn cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: self.cookie_http_only,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(clamp(self.lifetime).as_secs() as i64),
        }
    }
}

impl std::fmt::Debug for RememberConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RememberConfig")
            .field("cookie_name", &self.cookie_name)
            .field("lifetime", &self.lifetime)
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_http_only", &self.cookie_http_only)
            .field("cookie_same_site", &self.cookie_same_site)
            .finish()
    }
}

/// API-key allow-list
#[derive(Clone, Default)]
pub struct ApiKeyConfig {
    /// Accepted keys; empty rejects every request
    pub keys: Vec<String>,
}

impl ApiKeyConfig {
    /// Parse a comma-separated list, dropping blank entries
    pub fn from_csv(raw: &str) -> Self {
        Self {
            keys: raw
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Allow-list membership; blank candidates and empty lists never pass
    pub fn accepts(&self, candidate: Option<&str>) -> bool {
        let Some(candidate) = candidate.filter(|c| !c.is_empty()) else {
            return false;
        };

        // Compare against every key so timing does not reveal the match position
        self.keys.iter().fold(false, |found, key| {
            constant_time_eq(key.as_bytes(), candidate.as_bytes()) | found
        })
    }
}

impl std::fmt::Debug for ApiKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyConfig")
            .field("keys", &format!("[{} REDACTED]", self.keys.len()))
            .finish()
    }
}

/// The single configured account
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    /// Argon2id PHC hash; `None` rejects every login and remember token
    pub password_hash: Option<HashedPassword>,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password_hash: None,
        }
    }
}

fn clamp(duration: Duration) -> Duration {
    duration.min(MAX_LIFETIME)
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    let secs = i64::try_from(clamp(duration).as_secs()).unwrap_or(i64::MAX);
    chrono::TimeDelta::try_seconds(secs).unwrap_or(chrono::TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.session.cookie_name, "inventory_session");
        assert_eq!(config.session.lifetime, Duration::from_secs(7200));
        assert_eq!(config.csrf.token_name, "_csrf_token");
        assert!(!config.csrf.rotate_on_validate);
        assert_eq!(config.remember.cookie_name, "inventory_remember");
        assert!(config.remember.encryption_key.is_none());
        assert!(config.api.keys.is_empty());
        assert_eq!(config.credentials.username, "admin");
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.home_path, "/");
    }

    #[test]
    fn test_development_config() {
        let config = AuthConfig::development();
        assert!(!config.session.cookie_secure);
        assert!(!config.remember.cookie_secure);
        assert!(config.remember.encryption_key.is_some());
    }

    #[test]
    fn test_session_cookie_max_age() {
        let cookie = SessionConfig::default().cookie();
        assert_eq!(cookie.max_age_secs, Some(7200));
        assert_eq!(cookie.name, "inventory_session");
    }

    #[test]
    fn test_oversized_lifetimes_are_clamped() {
        let session = SessionConfig {
            lifetime: Duration::from_secs(u64::MAX / 2),
            ..SessionConfig::default()
        };
        assert_eq!(session.lifetime(), to_chrono(MAX_LIFETIME));
        assert_eq!(
            session.cookie().max_age_secs,
            Some(MAX_LIFETIME.as_secs() as i64)
        );

        let csrf = CsrfConfig {
            token_lifetime: Duration::MAX,
            ..CsrfConfig::default()
        };
        assert_eq!(csrf.token_lifetime().num_seconds(), MAX_LIFETIME.as_secs() as i64);
    }

    #[test]
    fn test_remember_cookie_max_age() {
        let cookie = RememberConfig::default().cookie();
        assert_eq!(cookie.max_age_secs, Some(30 * 86400));
    }

    #[test]
    fn test_api_keys_from_csv() {
        let api = ApiKeyConfig::from_csv(" alpha, ,beta,,");
        assert_eq!(api.keys, vec!["alpha".to_string(), "beta".to_string()]);
        assert!(ApiKeyConfig::from_csv("").keys.is_empty());
    }

    #[test]
    fn test_api_key_accepts() {
        let api = ApiKeyConfig::from_csv("alpha,beta");
        assert!(api.accepts(Some("alpha")));
        assert!(api.accepts(Some("beta")));
        assert!(!api.accepts(Some("gamma")));
        assert!(!api.accepts(Some("alph")));
        assert!(!api.accepts(Some("")));
        assert!(!api.accepts(None));
    }

    #[test]
    fn test_empty_allow_list_rejects_everything() {
        let api = ApiKeyConfig::default();
        assert!(!api.accepts(Some("alpha")));
        assert!(!api.accepts(Some("")));
        assert!(!api.accepts(None));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AuthConfig::development();
        let debug = format!("{:?}", config);
        assert!(debug.contains("REDACTED"));
    }
}
