//! Environment configuration
//!
//! Everything is read once at startup. Missing optional values fall back to
//! `AuthConfig::default()`; malformed values abort startup.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::config::{ApiKeyConfig, AuthConfig, MAX_LIFETIME};
use base64::Engine;
use base64::engine::general_purpose;
use platform::crypto::AES_256_KEY_LEN;
use platform::password::HashedPassword;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Server settings
#[derive(Debug)]
pub struct ServerConfig {
    pub auth: AuthConfig,
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut auth = AuthConfig::default();

        auth.remember.encryption_key = match var("APP_KEY") {
            Some(raw) => Some(decode_app_key(&raw)?),
            None => {
                tracing::warn!("APP_KEY not set, remember-me cookies are disabled");
                None
            }
        };

        if let Some(username) = var("AUTH_USERNAME") {
            auth.credentials.username = username;
        }
        auth.credentials.password_hash = var("AUTH_PASSWORD_HASH")
            .map(|hash| HashedPassword::from_phc_string(hash))
            .transpose()
            .context("AUTH_PASSWORD_HASH is not a valid PHC string")?;
        if auth.credentials.password_hash.is_none() {
            tracing::warn!("AUTH_PASSWORD_HASH not set, every login will be refused");
        }

        auth.api = ApiKeyConfig::from_csv(&var("API_KEYS").unwrap_or_default());

        if let Some(name) = var("SESSION_NAME") {
            auth.session.cookie_name = name;
        }
        if let Some(minutes) = parse_var::<u64>("SESSION_LIFETIME")? {
            auth.session.lifetime = lifetime("SESSION_LIFETIME", minutes, SECS_PER_MINUTE)?;
        }
        if let Some(days) = parse_var::<u64>("COOKIE_LIFETIME")? {
            auth.remember.lifetime = lifetime("COOKIE_LIFETIME", days, SECS_PER_DAY)?;
        }
        if let Some(secure) = parse_bool("COOKIE_SECURE")? {
            auth.session.cookie_secure = secure;
            auth.remember.cookie_secure = secure;
        }
        if let Some(http_only) = parse_bool("COOKIE_HTTPONLY")? {
            auth.session.cookie_http_only = http_only;
            auth.remember.cookie_http_only = http_only;
        }

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR is not a socket address")?;

        Ok(Self {
            auth,
            database_url: var("DATABASE_URL"),
            bind_addr,
        })
    }
}

/// Non-empty environment variable
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(name)
        .map(|raw| raw.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("{name} is not a valid number"))
}

fn parse_bool(name: &str) -> anyhow::Result<Option<bool>> {
    let Some(raw) = var(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => bail!("{name} must be a boolean, got {other:?}"),
    }
}

/// `amount` units of `unit_secs`, between one unit and `MAX_LIFETIME`
fn lifetime(name: &str, amount: u64, unit_secs: u64) -> anyhow::Result<Duration> {
    let max_amount = MAX_LIFETIME.as_secs() / unit_secs;
    match amount.checked_mul(unit_secs) {
        Some(secs) if (1..=max_amount).contains(&amount) => Ok(Duration::from_secs(secs)),
        _ => bail!("{name} must be between 1 and {max_amount}, got {amount}"),
    }
}

/// Base64 key, optionally prefixed with `base64:`
fn decode_app_key(raw: &str) -> anyhow::Result<[u8; AES_256_KEY_LEN]> {
    let encoded = raw.trim();
    let encoded = encoded.strip_prefix("base64:").unwrap_or(encoded);

    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .context("APP_KEY is not valid base64")?;

    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| {
            anyhow::anyhow!(
                "APP_KEY must decode to {AES_256_KEY_LEN} bytes, got {}",
                bytes.len()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetime_range() {
        assert_eq!(
            lifetime("SESSION_LIFETIME", 120, SECS_PER_MINUTE).unwrap(),
            Duration::from_secs(7200)
        );
        assert_eq!(
            lifetime("COOKIE_LIFETIME", 30, SECS_PER_DAY).unwrap(),
            Duration::from_secs(30 * 86400)
        );

        let max_days = MAX_LIFETIME.as_secs() / SECS_PER_DAY;
        assert!(lifetime("COOKIE_LIFETIME", max_days, SECS_PER_DAY).is_ok());
        assert!(lifetime("COOKIE_LIFETIME", max_days + 1, SECS_PER_DAY).is_err());
        assert!(lifetime("SESSION_LIFETIME", 0, SECS_PER_MINUTE).is_err());

        // Would overflow u64 seconds
        let err = lifetime("SESSION_LIFETIME", u64::MAX / 2, SECS_PER_MINUTE).unwrap_err();
        assert!(err.to_string().starts_with("SESSION_LIFETIME must be between 1 and"));
    }

    #[test]
    fn test_decode_app_key() {
        let key = [7u8; AES_256_KEY_LEN];
        let encoded = general_purpose::STANDARD.encode(key);

        assert_eq!(decode_app_key(&encoded).unwrap(), key);
        assert_eq!(decode_app_key(&format!("base64:{encoded}")).unwrap(), key);
        assert!(decode_app_key("not base64!").is_err());
        assert!(decode_app_key(&general_purpose::STANDARD.encode([1u8; 16])).is_err());
    }
}
