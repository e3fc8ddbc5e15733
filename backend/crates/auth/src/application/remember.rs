//! Remember-Me Tokens
//!
//! A remember token is `base64(IV || AES-256-CTR(username "|" mac))` where
//! `mac = hex(HMAC-SHA256(key, username || password_hash))`. Binding the MAC
//! to the stored password hash means a password change invalidates every
//! outstanding token without any server-side bookkeeping.
//!
//! Every decode failure (bad base64, short input, bad UTF-8, missing
//! separator, MAC mismatch, no key) yields the same `None`.

use axum::http::HeaderMap;

use platform::cookie::{CookieConfig, extract_cookie};
use platform::crypto::{
    AES_256_KEY_LEN, aes256_ctr_decrypt, aes256_ctr_encrypt, constant_time_eq, from_base64,
    hmac_sha256_hex, to_base64,
};

use crate::application::config::RememberConfig;
use crate::error::{AuthError, AuthResult};

const SEPARATOR: char = '|';

/// Pure encode/decode of remember tokens
#[derive(Clone)]
pub struct RememberCodec {
    key: Option<[u8; AES_256_KEY_LEN]>,
}

impl RememberCodec {
    pub fn new(key: Option<[u8; AES_256_KEY_LEN]>) -> Self {
        Self { key }
    }

    /// Whether tokens can be issued at all
    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    fn mac(key: &[u8], username: &str, password_hash: &str) -> String {
        let mut message = Vec::with_capacity(username.len() + password_hash.len());
        message.extend_from_slice(username.as_bytes());
        message.extend_from_slice(password_hash.as_bytes());
        hmac_sha256_hex(key, &message)
    }

    pub fn encode(&self, username: &str, password_hash: &str) -> AuthResult<String> {
        let key = self.key.as_ref().ok_or(AuthError::MissingEncryptionKey)?;

        if username.is_empty() || username.contains(SEPARATOR) {
            return Err(AuthError::InvalidUsername);
        }

        let plaintext = format!(
            "{username}{SEPARATOR}{}",
            Self::mac(key, username, password_hash)
        );
        let sealed = aes256_ctr_encrypt(key, plaintext.as_bytes())?;

        Ok(to_base64(&sealed))
    }

    /// Recover the username if the token is authentic for `password_hash`
    pub fn decode(&self, token: &str, password_hash: &str) -> Option<String> {
        let key = self.key.as_ref()?;

        let sealed = from_base64(token).ok()?;
        let plaintext = aes256_ctr_decrypt(key, &sealed).ok()?;
        let plaintext = String::from_utf8(plaintext).ok()?;
        let (username, mac) = plaintext.split_once(SEPARATOR)?;

        let expected = Self::mac(key, username, password_hash);
        constant_time_eq(expected.as_bytes(), mac.as_bytes()).then(|| username.to_string())
    }
}

/// Remember-me cookie adapter around [`RememberCodec`]
#[derive(Clone)]
pub struct RememberMe {
    codec: RememberCodec,
    cookie: CookieConfig,
}

impl RememberMe {
    pub fn new(config: &RememberConfig) -> Self {
        Self {
            codec: RememberCodec::new(config.encryption_key),
            cookie: config.cookie(),
        }
    }

    pub fn codec(&self) -> &RememberCodec {
        &self.codec
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie.name
    }

    /// `Set-Cookie` value carrying a fresh token
    pub fn create_remember_token(&self, username: &str, password_hash: &str) -> AuthResult<String> {
        let token = self.codec.encode(username, password_hash)?;
        Ok(self.cookie.build_set_cookie(&token))
    }

    /// Username from the request's remember cookie, if it is authentic.
    ///
    /// The caller is responsible for expiring the cookie on `None` when
    /// [`has_remember_token`](Self::has_remember_token) was true.
    pub fn validate_remember_token(&self, headers: &HeaderMap, password_hash: &str) -> Option<String> {
        let token = extract_cookie(headers, &self.cookie.name)?;
        self.codec.decode(&token, password_hash)
    }

    pub fn has_remember_token(&self, headers: &HeaderMap) -> bool {
        extract_cookie(headers, &self.cookie.name).is_some()
    }

    /// `Set-Cookie` value that expires the remember cookie
    pub fn clear_remember_token(&self) -> String {
        self.cookie.build_delete_cookie()
    }
}
