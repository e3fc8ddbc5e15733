//! Cryptographic Utilities
//!
//! Every function here is stateless: RNG access goes through `OsRng` and each
//! MAC or cipher instance lives only for the duration of one call, so all of
//! them are safe to call from concurrent request handlers.

use aes::Aes256;
use base64::{Engine, engine::general_purpose};
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// AES block size, which is also the CTR initial counter block length
pub const AES_CTR_IV_LEN: usize = 16;

/// AES-256 key length
pub const AES_256_KEY_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Invalid key or IV length")]
    InvalidLength,

    #[error("Ciphertext shorter than the IV")]
    Truncated,
}

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// `len` random bytes, lowercase hex encoded (`2 * len` characters)
pub fn random_hex(len: usize) -> String {
    hex::encode(random_bytes(len))
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes (strict, padded alphabet)
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// Compute HMAC-SHA256 over `data`
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// HMAC-SHA256, lowercase hex encoded
pub fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Encrypt with AES-256-CTR under a fresh random IV
///
/// Output layout is `IV || ciphertext`.
pub fn aes256_ctr_encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let iv = random_bytes(AES_CTR_IV_LEN);
    let mut cipher =
        Aes256Ctr::new_from_slices(key, &iv).map_err(|_| CryptoError::InvalidLength)?;

    let mut out = Vec::with_capacity(AES_CTR_IV_LEN + plaintext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(plaintext);
    cipher.apply_keystream(&mut out[AES_CTR_IV_LEN..]);
    Ok(out)
}

/// Decrypt an `IV || ciphertext` buffer produced by [`aes256_ctr_encrypt`]
///
/// CTR mode carries no integrity; callers must authenticate the plaintext.
pub fn aes256_ctr_decrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < AES_CTR_IV_LEN {
        return Err(CryptoError::Truncated);
    }
    let (iv, ciphertext) = data.split_at(AES_CTR_IV_LEN);
    let mut cipher =
        Aes256Ctr::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidLength)?;

    let mut plaintext = ciphertext.to_vec();
    cipher.apply_keystream(&mut plaintext);
    Ok(plaintext)
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_values() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn test_random_hex() {
        let token = random_hex(32);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, random_hex(32));
    }

    #[test]
    fn test_hmac_rfc4231_case_2() {
        let mac = hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            mac,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_aes_ctr_nist_vector() {
        // NIST SP 800-38A F.5.5 CTR-AES256.Encrypt, first block
        let key = hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
            .unwrap();
        let iv = hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap();
        let mut block = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let mut cipher = Aes256Ctr::new_from_slices(&key, &iv).unwrap();
        cipher.apply_keystream(&mut block);
        assert_eq!(hex::encode(block), "601ec313775789a5b7a7f504bbf3d228");
    }

    #[test]
    fn test_aes_ctr_fresh_iv_per_call() {
        let key = [7u8; AES_256_KEY_LEN];
        let a = aes256_ctr_encrypt(&key, b"same plaintext").unwrap();
        let b = aes256_ctr_encrypt(&key, b"same plaintext").unwrap();
        assert_ne!(a[..AES_CTR_IV_LEN], b[..AES_CTR_IV_LEN]);
        assert_eq!(aes256_ctr_decrypt(&key, &a).unwrap(), b"same plaintext");
    }

    #[test]
    fn test_aes_ctr_rejects_bad_input() {
        assert_eq!(
            aes256_ctr_encrypt(&[0u8; 16], b"x"),
            Err(CryptoError::InvalidLength)
        );
        assert_eq!(
            aes256_ctr_decrypt(&[0u8; 32], &[0u8; 15]),
            Err(CryptoError::Truncated)
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abcd", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abce"));
        assert!(!constant_time_eq(b"abcd", b"abc"));
    }
}
