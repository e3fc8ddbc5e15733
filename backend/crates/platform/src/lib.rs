//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations for the request-security subsystem:
//! - Cryptographic utilities (SHA-256, HMAC-SHA256, AES-256-CTR, Base64, hex)
//! - Password verification (Argon2id PHC strings)
//! - Cookie building and extraction
//! - Client identification (fingerprint, response negotiation)

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
