//! Security Utilities
//!
//! Constant-time comparison, random tokens, and hashing of bearer secrets.

use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

/// Constant-time byte comparison
///
/// Lengths are compared first; equal-length inputs are always scanned in full
/// so the running time does not depend on where the first difference is.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    accumulate_difference(a.iter().zip(b.iter())) == 0
}

/// OR of the XOR of every byte pair; never stops early
fn accumulate_difference<'a, I>(pairs: I) -> u8
where
    I: Iterator<Item = (&'a u8, &'a u8)>,
{
    pairs.fold(0u8, |acc, (byte_a, byte_b)| acc | (byte_a ^ byte_b))
}

/// Timing-safe string comparison
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Generate a random alphanumeric string
pub fn generate_secure_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Hex SHA-256 of a secret, for storing refresh tokens without the token itself
pub fn hash_sensitive_data(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Security headers for HTTP responses
pub struct SecurityHeaders;

impl SecurityHeaders {
    /// Standard security headers as name/value pairs
    pub fn standard() -> Vec<(&'static str, &'static str)> {
        vec![
            ("x-content-type-options", "nosniff"),
            ("x-frame-options", "DENY"),
            ("referrer-policy", "strict-origin-when-cross-origin"),
            ("cache-control", "no-store"),
            (
                "strict-transport-security",
                "max-age=31536000; includeSubDomains",
            ),
            (
                "content-security-policy",
                "default-src 'none'; frame-ancestors 'none'",
            ),
        ]
    }
}
