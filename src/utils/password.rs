//! Credential Hashing
//!
//! Salted SHA-256 password digests. A digest is the base64 encoding of
//! `salt || SHA-256(salt || password)`: 16 bytes of salt followed by the
//! 32-byte hash, 48 bytes in total (64 base64 characters).
//!
//! The stored format is fixed by byte offsets only. Any digest produced by
//! [`hash_password`] must stay verifiable by [`verify_password`].

use base64::prelude::*;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::utils::security::constant_time_eq;

/// Length of the random salt prefix in bytes
pub const SALT_LEN: usize = 16;

/// Length of a SHA-256 output in bytes
pub const HASH_LEN: usize = 32;

/// Length of a decoded digest (`salt || hash`)
pub const DIGEST_LEN: usize = SALT_LEN + HASH_LEN;

/// Length of an encoded digest string
pub const ENCODED_DIGEST_LEN: usize = 64;

/// Hashing and verification of plaintext passwords
///
/// Services take this as `Arc<dyn PasswordHasher>` so tests and alternative
/// deployments can swap the implementation.
pub trait PasswordHasher: Send + Sync {
    /// Produce a storable digest for `password`
    fn hash(&self, password: &str) -> String;

    /// Check `password` against a digest previously produced by [`PasswordHasher::hash`]
    fn verify(&self, password: &str, digest: &str) -> bool;
}

/// Default hasher: 16-byte OS-random salt, SHA-256, base64
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedSha256Hasher;

impl SaltedSha256Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for SaltedSha256Hasher {
    fn hash(&self, password: &str) -> String {
        hash_password(password)
    }

    fn verify(&self, password: &str, digest: &str) -> bool {
        verify_password(password, digest)
    }
}

/// Hash a password with a freshly generated salt
///
/// Two calls with the same password return different strings. Panics if the
/// operating system's random source fails; [`check_entropy_source`] is run at
/// startup so that failure surfaces before any request is served.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    encode_digest(&salt, password.as_bytes())
}

/// Verify a password against a stored digest
///
/// Malformed digests (bad base64, wrong decoded length) yield `false`.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let decoded = match BASE64_STANDARD.decode(digest) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    if decoded.len() != DIGEST_LEN {
        return false;
    }

    let (salt, stored_hash) = decoded.split_at(SALT_LEN);
    let candidate = salted_sha256(salt, password.as_bytes());

    constant_time_eq(stored_hash, &candidate)
}

/// Draw from the OS random source once
///
/// Returns an error instead of panicking so the caller can abort startup with
/// a readable message.
pub fn check_entropy_source() -> Result<(), rand::Error> {
    let mut sample = [0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut sample)
}

fn encode_digest(salt: &[u8; SALT_LEN], password: &[u8]) -> String {
    let hash = salted_sha256(salt, password);

    let mut digest = Vec::with_capacity(DIGEST_LEN);
    digest.extend_from_slice(salt);
    digest.extend_from_slice(&hash);

    BASE64_STANDARD.encode(digest)
}

fn salted_sha256(salt: &[u8], password: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password);
    hasher.finalize().into()
}
