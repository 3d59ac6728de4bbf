//! Utilities Module
//!
//! Shared utilities for error handling, credential hashing, security, and
//! validation used throughout the account service.

pub mod error;
pub mod password;
pub mod security;
pub mod validation;

// Re-export commonly used utilities
pub use error::{AppError, AppResult, ErrorResponse};
pub use password::{hash_password, verify_password, PasswordHasher, SaltedSha256Hasher};
pub use security::*;
pub use validation::*;
