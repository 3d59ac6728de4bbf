//! Data Models Module
//!
//! Users, plans, sessions and tokens, and the request/response payloads of the
//! HTTP API.

pub mod auth;
pub mod requests;
pub mod user;

// Re-export commonly used types
pub use auth::*;
pub use requests::*;
pub use user::*;
