//! Service Layer
//!
//! Business logic for accounts, authentication and token sessions.

pub mod auth;
pub mod jwt;
pub mod user;

// Re-export services
pub use auth::{AuthService, AuthServiceError};
pub use jwt::{JwtError, JwtService};
pub use user::{UserService, UserServiceError};
