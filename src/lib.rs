//! Account Service Library
//!
//! User account management with email/password authentication. Accounts are
//! created, listed, read, updated and deleted over an HTTP API; passwords are
//! stored as salted SHA-256 digests and sessions are carried by JWT access and
//! refresh tokens.
//!
//! # Features
//!
//! - **Account Management**: CRUD operations with input validation
//! - **Credential Hashing**: random 16-byte salt, SHA-256 digest, constant-time verification
//! - **Sessions**: refresh tokens tied to revocable server-side sessions
//! - **Plans**: free, basic and premium subscriptions with an expiry date
//! - **Flexible Router**: Configurable endpoints via RouterBuilder pattern
//! - **Pluggable Storage**: PostgreSQL through SQLx, or process memory
//!
//! # Quick Start
//!
//! ## As a Service Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use account_service::{
//!     database::MemoryStore, models::SignupRequest, utils::SaltedSha256Hasher, UserService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let user_service =
//!         UserService::new(store.clone(), store, Arc::new(SaltedSha256Hasher::new()));
//!
//!     let user = user_service
//!         .create_user(SignupRequest {
//!             email: "alice@example.com".to_string(),
//!             password: "wonderland".to_string(),
//!             name: Some("Alice Smith".to_string()),
//!             image: None,
//!         })
//!         .await?;
//!     println!("Created user: {} ({})", user.id, user.email);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## As a Web Server Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use account_service::{
//!     api::{AppState, RouterBuilder},
//!     database::{run_migrations, DatabaseConfig, PgStore},
//!     service::{AuthService, JwtService, UserService},
//!     utils::{PasswordHasher, SaltedSha256Hasher},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = DatabaseConfig::default().create_pool().await?;
//!     run_migrations(&pool).await?;
//!
//!     let store = Arc::new(PgStore::new(pool));
//!     let hasher: Arc<dyn PasswordHasher> = Arc::new(SaltedSha256Hasher::new());
//!     let jwt_service = Arc::new(JwtService::new(
//!         store.clone(),
//!         "access_secret".to_string(),
//!         "refresh_secret".to_string(),
//!     ));
//!
//!     let app_state = AppState {
//!         user_service: Arc::new(UserService::new(store.clone(), store.clone(), hasher.clone())),
//!         auth_service: Arc::new(AuthService::new(store, hasher, jwt_service.clone())),
//!         jwt_service: jwt_service.clone(),
//!     };
//!
//!     // Only enable the endpoints this deployment needs
//!     let app = RouterBuilder::with_core_routes()
//!         .build(jwt_service)
//!         .with_state(app_state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! Public: `GET /health`, `POST /auth/signup`, `POST /auth/login`,
//! `POST /auth/refresh`, `POST /auth/logout`.
//!
//! Bearer token required: `POST /auth/logout-all`, `GET /users`,
//! `GET /users/me`, `GET|PUT|DELETE /users/{id}`, `PUT /users/{id}/plan`,
//! `POST /users/{id}/verify-password`. Routes taking an `{id}` only act on
//! the caller's own account.
//!
//! # Architecture
//!
//! - **API Layer**: HTTP handlers, middleware and configurable route definitions
//! - **Service Layer**: Business logic and data validation
//! - **Models**: Data structures and type definitions
//! - **Database**: Storage traits with PostgreSQL and in-memory implementations
//! - **Utils**: Credential hashing, validation and error handling

/// HTTP API layer with handlers and configurable routing
pub mod api;

/// Environment-driven configuration
pub mod config;

/// Storage traits, backends and connection management
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Account, authentication and token services
pub mod service;

/// Shared utilities for hashing, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{create_routes, AppState, RouterBuilder};
pub use models::{
    auth::{AccessTokenClaims, AuthSession, TokenPair, UserContext},
    requests::{
        LoginRequest, RefreshTokenRequest, SignupRequest, UpdatePlanRequest, UpdateUserRequest,
        VerifyPasswordRequest,
    },
    user::{Plan, User},
};
pub use service::{AuthService, JwtService, UserService};
pub use utils::error::{AppError, AppResult, ErrorResponse};

// Re-export database utilities for configuration
pub use database::{DatabaseConfig, DatabasePool, MemoryStore, PgStore};

// Re-export configuration system
pub use config::{env, AppConfig, JwtConfig, ServerConfig, StorageBackend};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
