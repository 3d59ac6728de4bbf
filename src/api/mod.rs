//! API Layer
//!
//! HTTP API endpoints and request handling for the account service.

pub mod handlers;
pub mod middleware;
pub mod routes;

// Re-export commonly used types
pub use handlers::AppState;
pub use middleware::{
    auth_middleware, client_info_from_headers, extract_auth_user, security_headers_middleware,
    AuthUser,
};
pub use routes::{
    create_core_routes, create_minimal_routes, create_readonly_routes, create_routes, RouterBuilder,
};
