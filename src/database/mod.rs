//! Database Module
//!
//! Connection management, the storage traits and their PostgreSQL and
//! in-memory implementations.

pub mod connection;
pub mod memory;
pub mod postgres;
pub mod store;

// Re-export commonly used types
pub use connection::{run_migrations, DatabaseConfig, DatabasePool, Pagination};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{SessionStore, StoreError, StoreResult, UserStore};
