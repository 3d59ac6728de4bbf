//! Storage Traits
//!
//! The persistence seam between services and a concrete backend. Services hold
//! `Arc<dyn UserStore>` / `Arc<dyn SessionStore>` so production code runs on
//! PostgreSQL while tests use the in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::database::connection::Pagination;
use crate::models::{AuthSession, NewSession, NewUser, UserChanges, UserRecord};
use crate::utils::error::AppError;

/// Errors produced by a store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    /// Another account already owns the email
    #[error("Email already in use")]
    EmailTaken,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Record not found".to_string()),
            StoreError::EmailTaken => {
                AppError::Conflict("User with this email already exists".to_string())
            }
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

/// SQLSTATE 23505
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Persistence operations on user rows
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user; fails with `EmailTaken` on a duplicate email
    async fn insert_user(&self, user: NewUser) -> StoreResult<UserRecord>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    /// Lookup by already normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Users ordered by creation time, oldest first
    async fn list_users(&self, pagination: Pagination) -> StoreResult<Vec<UserRecord>>;

    /// Apply the set fields of `changes` and bump `updated_at`
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<UserRecord>;

    /// Returns `false` when no row matched. Removes the user's sessions too.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    /// Delete every user, returning the number removed
    async fn delete_all_users(&self) -> StoreResult<u64>;

    /// Cheap connectivity check used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}

/// Persistence operations on login sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: NewSession) -> StoreResult<AuthSession>;

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<AuthSession>>;

    async fn touch_session(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;

    /// Mark one session revoked; `false` if it was missing or already revoked
    async fn revoke_session(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Revoke every live session of a user, returning how many changed
    async fn revoke_user_sessions(&self, user_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64>;

    /// Remove sessions that expired or were revoked before `now`
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}
