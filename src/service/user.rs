//! User Service Implementation
//!
//! Core business logic for user management operations.

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::database::connection::Pagination;
use crate::database::store::{SessionStore, StoreError, UserStore};
use crate::models::{
    requests::*,
    user::{NewUser, Plan, PlanChange, User, UserChanges},
};
use crate::utils::{error::AppError, password::PasswordHasher, validation::normalize_email};

/// Custom error types for the user service
#[derive(Error, Debug)]
pub enum UserServiceError {
    /// User with the specified identifier was not found
    #[error("User not found")]
    UserNotFound,

    /// Attempted to use an email that another account owns
    #[error("User with this email already exists")]
    EmailAlreadyExists,

    /// Input validation failed
    #[error("Validation error: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<StoreError> for UserServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => UserServiceError::UserNotFound,
            StoreError::EmailTaken => UserServiceError::EmailAlreadyExists,
            StoreError::Database(e) => UserServiceError::DatabaseError(e),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::UserNotFound => AppError::NotFound("User not found".to_string()),
            UserServiceError::EmailAlreadyExists => {
                AppError::Conflict("User with this email already exists".to_string())
            }
            UserServiceError::InvalidInput(e) => AppError::InvalidFields(e),
            UserServiceError::DatabaseError(e) => AppError::Database(e),
        }
    }
}

/// Result type for user service operations
pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// User management over an injected store and password hasher
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: Arc<dyn PasswordHasher>,
}

/// Trimmed value, or `None` when nothing is left
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            store,
            sessions,
            hasher,
        }
    }

    /// Creates a new account on the free plan
    ///
    /// The email is normalized and the password stored as a salted digest.
    pub async fn create_user(&self, request: SignupRequest) -> UserServiceResult<User> {
        request.validate()?;

        let email = normalize_email(&request.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(UserServiceError::EmailAlreadyExists);
        }

        let record = self
            .store
            .insert_user(NewUser {
                email,
                name: request.name.and_then(non_blank),
                image: request.image.and_then(non_blank),
                password_hash: self.hasher.hash(&request.password),
                plan: Plan::Free,
            })
            .await?;

        log::info!("Created user {}", record.id);
        Ok(record.into())
    }

    /// One page of users, oldest first
    pub async fn list_users(&self, pagination: Pagination) -> UserServiceResult<UserListResponse> {
        let users = self.store.list_users(pagination).await?;

        Ok(UserListResponse {
            users: users.into_iter().map(User::from).collect(),
            page: pagination.page,
            per_page: pagination.per_page,
        })
    }

    /// Retrieves a user by their unique ID
    pub async fn get_user_by_id(&self, user_id: Uuid) -> UserServiceResult<User> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .map(User::from)
            .ok_or(UserServiceError::UserNotFound)
    }

    /// Retrieves a user by their email address (case-insensitive)
    pub async fn get_user_by_email(&self, email: &str) -> UserServiceResult<User> {
        self.store
            .find_user_by_email(&normalize_email(email))
            .await?
            .map(User::from)
            .ok_or(UserServiceError::UserNotFound)
    }

    /// Updates profile fields; a new password is stored as a fresh digest
    ///
    /// An empty image clears the stored one.
    pub async fn update_user(
        &self,
        user_id: Uuid,
        request: UpdateUserRequest,
    ) -> UserServiceResult<User> {
        request.validate()?;

        let changes = UserChanges {
            email: request.email.as_deref().map(normalize_email),
            name: request.name.map(|name| name.trim().to_string()),
            image: request.image.map(non_blank),
            password_hash: request.password.as_deref().map(|p| self.hasher.hash(p)),
            is_active: None,
            plan: None,
        };

        if changes.is_empty() {
            return self.get_user_by_id(user_id).await;
        }

        let updated = self.store.update_user(user_id, changes).await?;
        log::info!("Updated user {}", user_id);

        Ok(updated.into())
    }

    /// Enable or disable an account
    ///
    /// Disabling revokes every session, which also invalidates outstanding
    /// access tokens.
    pub async fn set_active(&self, user_id: Uuid, active: bool) -> UserServiceResult<User> {
        let changes = UserChanges {
            is_active: Some(active),
            ..Default::default()
        };
        let updated = self.store.update_user(user_id, changes).await?;

        if active {
            log::info!("Enabled user {}", user_id);
        } else {
            let revoked = self
                .sessions
                .revoke_user_sessions(user_id, Utc::now())
                .await?;
            log::warn!("Disabled user {}; revoked {} sessions", user_id, revoked);
        }

        Ok(updated.into())
    }

    /// Switch the subscription plan starting now for `duration_days`
    pub async fn update_plan(
        &self,
        user_id: Uuid,
        request: UpdatePlanRequest,
    ) -> UserServiceResult<UpdatePlanResponse> {
        request.validate()?;

        let activated_at = Utc::now();
        let expires_at = activated_at + Duration::days(i64::from(request.duration_days));
        let changes = UserChanges {
            plan: Some(PlanChange {
                plan: request.plan,
                activated_at,
                expires_at,
            }),
            ..Default::default()
        };

        let updated = self.store.update_user(user_id, changes).await?;
        log::info!(
            "User {} moved to plan {} until {}",
            user_id,
            request.plan,
            expires_at
        );

        Ok(UpdatePlanResponse {
            user: updated.into(),
            plan_details: PlanDetails {
                plan: request.plan,
                activated_at,
                expires_at,
                duration_days: request.duration_days,
            },
        })
    }

    /// Remove a user and every session it holds
    pub async fn delete_user(&self, user_id: Uuid) -> UserServiceResult<()> {
        if !self.store.delete_user(user_id).await? {
            return Err(UserServiceError::UserNotFound);
        }

        log::info!("Deleted user {}", user_id);
        Ok(())
    }

    /// Delete every account, returning how many were removed
    pub async fn delete_all_users(&self) -> UserServiceResult<u64> {
        let removed = self.store.delete_all_users().await?;
        log::warn!("Deleted all {} users", removed);
        Ok(removed)
    }

    /// Verifies a user's password
    pub async fn verify_password(&self, user_id: Uuid, password: &str) -> UserServiceResult<bool> {
        let record = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        Ok(self.hasher.verify(password, &record.password_hash))
    }

    /// Health check for the service
    pub async fn health_check(&self) -> UserServiceResult<()> {
        self.store.ping().await?;
        Ok(())
    }
}
