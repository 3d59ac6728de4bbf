//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{auth::TokenPair, user::Plan, User};
use crate::utils::validation::{email_validator, name_validator, url_validator};

/// Request payload for registering a new account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    /// Email address (must be unique and valid format)
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    /// Plaintext password (6-128 characters)
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters"
    ))]
    pub password: String,

    /// Optional display name
    #[validate(custom(function = "name_validator"))]
    pub name: Option<String>,

    /// Optional profile image URL
    #[validate(custom(function = "url_validator"))]
    pub image: Option<String>,
}

/// Request payload for email/password login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    /// Password to check (cannot be empty)
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// Request payload for updating user profile information
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// Updated email address (must be unique if changed)
    #[validate(custom(function = "email_validator"))]
    pub email: Option<String>,

    /// New password; stored as a fresh digest
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters"
    ))]
    pub password: Option<String>,

    /// Updated display name
    #[validate(custom(function = "name_validator"))]
    pub name: Option<String>,

    /// Updated profile image URL; empty clears it
    #[validate(custom(function = "url_validator"))]
    pub image: Option<String>,
}

/// Request payload for changing the subscription plan
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePlanRequest {
    pub plan: Plan,

    /// How long the plan stays in force, in days
    #[validate(range(
        min = 1,
        max = 3650,
        message = "Plan duration must be between 1 and 3650 days"
    ))]
    pub duration_days: u32,
}

/// Request payload for password verification
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPasswordRequest {
    /// Password to verify (cannot be empty)
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// Request payload carrying a refresh token (refresh and logout)
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    /// Refresh token to exchange or revoke
    #[validate(length(min = 1, message = "Refresh token cannot be empty"))]
    pub refresh_token: String,
}

/// Query parameters for listing users
#[derive(Debug, Clone, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: User,
}

/// Response for password verification
#[derive(Debug, Serialize)]
pub struct VerifyPasswordResponse {
    pub valid: bool,
}

/// Response for token refresh operations
#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    /// New access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Access token expiration time in seconds
    pub expires_in: i64,
}

/// Plan details echoed back after a plan change
#[derive(Debug, Serialize)]
pub struct PlanDetails {
    pub plan: Plan,
    pub activated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub duration_days: u32,
}

/// Response for a plan change
#[derive(Debug, Serialize)]
pub struct UpdatePlanResponse {
    pub user: User,
    pub plan_details: PlanDetails,
}

/// Response for listing users
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub page: u32,
    pub per_page: u32,
}

/// Response for health check
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Plain message response (logout, delete)
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response for sign-out from every device
#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub user_id: Uuid,
    pub revoked_sessions: u64,
}

/// Standard success response wrapper
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
