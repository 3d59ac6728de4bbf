//! HTTP Request Handlers
//!
//! Axum handlers for processing HTTP requests and responses.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::middleware::{client_info_from_headers, AuthUser},
    database::Pagination,
    models::{requests::*, User, UserContext},
    service::{AuthService, JwtService, UserService},
    utils::error::{AppError, AppResult},
    VERSION,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub jwt_service: Arc<JwtService>,
}

/// Account ids in paths are UUIDs
fn parse_user_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid user id: {}", raw)))
}

/// Accounts may only be read or changed by their owner
fn ensure_self(caller: &UserContext, user_id: Uuid) -> AppResult<()> {
    if caller.user_id != user_id {
        log::warn!(
            "User {} denied access to account {}",
            caller.user_id,
            user_id
        );
        return Err(AppError::Forbidden(
            "You can only access your own account".to_string(),
        ));
    }
    Ok(())
}

/// Register a new account
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<User>>)> {
    let user = state.auth_service.signup(request).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(user))))
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<SuccessResponse<LoginResponse>>> {
    let response = state
        .auth_service
        .login(request, client_info_from_headers(&headers))
        .await?;
    Ok(Json(SuccessResponse::new(response)))
}

/// Exchange a refresh token for a new access token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> AppResult<Json<SuccessResponse<RefreshTokenResponse>>> {
    let response = state.auth_service.refresh(request).await?;
    Ok(Json(SuccessResponse::new(response)))
}

/// Revoke the session behind a refresh token
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    state.auth_service.logout(request).await?;
    Ok(Json(SuccessResponse::new(MessageResponse::new(
        "Logged out successfully",
    ))))
}

/// Revoke every session of the caller
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<LogoutAllResponse>>> {
    let response = state.auth_service.logout_all(caller.user_id).await?;
    Ok(Json(SuccessResponse::new(response)))
}

/// List users page by page
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<SuccessResponse<UserListResponse>>> {
    let pagination = Pagination::from_query(query.page, query.per_page);
    let response = state.user_service.list_users(pagination).await?;
    Ok(Json(SuccessResponse::new(response)))
}

/// Profile of the authenticated caller
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<User>>> {
    let user = state.user_service.get_user_by_id(caller.user_id).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Get user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<SuccessResponse<User>>> {
    let user_id = parse_user_id(&user_id)?;
    ensure_self(&caller, user_id)?;
    let user = state.user_service.get_user_by_id(user_id).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Update user profile
pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> AppResult<Json<SuccessResponse<User>>> {
    let user_id = parse_user_id(&user_id)?;
    ensure_self(&caller, user_id)?;
    let user = state.user_service.update_user(user_id, request).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Delete a user account
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    let user_id = parse_user_id(&user_id)?;
    ensure_self(&caller, user_id)?;
    state.user_service.delete_user(user_id).await?;
    Ok(Json(SuccessResponse::new(MessageResponse::new(
        "User deleted successfully",
    ))))
}

/// Change the subscription plan
pub async fn update_plan(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdatePlanRequest>,
) -> AppResult<Json<SuccessResponse<UpdatePlanResponse>>> {
    let user_id = parse_user_id(&user_id)?;
    ensure_self(&caller, user_id)?;
    let response = state.user_service.update_plan(user_id, request).await?;
    Ok(Json(SuccessResponse::new(response)))
}

/// Verify user password
pub async fn verify_password(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(request): Json<VerifyPasswordRequest>,
) -> AppResult<Json<SuccessResponse<VerifyPasswordResponse>>> {
    let user_id = parse_user_id(&user_id)?;
    ensure_self(&caller, user_id)?;
    validator::Validate::validate(&request)?;

    let valid = state
        .user_service
        .verify_password(user_id, &request.password)
        .await?;

    Ok(Json(SuccessResponse::new(VerifyPasswordResponse { valid })))
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<HealthCheckResponse>>> {
    // Check storage connectivity
    state.user_service.health_check().await?;

    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    };

    Ok(Json(SuccessResponse::new(response)))
}
