//! Authentication Service
//!
//! Email/password sign-up and login, token refresh, and logout.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::database::store::{StoreError, UserStore};
use crate::models::{
    ClientInfo, LoginRequest, LoginResponse, LogoutAllResponse, RefreshTokenRequest,
    RefreshTokenResponse, SignupRequest, User,
};
use crate::service::jwt::{JwtError, JwtService};
use crate::service::user::{UserService, UserServiceError};
use crate::utils::{error::AppError, password::PasswordHasher, validation::normalize_email};

/// Errors returned by authentication flows
#[derive(Error, Debug)]
pub enum AuthServiceError {
    #[error("Validation error: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("User with this email already exists")]
    EmailAlreadyExists,

    /// Unknown email or wrong password; the two are not distinguished
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<StoreError> for AuthServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken => AuthServiceError::EmailAlreadyExists,
            StoreError::NotFound => AuthServiceError::InvalidCredentials,
            StoreError::Database(e) => AuthServiceError::DatabaseError(e),
        }
    }
}

impl From<UserServiceError> for AuthServiceError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::UserNotFound => AuthServiceError::InvalidCredentials,
            UserServiceError::EmailAlreadyExists => AuthServiceError::EmailAlreadyExists,
            UserServiceError::InvalidInput(e) => AuthServiceError::InvalidInput(e),
            UserServiceError::DatabaseError(e) => AuthServiceError::DatabaseError(e),
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidInput(e) => AppError::InvalidFields(e),
            AuthServiceError::EmailAlreadyExists => {
                AppError::Conflict("User with this email already exists".to_string())
            }
            AuthServiceError::InvalidCredentials => {
                AppError::Authentication("Invalid email or password".to_string())
            }
            AuthServiceError::AccountDisabled => {
                AppError::Authentication("Account is disabled".to_string())
            }
            AuthServiceError::Token(e) => e.into(),
            AuthServiceError::DatabaseError(e) => AppError::Database(e),
        }
    }
}

pub type AuthServiceResult<T> = Result<T, AuthServiceError>;

/// Credential checks and session issuance
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: Arc<JwtService>,
    accounts: UserService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            accounts: UserService::new(users.clone(), jwt.sessions(), hasher.clone()),
            users,
            hasher,
            jwt,
        }
    }

    /// Register a new account on the free plan
    pub async fn signup(&self, request: SignupRequest) -> AuthServiceResult<User> {
        Ok(self.accounts.create_user(request).await?)
    }

    /// Check credentials and open a session
    pub async fn login(
        &self,
        request: LoginRequest,
        client: ClientInfo,
    ) -> AuthServiceResult<LoginResponse> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let record = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !self.hasher.verify(&request.password, &record.password_hash) {
            log::debug!("Rejected login for user {}", record.id);
            return Err(AuthServiceError::InvalidCredentials);
        }

        if !record.is_active {
            return Err(AuthServiceError::AccountDisabled);
        }

        let user: User = record.into();
        let tokens = self.jwt.generate_token_pair(&user, client).await?;

        log::info!("User {} logged in", user.id);
        Ok(LoginResponse { tokens, user })
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(
        &self,
        request: RefreshTokenRequest,
    ) -> AuthServiceResult<RefreshTokenResponse> {
        request.validate()?;

        let session = self.jwt.validate_refresh_token(&request.refresh_token).await?;
        let user: User = self
            .users
            .find_user_by_id(session.user_id)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?
            .into();

        if !user.is_active {
            return Err(AuthServiceError::AccountDisabled);
        }

        let tokens = self
            .jwt
            .refresh_access_token(&session, &user, &request.refresh_token)
            .await?;

        Ok(RefreshTokenResponse {
            access_token: tokens.access_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
        })
    }

    /// End the session a refresh token belongs to
    pub async fn logout(&self, request: RefreshTokenRequest) -> AuthServiceResult<()> {
        request.validate()?;

        if !self.jwt.revoke_refresh_token(&request.refresh_token).await? {
            log::debug!("Logout for a session that was already closed");
        }
        Ok(())
    }

    /// End every session of a user
    pub async fn logout_all(&self, user_id: Uuid) -> AuthServiceResult<LogoutAllResponse> {
        let revoked_sessions = self.jwt.revoke_all_user_sessions(user_id).await?;
        log::info!("Revoked {} sessions for user {}", revoked_sessions, user_id);

        Ok(LogoutAllResponse {
            user_id,
            revoked_sessions,
        })
    }
}
