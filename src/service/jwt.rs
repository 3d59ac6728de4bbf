//! JWT Authentication Service
//!
//! Provides JWT token generation, validation, and session management functionality.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use crate::database::store::{SessionStore, StoreError};
use crate::models::{
    AccessTokenClaims, AuthSession, ClientInfo, NewSession, RefreshTokenClaims, SessionState,
    TokenPair, User, UserContext,
};
use crate::utils::error::AppError;
use crate::utils::security::{constant_time_compare, hash_sensitive_data};

/// Errors raised while issuing or checking tokens
#[derive(Error, Debug)]
pub enum JwtError {
    /// Signature, expiry, or claim shape is wrong
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Session has expired")]
    SessionExpired,

    #[error("Session has been revoked")]
    SessionRevoked,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Session storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidToken(_) => {
                AppError::Authentication("Invalid or expired token".to_string())
            }
            JwtError::SessionExpired => AppError::Authentication("Session has expired".to_string()),
            JwtError::SessionRevoked => {
                AppError::Authentication("Session has been revoked".to_string())
            }
            JwtError::TokenGeneration(msg) => {
                AppError::Internal(format!("Token generation failed: {}", msg))
            }
            JwtError::Storage(e) => e.into(),
        }
    }
}

pub type JwtResult<T> = Result<T, JwtError>;

/// JWT authentication service for token management and validation
#[derive(Clone)]
pub struct JwtService {
    /// Session persistence
    sessions: Arc<dyn SessionStore>,
    /// JWT access token secret
    access_secret: String,
    /// JWT refresh token secret
    refresh_secret: String,
    /// Access token expiration duration (default: 1 hour)
    access_token_expires_in: Duration,
    /// Refresh token expiration duration (default: 30 days)
    refresh_token_expires_in: Duration,
}

impl JwtService {
    /// Create a new JWT service instance
    pub fn new(sessions: Arc<dyn SessionStore>, access_secret: String, refresh_secret: String) -> Self {
        Self::with_expiration(
            sessions,
            access_secret,
            refresh_secret,
            Duration::hours(1),
            Duration::days(30),
        )
    }

    /// Create a new JWT service with custom token expiration times
    pub fn with_expiration(
        sessions: Arc<dyn SessionStore>,
        access_secret: String,
        refresh_secret: String,
        access_expires_in: Duration,
        refresh_expires_in: Duration,
    ) -> Self {
        Self {
            sessions,
            access_secret,
            refresh_secret,
            access_token_expires_in: access_expires_in,
            refresh_token_expires_in: refresh_expires_in,
        }
    }

    /// Access token lifetime in seconds
    pub fn access_token_ttl(&self) -> i64 {
        self.access_token_expires_in.num_seconds()
    }

    /// Session storage backing the tokens
    pub fn sessions(&self) -> Arc<dyn SessionStore> {
        self.sessions.clone()
    }

    /// Open a session for `user` and issue its access/refresh token pair
    pub async fn generate_token_pair(&self, user: &User, client: ClientInfo) -> JwtResult<TokenPair> {
        let now = Utc::now();
        let refresh_expires_at = now
            .checked_add_signed(self.refresh_token_expires_in)
            .ok_or_else(|| JwtError::TokenGeneration("Refresh token expiry out of range".into()))?;

        let session_id = Uuid::new_v4();
        let access_token = self.issue_access_token(user, session_id)?;
        let refresh_claims = RefreshTokenClaims::new(user.id, session_id, refresh_expires_at, now);
        let refresh_token = self.encode_refresh_token(&refresh_claims)?;

        self.sessions
            .create_session(NewSession {
                id: session_id,
                user_id: user.id,
                refresh_token_hash: hash_sensitive_data(&refresh_token),
                expires_at: refresh_expires_at,
                user_agent: client.user_agent,
                ip_address: client.ip_address,
            })
            .await?;

        log::debug!("Opened session {} for user {}", session_id, user.id);

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.access_token_ttl(),
        ))
    }

    /// Check a refresh token against its stored session
    ///
    /// Succeeds only for an active session whose stored hash matches the token.
    pub async fn validate_refresh_token(&self, refresh_token: &str) -> JwtResult<AuthSession> {
        let claims = self.decode_refresh_token(refresh_token)?;
        let session_id = Uuid::parse_str(&claims.session_id)
            .map_err(|_| JwtError::InvalidToken("Invalid session ID in token".into()))?;

        let session = self
            .sessions
            .find_session(session_id)
            .await?
            .ok_or_else(|| JwtError::InvalidToken("Session not found".into()))?;

        if session.user_id.to_string() != claims.sub {
            return Err(JwtError::InvalidToken("Token subject mismatch".into()));
        }

        match session.state(Utc::now()) {
            SessionState::Revoked => return Err(JwtError::SessionRevoked),
            SessionState::Expired => return Err(JwtError::SessionExpired),
            SessionState::Active => {}
        }

        let token_hash = hash_sensitive_data(refresh_token);
        if !constant_time_compare(&session.refresh_token_hash, &token_hash) {
            return Err(JwtError::InvalidToken("Invalid refresh token".into()));
        }

        Ok(session)
    }

    /// Issue a fresh access token for an already validated session
    pub async fn refresh_access_token(
        &self,
        session: &AuthSession,
        user: &User,
        refresh_token: &str,
    ) -> JwtResult<TokenPair> {
        if session.user_id != user.id {
            return Err(JwtError::InvalidToken("Session does not belong to user".into()));
        }

        let access_token = self.issue_access_token(user, session.id)?;
        self.sessions.touch_session(session.id, Utc::now()).await?;

        Ok(TokenPair::new(
            access_token,
            refresh_token.to_string(),
            self.access_token_ttl(),
        ))
    }

    /// Validate an access token and extract user context
    ///
    /// The session the token was issued under must still be active, so logout
    /// and account deactivation take effect before the token expires.
    pub async fn validate_access_token(&self, token: &str) -> JwtResult<UserContext> {
        let claims = self.decode_access_token(token)?;
        let context = UserContext::from_access_claims(&claims)
            .map_err(|_| JwtError::InvalidToken("Invalid user or session ID in token".into()))?;

        let session = self
            .sessions
            .find_session(context.session_id)
            .await?
            .ok_or_else(|| JwtError::InvalidToken("Session not found".into()))?;

        if session.user_id != context.user_id {
            return Err(JwtError::InvalidToken("Token subject mismatch".into()));
        }

        match session.state(Utc::now()) {
            SessionState::Revoked => Err(JwtError::SessionRevoked),
            SessionState::Expired => Err(JwtError::SessionExpired),
            SessionState::Active => Ok(context),
        }
    }

    /// Revoke the session a refresh token belongs to
    ///
    /// Returns `false` when the session was already revoked or is gone.
    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> JwtResult<bool> {
        let claims = self.decode_refresh_token(refresh_token)?;
        let session_id = Uuid::parse_str(&claims.session_id)
            .map_err(|_| JwtError::InvalidToken("Invalid session ID in token".into()))?;

        Ok(self.sessions.revoke_session(session_id, Utc::now()).await?)
    }

    /// Revoke all sessions for a user (logout from all devices)
    pub async fn revoke_all_user_sessions(&self, user_id: Uuid) -> JwtResult<u64> {
        Ok(self
            .sessions
            .revoke_user_sessions(user_id, Utc::now())
            .await?)
    }

    /// Clean up expired and revoked sessions
    pub async fn cleanup_expired_sessions(&self) -> JwtResult<u64> {
        Ok(self.sessions.delete_expired_sessions(Utc::now()).await?)
    }

    fn issue_access_token(&self, user: &User, session_id: Uuid) -> JwtResult<String> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.access_token_expires_in)
            .ok_or_else(|| JwtError::TokenGeneration("Access token expiry out of range".into()))?;
        let claims = AccessTokenClaims::new(
            user.id,
            session_id,
            &user.email,
            user.effective_plan(now),
            expires_at,
            now,
        );
        self.encode_access_token(&claims)
    }

    /// Encode an access token with the given claims
    fn encode_access_token(&self, claims: &AccessTokenClaims) -> JwtResult<String> {
        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(self.access_secret.as_ref());

        encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Encode a refresh token with the given claims
    fn encode_refresh_token(&self, claims: &RefreshTokenClaims) -> JwtResult<String> {
        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(self.refresh_secret.as_ref());

        encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Decode and validate an access token
    fn decode_access_token(&self, token: &str) -> JwtResult<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;

        let decoding_key = DecodingKey::from_secret(self.access_secret.as_ref());

        let claims = decode::<AccessTokenClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        if claims.token_type != "access" {
            return Err(JwtError::InvalidToken("Not an access token".into()));
        }
        Ok(claims)
    }

    /// Decode and validate a refresh token
    fn decode_refresh_token(&self, token: &str) -> JwtResult<RefreshTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;

        let decoding_key = DecodingKey::from_secret(self.refresh_secret.as_ref());

        let claims = decode::<RefreshTokenClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        if claims.token_type != "refresh" {
            return Err(JwtError::InvalidToken("Not a refresh token".into()));
        }
        Ok(claims)
    }
}
