//! Authentication Models
//!
//! Data structures for JWT authentication and session management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Plan;

/// Lifecycle state of a login session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Refresh token may be exchanged for new access tokens
    Active,
    /// Past `expires_at`
    Expired,
    /// Explicitly ended by logout
    Revoked,
}

/// Authentication session representation for database operations
///
/// Created at login; the refresh token handed to the client is stored only as
/// its SHA-256 hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthSession {
    /// Unique identifier for the session
    pub id: Uuid,

    /// Reference to the user who owns this session
    pub user_id: Uuid,

    /// Hashed refresh token (hex SHA-256)
    pub refresh_token_hash: String,

    /// Timestamp when the session expires
    pub expires_at: DateTime<Utc>,

    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the session was last used
    pub last_used_at: DateTime<Utc>,

    /// Set when the session is revoked
    pub revoked_at: Option<DateTime<Utc>>,

    /// Optional client user agent string
    pub user_agent: Option<String>,

    /// Optional client IP address
    pub ip_address: Option<String>,
}

impl AuthSession {
    /// Revocation wins over expiry
    pub fn state(&self, now: DateTime<Utc>) -> SessionState {
        if self.revoked_at.is_some() {
            SessionState::Revoked
        } else if self.expires_at <= now {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }
}

/// Values for creating a session row
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Client metadata recorded with a session
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// JWT token pair containing access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token for API authentication
    pub access_token: String,

    /// Long-lived refresh token for obtaining new access tokens
    pub refresh_token: String,

    /// Token type (always "Bearer" for JWT)
    pub token_type: String,

    /// Access token expiration time in seconds
    pub expires_in: i64,
}

impl TokenPair {
    /// Create a new token pair
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// JWT claims structure for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject - user ID
    pub sub: String,

    /// Email at the time of issue
    pub email: String,

    /// Effective plan at the time of issue
    pub plan: Plan,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID - unique token identifier
    pub jti: String,

    /// Session the token was issued under; revoking it revokes the token
    pub session_id: String,

    /// Token type (always "access" for access tokens)
    #[serde(rename = "type")]
    pub token_type: String,
}

impl AccessTokenClaims {
    /// Create new access token claims
    pub fn new(
        user_id: Uuid,
        session_id: Uuid,
        email: &str,
        plan: Plan,
        expires_at: DateTime<Utc>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            plan,
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            token_type: "access".to_string(),
        }
    }
}

/// JWT claims structure for refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// Subject - user ID
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID - unique token identifier
    pub jti: String,

    /// Token type (always "refresh" for refresh tokens)
    #[serde(rename = "type")]
    pub token_type: String,

    /// Session ID this refresh token belongs to
    pub session_id: String,
}

impl RefreshTokenClaims {
    /// Create new refresh token claims
    pub fn new(
        user_id: Uuid,
        session_id: Uuid,
        expires_at: DateTime<Utc>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: "refresh".to_string(),
            session_id: session_id.to_string(),
        }
    }
}

/// User context extracted from a validated access token
#[derive(Debug, Clone)]
pub struct UserContext {
    /// User ID extracted from token subject
    pub user_id: Uuid,

    /// Session backing the token
    pub session_id: Uuid,

    /// Email claim
    pub email: String,

    /// Plan claim
    pub plan: Plan,

    /// Token ID for tracking
    pub token_id: String,

    /// Token expiration time
    pub expires_at: DateTime<Utc>,
}

impl UserContext {
    /// Create user context from access token claims
    pub fn from_access_claims(claims: &AccessTokenClaims) -> Result<Self, uuid::Error> {
        Ok(Self {
            user_id: Uuid::parse_str(&claims.sub)?,
            session_id: Uuid::parse_str(&claims.session_id)?,
            email: claims.email.clone(),
            plan: claims.plan,
            token_id: claims.jti.clone(),
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
        })
    }
}
