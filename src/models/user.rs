//! User Model
//!
//! Core user data structures and type definitions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier attached to an account
///
/// Orthogonal to authentication. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    #[serde(alias = "Free")]
    Free,
    #[serde(alias = "Basic")]
    Basic,
    #[serde(alias = "Premium")]
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Basic => "basic",
            Plan::Premium => "premium",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a plan name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid plan '{0}'. Valid options are: free, basic, premium")]
pub struct InvalidPlan(pub String);

impl FromStr for Plan {
    type Err = InvalidPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "basic" => Ok(Plan::Basic),
            "premium" => Ok(Plan::Premium),
            _ => Err(InvalidPlan(s.to_string())),
        }
    }
}

impl TryFrom<String> for Plan {
    type Error = InvalidPlan;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// User representation for external API responses
///
/// Never carries the password digest. All timestamps are UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,

    /// User's email address (unique, normalized)
    pub email: String,

    /// Optional display name
    pub name: Option<String>,

    /// Optional URL to the user's profile image
    pub image: Option<String>,

    /// Current subscription plan
    pub plan: Plan,

    /// When the current plan was activated
    pub plan_activated_at: Option<DateTime<Utc>>,

    /// When the current plan lapses back to free
    pub plan_expires_at: Option<DateTime<Utc>>,

    /// Inactive accounts cannot log in
    pub is_active: bool,

    /// Timestamp when the user account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the user profile was last modified
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Plan in force at `now`; an expired paid plan counts as free
    pub fn effective_plan(&self, now: DateTime<Utc>) -> Plan {
        match self.plan_expires_at {
            Some(expires_at) if expires_at <= now => Plan::Free,
            _ => self.plan,
        }
    }
}

/// Stored user row including the password digest
///
/// Used by the storage layer and the services that hash or verify
/// credentials. Converted into [`User`] before leaving the service layer.
#[derive(Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,

    /// Salted SHA-256 digest, see `utils::password`
    pub password_hash: String,

    #[sqlx(try_from = "String")]
    pub plan: Plan,
    pub plan_activated_at: Option<DateTime<Utc>>,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .field("plan", &self.plan)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl From<UserRecord> for User {
    /// Strip the password digest so it cannot end up in a response
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            email: record.email,
            name: record.name,
            image: record.image,
            plan: record.plan,
            plan_activated_at: record.plan_activated_at,
            plan_expires_at: record.plan_expires_at,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Values for inserting a new user row
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Already normalized email
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    /// Digest produced by a `PasswordHasher`, never plaintext
    pub password_hash: String,
    pub plan: Plan,
}

/// A plan assignment with its validity window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanChange {
    pub plan: Plan,
    pub activated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Partial update of a user row; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    /// `Some(None)` clears the image
    pub image: Option<Option<String>>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub plan: Option<PlanChange>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.image.is_none()
            && self.password_hash.is_none()
            && self.is_active.is_none()
            && self.plan.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_record() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: Some("Test User".to_string()),
            image: Some("https://example.com/avatar.jpg".to_string()),
            password_hash: "digest".to_string(),
            plan: Plan::Basic,
            plan_activated_at: None,
            plan_expires_at: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_record_conversion() {
        let record = sample_record();
        let id = record.id;
        let user: User = record.into();

        assert_eq!(user.id, id);
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.plan, Plan::Basic);

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["plan"], "basic");
    }

    #[test]
    fn test_user_record_debug_redacts_digest() {
        let record = sample_record();
        let debug = format!("{:?}", record);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("digest\""));
    }

    #[test]
    fn test_plan_parsing() {
        assert_eq!("free".parse::<Plan>().unwrap(), Plan::Free);
        assert_eq!("Premium".parse::<Plan>().unwrap(), Plan::Premium);
        assert_eq!(" BASIC ".parse::<Plan>().unwrap(), Plan::Basic);
        assert!("business".parse::<Plan>().is_err());
        assert_eq!(Plan::try_from("basic".to_string()).unwrap(), Plan::Basic);
    }

    #[test]
    fn test_plan_serde() {
        assert_eq!(serde_json::to_string(&Plan::Premium).unwrap(), "\"premium\"");
        let plan: Plan = serde_json::from_str("\"Basic\"").unwrap();
        assert_eq!(plan, Plan::Basic);
        assert!(serde_json::from_str::<Plan>("\"gold\"").is_err());
        assert_eq!(Plan::default(), Plan::Free);
    }

    #[test]
    fn test_effective_plan() {
        let now = Utc::now();
        let mut user: User = sample_record().into();

        user.plan = Plan::Premium;
        user.plan_expires_at = Some(now + Duration::days(1));
        assert_eq!(user.effective_plan(now), Plan::Premium);

        user.plan_expires_at = Some(now - Duration::seconds(1));
        assert_eq!(user.effective_plan(now), Plan::Free);

        user.plan_expires_at = None;
        assert_eq!(user.effective_plan(now), Plan::Premium);
    }

    #[test]
    fn test_user_changes_is_empty() {
        assert!(UserChanges::default().is_empty());
        let clear_image = UserChanges {
            image: Some(None),
            ..Default::default()
        };
        assert!(!clear_image.is_empty());
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
