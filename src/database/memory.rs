//! In-Memory Store
//!
//! `UserStore` and `SessionStore` over maps guarded by `tokio::sync::RwLock`.
//! Used by the test suites and for running the service without PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::connection::Pagination;
use crate::database::store::{SessionStore, StoreError, StoreResult, UserStore};
use crate::models::{AuthSession, NewSession, NewUser, UserChanges, UserRecord};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    sessions: HashMap<Uuid, AuthSession>,
}

/// Process-local store; contents are lost on drop
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions held for a user, in any state
    pub async fn session_count(&self, user_id: Uuid) -> usize {
        let tables = self.tables.read().await;
        tables
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .count()
    }
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::EmailTaken);
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            image: user.image,
            password_hash: user.password_hash,
            plan: user.plan,
            plan_activated_at: None,
            plan_expires_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, pagination: Pagination) -> StoreResult<Vec<UserRecord>> {
        let tables = self.tables.read().await;
        let mut users: Vec<UserRecord> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(users
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<UserRecord> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::EmailTaken);
            }
        }

        let record = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(email) = changes.email {
            record.email = email;
        }
        if let Some(name) = changes.name {
            record.name = Some(name);
        }
        if let Some(image) = changes.image {
            record.image = image;
        }
        if let Some(password_hash) = changes.password_hash {
            record.password_hash = password_hash;
        }
        if let Some(is_active) = changes.is_active {
            record.is_active = is_active;
        }
        if let Some(plan) = changes.plan {
            record.plan = plan.plan;
            record.plan_activated_at = Some(plan.activated_at);
            record.plan_expires_at = Some(plan.expires_at);
        }
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.users.remove(&id).is_some();
        if removed {
            tables.sessions.retain(|_, s| s.user_id != id);
        }
        Ok(removed)
    }

    async fn delete_all_users(&self) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let count = tables.users.len() as u64;
        tables.users.clear();
        tables.sessions.clear();
        Ok(count)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, session: NewSession) -> StoreResult<AuthSession> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&session.user_id) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let session = AuthSession {
            id: session.id,
            user_id: session.user_id,
            refresh_token_hash: session.refresh_token_hash,
            expires_at: session.expires_at,
            created_at: now,
            last_used_at: now,
            revoked_at: None,
            user_agent: session.user_agent,
            ip_address: session.ip_address,
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<AuthSession>> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn touch_session(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(session) = self.tables.write().await.sessions.get_mut(&id) {
            session.last_used_at = at;
        }
        Ok(())
    }

    async fn revoke_session(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.sessions.get_mut(&id) {
            Some(session) if session.revoked_at.is_none() => {
                session.revoked_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_user_sessions(&self, user_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let mut revoked = 0;
        for session in tables.sessions.values_mut() {
            if session.user_id == user_id && session.revoked_at.is_none() && session.expires_at > at
            {
                session.revoked_at = Some(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables
            .sessions
            .retain(|_, s| s.expires_at > now && s.revoked_at.is_none());
        Ok((before - tables.sessions.len()) as u64)
    }
}
