//! PostgreSQL Store
//!
//! `UserStore` and `SessionStore` backed by a sqlx connection pool. Queries are
//! checked at runtime so the crate builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::connection::Pagination;
use crate::database::store::{
    is_unique_violation, SessionStore, StoreError, StoreResult, UserStore,
};
use crate::models::{AuthSession, NewSession, NewUser, UserChanges, UserRecord};

const USER_COLUMNS: &str = "id, email, name, image, password_hash, plan, plan_activated_at, \
     plan_expires_at, is_active, created_at, updated_at";

const SESSION_COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, created_at, \
     last_used_at, revoked_at, user_agent, ip_address";

/// Store implementation over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::EmailTaken
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        let sql = format!(
            "INSERT INTO users (id, email, name, image, password_hash, plan) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.image)
            .bind(&user.password_hash)
            .bind(user.plan.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self, pagination: Pagination) -> StoreResult<Vec<UserRecord>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2"
        );
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<UserRecord> {
        // $4 says whether the image is touched at all; $5 may then be NULL to clear it
        let sql = format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                name = COALESCE($3, name),
                image = CASE WHEN $4 THEN $5 ELSE image END,
                password_hash = COALESCE($6, password_hash),
                is_active = COALESCE($7, is_active),
                plan = COALESCE($8, plan),
                plan_activated_at = COALESCE($9, plan_activated_at),
                plan_expires_at = COALESCE($10, plan_expires_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let plan = changes.plan;
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .bind(&changes.email)
            .bind(&changes.name)
            .bind(changes.image.is_some())
            .bind(changes.image.flatten())
            .bind(&changes.password_hash)
            .bind(changes.is_active)
            .bind(plan.map(|p| p.plan.as_str()))
            .bind(plan.map(|p| p.activated_at))
            .bind(plan.map(|p| p.expires_at))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        // auth_sessions rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_users(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, session: NewSession) -> StoreResult<AuthSession> {
        let sql = format!(
            "INSERT INTO auth_sessions (id, user_id, refresh_token_hash, expires_at, user_agent, ip_address) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SESSION_COLUMNS}"
        );

        Ok(sqlx::query_as::<_, AuthSession>(&sql)
            .bind(session.id)
            .bind(session.user_id)
            .bind(&session.refresh_token_hash)
            .bind(session.expires_at)
            .bind(&session.user_agent)
            .bind(&session.ip_address)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<AuthSession>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM auth_sessions WHERE id = $1");
        Ok(sqlx::query_as::<_, AuthSession>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn touch_session(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE auth_sessions SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke_session(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE auth_sessions SET revoked_at = $2 WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_user_sessions(&self, user_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE auth_sessions SET revoked_at = $2 \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2",
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM auth_sessions WHERE expires_at <= $1 OR revoked_at IS NOT NULL",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
