//! PostgreSQL-backed stores: users and subscriptions.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::store::{AccountUpdate, CredentialStore, SubscriptionStore};
use super::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ChannelStats, NewUser, ProfileImage, UserRecord};

const USER_COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, password_hash, refresh_token, created_at, updated_at";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

// ---- Users ----

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_identifier(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<UserRecord>> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $2 LIMIT 1"
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (username, email, full_name, avatar, cover_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("User with email or username already exists".to_string())
            } else {
                AppError::Db(e)
            }
        })?;
        Ok(row)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> AppResult<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn rotate_refresh_token(&self, id: Uuid, current: &str, next: &str) -> AppResult<bool> {
        let r = sqlx::query(
            "UPDATE users SET refresh_token = $3, updated_at = NOW() WHERE id = $1 AND refresh_token = $2",
        )
        .bind(id)
        .bind(current)
        .bind(next)
        .execute(&self.pool)
        .await?;
        debug!(user_id = %id, rotated = r.rows_affected() == 1, "refresh token compare-and-swap");
        Ok(r.rows_affected() == 1)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let r = sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if r.rows_affected() == 0 {
            return Err(AppError::NotFound("User does not exist".to_string()));
        }
        Ok(())
    }

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users SET full_name = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.full_name)
        .bind(&update.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email is already in use".to_string())
            } else {
                AppError::Db(e)
            }
        })?;
        Ok(row)
    }

    async fn update_image(
        &self,
        id: Uuid,
        slot: ProfileImage,
        url: &str,
    ) -> AppResult<Option<UserRecord>> {
        let column = match slot {
            ProfileImage::Avatar => "avatar",
            ProfileImage::CoverImage => "cover_image",
        };
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET {column} = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

// ---- Subscriptions ----

#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: DbPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn subscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> AppResult<bool> {
        let r = sqlx::query(
            r#"
            INSERT INTO subscriptions (subscriber_id, channel_id)
            VALUES ($1, $2)
            ON CONFLICT (subscriber_id, channel_id) DO NOTHING
            "#,
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected() == 1)
    }

    async fn unsubscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> AppResult<bool> {
        let r = sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
            .bind(subscriber_id)
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected() > 0)
    }

    async fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> AppResult<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2)",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn channel_stats(&self, channel_id: Uuid, viewer: Option<Uuid>) -> AppResult<ChannelStats> {
        let row: (i64, i64, bool) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1)::bigint,
                (SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = $1)::bigint,
                EXISTS(SELECT 1 FROM subscriptions WHERE channel_id = $1 AND subscriber_id = $2)
            "#,
        )
        .bind(channel_id)
        .bind(viewer)
        .fetch_one(&self.pool)
        .await?;
        Ok(ChannelStats {
            subscribers_count: row.0,
            channels_subscribed_to_count: row.1,
            is_subscribed: row.2,
        })
    }
}
