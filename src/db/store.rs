//! Store traits consumed by the services.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{ChannelStats, NewUser, ProfileImage, UserRecord};

/// Fields replaced by an account-details update.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub full_name: String,
    pub email: String,
}

/// User identity and secrets.
///
/// Single-field updates never touch other columns, so a password change or a
/// token rotation cannot trip validation on unrelated fields.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// User whose username equals `username` or whose email equals `email`.
    async fn find_by_identifier(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>>;

    /// Insert a user. Duplicate username or email is `AppError::Conflict`.
    async fn create(&self, user: NewUser) -> AppResult<UserRecord>;

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> AppResult<()>;

    /// Replace the stored refresh token with `next` only if it still equals
    /// `current`. Returns `false` when another writer got there first.
    async fn rotate_refresh_token(&self, id: Uuid, current: &str, next: &str) -> AppResult<bool>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> AppResult<Option<UserRecord>>;

    async fn update_image(
        &self,
        id: Uuid,
        slot: ProfileImage,
        url: &str,
    ) -> AppResult<Option<UserRecord>>;
}

/// Subscriber → channel edges.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Returns `false` if the pair already existed.
    async fn subscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> AppResult<bool>;

    /// Returns `false` if there was nothing to remove.
    async fn unsubscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> AppResult<bool>;

    async fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> AppResult<bool>;

    async fn channel_stats(&self, channel_id: Uuid, viewer: Option<Uuid>) -> AppResult<ChannelStats>;
}
