//! In-process stores for tests and local runs without PostgreSQL.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{AccountUpdate, CredentialStore, SubscriptionStore};
use crate::error::{AppError, AppResult};
use crate::models::{ChannelStats, NewUser, ProfileImage, UserRecord};

#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    users: Arc<RwLock<HashMap<Uuid, UserRecord>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_identifier(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| {
                username.is_some_and(|n| u.username == n) || email.is_some_and(|e| u.email == e)
            })
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            password_hash: user.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> AppResult<()> {
        if let Some(u) = self.users.write().await.get_mut(&id) {
            u.refresh_token = token.map(str::to_string);
            u.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn rotate_refresh_token(&self, id: Uuid, current: &str, next: &str) -> AppResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(u) if u.refresh_token.as_deref() == Some(current) => {
                u.refresh_token = Some(next.to_string());
                u.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut users = self.users.write().await;
        let u = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;
        u.password_hash = password_hash.to_string();
        u.updated_at = Utc::now();
        Ok(())
    }

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> AppResult<Option<UserRecord>> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.id != id && u.email == update.email)
        {
            return Err(AppError::Conflict("Email is already in use".to_string()));
        }
        Ok(users.get_mut(&id).map(|u| {
            u.full_name = update.full_name;
            u.email = update.email;
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    async fn update_image(
        &self,
        id: Uuid,
        slot: ProfileImage,
        url: &str,
    ) -> AppResult<Option<UserRecord>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|u| {
            match slot {
                ProfileImage::Avatar => u.avatar = url.to_string(),
                ProfileImage::CoverImage => u.cover_image = Some(url.to_string()),
            }
            u.updated_at = Utc::now();
            u.clone()
        }))
    }
}

#[derive(Clone, Default)]
pub struct MemorySubscriptionStore {
    edges: Arc<RwLock<HashSet<(Uuid, Uuid)>>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn subscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> AppResult<bool> {
        Ok(self.edges.write().await.insert((subscriber_id, channel_id)))
    }

    async fn unsubscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> AppResult<bool> {
        Ok(self.edges.write().await.remove(&(subscriber_id, channel_id)))
    }

    async fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> AppResult<bool> {
        Ok(self.edges.read().await.contains(&(subscriber_id, channel_id)))
    }

    async fn channel_stats(&self, channel_id: Uuid, viewer: Option<Uuid>) -> AppResult<ChannelStats> {
        let edges = self.edges.read().await;
        Ok(ChannelStats {
            subscribers_count: edges.iter().filter(|(_, c)| *c == channel_id).count() as i64,
            channels_subscribed_to_count: edges.iter().filter(|(s, _)| *s == channel_id).count()
                as i64,
            is_subscribed: viewer.is_some_and(|v| edges.contains(&(v, channel_id))),
        })
    }
}
