//! Channel subscriptions.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::db::{CredentialStore, SubscriptionStore};
use crate::error::{AppError, AppResult};
use crate::models::SubscriptionToggle;

#[derive(Clone)]
pub struct SubscriptionService {
    users: Arc<dyn CredentialStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl SubscriptionService {
    pub fn new(users: Arc<dyn CredentialStore>, subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            users,
            subscriptions,
        }
    }

    /// Subscribe if not yet subscribed, otherwise unsubscribe.
    pub async fn toggle(&self, subscriber_id: Uuid, channel_id: Uuid) -> AppResult<SubscriptionToggle> {
        if subscriber_id == channel_id {
            return Err(AppError::Validation(
                "You cannot subscribe to your own channel".to_string(),
            ));
        }
        if self.users.find_by_id(channel_id).await?.is_none() {
            return Err(AppError::NotFound("channel does not exist".to_string()));
        }

        if self.subscriptions.unsubscribe(subscriber_id, channel_id).await? {
            info!(subscriber = %subscriber_id, channel = %channel_id, "unsubscribed");
            return Ok(SubscriptionToggle { subscribed: false });
        }
        self.subscriptions.subscribe(subscriber_id, channel_id).await?;
        info!(subscriber = %subscriber_id, channel = %channel_id, "subscribed");
        Ok(SubscriptionToggle { subscribed: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryCredentialStore, MemorySubscriptionStore};
    use crate::models::NewUser;

    async fn user(store: &MemoryCredentialStore, name: &str) -> Uuid {
        store
            .create(NewUser {
                username: name.to_string(),
                email: format!("{}@x.com", name),
                full_name: name.to_string(),
                avatar: "https://cdn.example.com/a.png".to_string(),
                cover_image: None,
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn toggle_flips_state() {
        let users = MemoryCredentialStore::new();
        let subs = MemorySubscriptionStore::new();
        let svc = SubscriptionService::new(Arc::new(users.clone()), Arc::new(subs.clone()));
        let (ada, bob) = (user(&users, "ada").await, user(&users, "bob").await);

        assert!(svc.toggle(bob, ada).await.unwrap().subscribed);
        assert!(subs.is_subscribed(bob, ada).await.unwrap());
        assert!(!svc.toggle(bob, ada).await.unwrap().subscribed);
        assert!(!subs.is_subscribed(bob, ada).await.unwrap());
    }

    #[tokio::test]
    async fn toggle_rejects_self_and_unknown_channel() {
        let users = MemoryCredentialStore::new();
        let svc = SubscriptionService::new(
            Arc::new(users.clone()),
            Arc::new(MemorySubscriptionStore::new()),
        );
        let ada = user(&users, "ada").await;

        let err = svc.toggle(ada, ada).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = svc.toggle(ada, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
