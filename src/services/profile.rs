//! Profile reads and edits: account details, avatar/cover image, channel page.

use std::sync::Arc;

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::auth::validate_email;
use crate::db::{AccountUpdate, CredentialStore, SubscriptionStore};
use crate::error::{AppError, AppResult};
use crate::media::{MediaHost, StagedFile};
use crate::models::{ChannelProfile, ProfileImage, PublicUser};

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn CredentialStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    media: Arc<dyn MediaHost>,
}

impl ProfileService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        media: Arc<dyn MediaHost>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            media,
        }
    }

    pub async fn current_user(&self, user_id: Uuid) -> AppResult<PublicUser> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn update_account(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
    ) -> AppResult<PublicUser> {
        let full_name = full_name.trim();
        let email = email.trim();
        if full_name.is_empty() || email.is_empty() {
            return Err(AppError::Validation("All fields are required".to_string()));
        }
        validate_email(email)?;

        let user = self
            .users
            .update_account(
                user_id,
                AccountUpdate {
                    full_name: full_name.to_string(),
                    email: email.to_string(),
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;
        info!(user_id = %user_id, "account details updated");
        Ok(user.to_public())
    }

    #[instrument(skip(self, file))]
    pub async fn update_image(
        &self,
        user_id: Uuid,
        slot: ProfileImage,
        file: Option<StagedFile>,
    ) -> AppResult<PublicUser> {
        let file = file
            .ok_or_else(|| AppError::Validation(format!("{} file is missing", slot.label())))?;
        let asset = self.media.upload(file.path()).await.map_err(|e| {
            error!(error = %e, ?slot, "profile image upload failed");
            AppError::Upload(format!("Error while uploading {}", slot.label().to_lowercase()))
        })?;

        let user = self
            .users
            .update_image(user_id, slot, &asset.url)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;
        info!(user_id = %user_id, ?slot, "profile image updated");
        Ok(user.to_public())
    }

    /// Channel page for `username`, with subscription counts and whether `viewer` follows it.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> AppResult<ChannelProfile> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(AppError::Validation("username is missing".to_string()));
        }
        let channel = self
            .users
            .find_by_username(&username)
            .await?
            .ok_or_else(|| AppError::NotFound("channel does not exist".to_string()))?;
        let stats = self.subscriptions.channel_stats(channel.id, viewer).await?;

        Ok(ChannelProfile {
            id: channel.id,
            username: channel.username,
            full_name: channel.full_name,
            email: channel.email,
            avatar: channel.avatar,
            cover_image: channel.cover_image,
            subscribers_count: stats.subscribers_count,
            channels_subscribed_to_count: stats.channels_subscribed_to_count,
            is_subscribed: stats.is_subscribed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryCredentialStore, MemorySubscriptionStore};
    use crate::services::testing::{registration, staged, token_service, StubMediaHost};
    use crate::services::AuthFlowService;

    struct Fixture {
        auth: AuthFlowService,
        profiles: ProfileService,
        subscriptions: MemorySubscriptionStore,
        media: Arc<StubMediaHost>,
        dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(MemoryCredentialStore::new());
        let subscriptions = MemorySubscriptionStore::new();
        let media = Arc::new(StubMediaHost::default());
        Fixture {
            auth: AuthFlowService::new(users.clone(), media.clone(), token_service()),
            profiles: ProfileService::new(users, Arc::new(subscriptions.clone()), media.clone()),
            subscriptions,
            media,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    async fn register(f: &Fixture, username: &str) -> PublicUser {
        f.auth
            .register(registration(
                f.dir.path(),
                "Some One",
                &format!("{}@x.com", username),
                username,
                "pw",
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn update_account_replaces_name_and_email() {
        let f = fixture();
        let user = register(&f, "ada").await;
        let updated = f
            .profiles
            .update_account(user.id, "Ada King", "countess@x.com")
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Ada King");
        assert_eq!(updated.email, "countess@x.com");
        assert_eq!(f.profiles.current_user(user.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_account_validation_and_conflict() {
        let f = fixture();
        let ada = register(&f, "ada").await;
        register(&f, "bob").await;

        let err = f.profiles.update_account(ada.id, "", "a@x.com").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = f
            .profiles
            .update_account(ada.id, "Ada", "bob@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_avatar_and_cover() {
        let f = fixture();
        let user = register(&f, "ada").await;
        let before = user.avatar.clone();

        let updated = f
            .profiles
            .update_image(user.id, ProfileImage::Avatar, Some(staged(f.dir.path())))
            .await
            .unwrap();
        assert_ne!(updated.avatar, before);

        let updated = f
            .profiles
            .update_image(user.id, ProfileImage::CoverImage, Some(staged(f.dir.path())))
            .await
            .unwrap();
        assert!(updated.cover_image.is_some());
    }

    #[tokio::test]
    async fn update_image_errors() {
        let f = fixture();
        let user = register(&f, "ada").await;

        let err = f
            .profiles
            .update_image(user.id, ProfileImage::Avatar, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Avatar file is missing"));

        f.media.fail_next(true);
        let err = f
            .profiles
            .update_image(user.id, ProfileImage::CoverImage, Some(staged(f.dir.path())))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }

    #[tokio::test]
    async fn channel_profile_counts() {
        let f = fixture();
        let ada = register(&f, "ada").await;
        let bob = register(&f, "bob").await;
        let eve = register(&f, "eve").await;
        f.subscriptions.subscribe(bob.id, ada.id).await.unwrap();
        f.subscriptions.subscribe(eve.id, ada.id).await.unwrap();
        f.subscriptions.subscribe(ada.id, eve.id).await.unwrap();

        let page = f.profiles.channel_profile("ADA", Some(bob.id)).await.unwrap();
        assert_eq!(page.id, ada.id);
        assert_eq!(page.subscribers_count, 2);
        assert_eq!(page.channels_subscribed_to_count, 1);
        assert!(page.is_subscribed);

        let anonymous = f.profiles.channel_profile("ada", None).await.unwrap();
        assert!(!anonymous.is_subscribed);

        let err = f.profiles.channel_profile("nobody", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = f.profiles.channel_profile(" ", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
