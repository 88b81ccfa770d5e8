//! Session lifecycle: register, login, refresh-token rotation, logout, password change.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::{validate_email, Passwords, TokenPair, TokenService};
use crate::db::CredentialStore;
use crate::error::{AppError, AppResult};
use crate::media::{MediaHost, StagedFile};
use crate::models::{NewUser, PublicUser, UserRecord};

/// Registration form after multipart parsing. Files are already staged on disk.
#[derive(Debug, Default)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar: Option<StagedFile>,
    pub cover_image: Option<StagedFile>,
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct AuthFlowService {
    users: Arc<dyn CredentialStore>,
    media: Arc<dyn MediaHost>,
    tokens: TokenService,
}

impl AuthFlowService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        media: Arc<dyn MediaHost>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            media,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[instrument(skip_all, fields(username = %form.username))]
    pub async fn register(&self, form: Registration) -> AppResult<PublicUser> {
        let Registration {
            full_name,
            email,
            username,
            password,
            avatar,
            cover_image,
        } = form;

        if [&full_name, &email, &username, &password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(AppError::Validation("All fields are required".to_string()));
        }
        let full_name = full_name.trim().to_string();
        let email = email.trim().to_string();
        let username = username.trim().to_lowercase();
        validate_email(&email)?;

        if self
            .users
            .find_by_identifier(Some(&username), Some(&email))
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let avatar_file =
            avatar.ok_or_else(|| AppError::Validation("Avatar file is required".to_string()))?;
        let avatar = self
            .media
            .upload(avatar_file.path())
            .await
            .map_err(|e| {
                error!(error = %e, "avatar upload failed");
                AppError::Upload("Avatar file upload failed".to_string())
            })?;

        let cover_image = match cover_image {
            Some(file) => match self.media.upload(file.path()).await {
                Ok(asset) => Some(asset.url),
                Err(e) => {
                    warn!(error = %e, "cover image upload failed, registering without it");
                    None
                }
            },
            None => None,
        };

        let password_hash = Passwords::hash(&password)?;
        let created = self
            .users
            .create(NewUser {
                username,
                email,
                full_name,
                avatar: avatar.url,
                cover_image,
                password_hash,
            })
            .await?;

        let user = self.users.find_by_id(created.id).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Something went wrong while registering the user"
            ))
        })?;
        info!(user_id = %user.id, "user registered");
        Ok(user.to_public())
    }

    #[instrument(skip_all)]
    pub async fn login(&self, credentials: Credentials) -> AppResult<LoginOutcome> {
        let username = credentials
            .username
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty());
        let email = credentials
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if username.is_none() && email.is_none() {
            return Err(AppError::Validation(
                "username or email is required".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_identifier(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !Passwords::verify(&credentials.password, &user.password_hash)? {
            return Err(AppError::Auth("Invalid user credentials".to_string()));
        }

        let tokens = self.start_session(&user).await?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome {
            user: user.to_public(),
            tokens,
        })
    }

    /// Exchange the current refresh token for a new pair. Only the most recently
    /// issued refresh token is accepted; the swap is atomic in the store.
    #[instrument(skip_all)]
    pub async fn refresh(&self, incoming: Option<&str>) -> AppResult<TokenPair> {
        let incoming = incoming
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Auth("Unauthorized request".to_string()))?;

        let claims = self.tokens.verify_refresh(incoming).map_err(|e| {
            debug!(expired = e.is_expired(), "refresh token rejected");
            AppError::Auth("Invalid refresh token".to_string())
        })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Auth("Invalid refresh token".to_string()))?;

        if user.refresh_token.as_deref() != Some(incoming) {
            warn!(user_id = %user.id, "stale or reused refresh token presented");
            return Err(AppError::Auth("Refresh token is expired or used".to_string()));
        }

        let pair = self
            .tokens
            .issue_pair(&user)
            .map_err(|e| AppError::TokenGeneration(e.into()))?;
        let rotated = self
            .users
            .rotate_refresh_token(user.id, incoming, &pair.refresh_token)
            .await
            .map_err(|e| AppError::TokenGeneration(anyhow::Error::new(e)))?;
        if !rotated {
            warn!(user_id = %user.id, "lost refresh token rotation race");
            return Err(AppError::Auth("Refresh token is expired or used".to_string()));
        }

        info!(user_id = %user.id, "refresh token rotated");
        Ok(pair)
    }

    /// Clear the stored refresh token. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: Uuid) -> AppResult<()> {
        self.users.set_refresh_token(user_id, None).await?;
        info!(user_id = %user_id, "user logged out");
        Ok(())
    }

    /// Replace the password hash. Existing tokens stay valid.
    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if new_password.trim().is_empty() {
            return Err(AppError::Validation("New password is required".to_string()));
        }
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !Passwords::verify(old_password, &user.password_hash)? {
            return Err(AppError::Auth("Invalid old password".to_string()));
        }

        let hash = Passwords::hash(new_password)?;
        self.users.update_password_hash(user.id, &hash).await?;
        info!(user_id = %user.id, "password changed");
        Ok(())
    }

    /// Issue both tokens and persist the refresh token on the user record.
    async fn start_session(&self, user: &UserRecord) -> AppResult<TokenPair> {
        let pair = self
            .tokens
            .issue_pair(user)
            .map_err(|e| AppError::TokenGeneration(e.into()))?;
        self.users
            .set_refresh_token(user.id, Some(&pair.refresh_token))
            .await
            .map_err(|e| AppError::TokenGeneration(anyhow::Error::new(e)))?;
        Ok(pair)
    }
}
