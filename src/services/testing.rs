//! Fixtures shared by the service tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use crate::auth::{TokenConfig, TokenService};
use crate::db::{AccountUpdate, CredentialStore, MemoryCredentialStore};
use crate::error::{AppError, AppResult};
use crate::media::{MediaHost, StagedFile, UploadedAsset};
use crate::models::{NewUser, ProfileImage, UserRecord};
use crate::services::Registration;

/// Media host that hands back a fake CDN URL, or fails when told to.
#[derive(Default)]
pub struct StubMediaHost {
    uploads: AtomicUsize,
    fail: AtomicBool,
}

impl StubMediaHost {
    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaHost for StubMediaHost {
    async fn upload(&self, local_path: &Path) -> AppResult<UploadedAsset> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(AppError::Upload("Error while uploading file".to_string()));
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        Ok(UploadedAsset {
            url: format!("https://cdn.example.com/{}", name),
            public_id: Some(name.to_string()),
        })
    }
}

pub fn token_service() -> TokenService {
    TokenService::new(TokenConfig {
        access_secret: "access-secret-for-tests".to_string(),
        access_ttl: Duration::minutes(15),
        refresh_secret: "refresh-secret-for-tests".to_string(),
        refresh_ttl: Duration::days(10),
    })
}

pub fn staged(dir: &Path) -> StagedFile {
    let path: PathBuf = dir.join(format!("{}.png", Uuid::new_v4().simple()));
    std::fs::write(&path, b"\x89PNG").unwrap();
    StagedFile::new(path)
}

pub fn registration(
    dir: &Path,
    full_name: &str,
    email: &str,
    username: &str,
    password: &str,
) -> Registration {
    Registration {
        full_name: full_name.to_string(),
        email: email.to_string(),
        username: username.to_string(),
        password: password.to_string(),
        avatar: Some(staged(dir)),
        cover_image: None,
    }
}

/// Memory store whose refresh-token writes fail with a pool timeout while
/// `fail_token_writes` is set.
#[derive(Clone, Default)]
pub struct FlakyCredentialStore {
    pub inner: MemoryCredentialStore,
    fail_token_writes: std::sync::Arc<AtomicBool>,
}

impl FlakyCredentialStore {
    pub fn fail_token_writes(&self, fail: bool) {
        self.fail_token_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.fail_token_writes.load(Ordering::SeqCst) {
            return Err(AppError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FlakyCredentialStore {
    async fn find_by_identifier(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<UserRecord>> {
        self.inner.find_by_identifier(username, email).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        self.inner.find_by_username(username).await
    }

    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        self.inner.create(user).await
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> AppResult<()> {
        self.check()?;
        self.inner.set_refresh_token(id, token).await
    }

    async fn rotate_refresh_token(&self, id: Uuid, current: &str, next: &str) -> AppResult<bool> {
        self.check()?;
        self.inner.rotate_refresh_token(id, current, next).await
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        self.inner.update_password_hash(id, password_hash).await
    }

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> AppResult<Option<UserRecord>> {
        self.inner.update_account(id, update).await
    }

    async fn update_image(
        &self,
        id: Uuid,
        slot: ProfileImage,
        url: &str,
    ) -> AppResult<Option<UserRecord>> {
        self.inner.update_image(id, slot, url).await
    }
}
