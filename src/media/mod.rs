//! Media pipeline: stage multipart uploads on disk, then push them to the asset host.

mod cloudinary;
mod staging;

use std::path::Path;

use async_trait::async_trait;

use crate::error::AppResult;

pub use cloudinary::{CloudinaryConfig, CloudinaryHost};
pub use staging::{StagedFile, UploadStaging};

/// A file accepted by the media host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: Option<String>,
}

/// Third-party asset host. Any failure, or a response without a URL, is `AppError::Upload`.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, local_path: &Path) -> AppResult<UploadedAsset>;
}
