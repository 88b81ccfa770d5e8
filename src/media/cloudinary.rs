//! Cloudinary signed upload.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{error, info, instrument};

use super::{MediaHost, UploadedAsset};
use crate::error::{AppError, AppResult};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
    public_id: Option<String>,
}

#[derive(Clone)]
pub struct CloudinaryHost {
    client: Client,
    config: CloudinaryConfig,
    base_url: String,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("vidtube/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("http client: {}", e)))?;
        Ok(Self {
            client,
            config,
            base_url: API_BASE.to_string(),
        })
    }

    /// Point at a different API root (self-hosted proxy, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/auto/upload",
            self.base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }
}

/// Signature over the sorted signed params followed by the API secret.
fn sign(timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("timestamp={}{}", timestamp, api_secret).as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    #[instrument(skip(self))]
    async fn upload(&self, local_path: &Path) -> AppResult<UploadedAsset> {
        let bytes = tokio::fs::read(local_path).await.map_err(|e| {
            error!(path = ?local_path, error = %e, "cannot read staged upload");
            AppError::Upload("Error while uploading file".to_string())
        })?;
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let timestamp = Utc::now().timestamp();
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", sign(timestamp, &self.config.api_secret));

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "media host unreachable");
                AppError::Upload("Error while uploading file".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "media host rejected upload");
            return Err(AppError::Upload("Error while uploading file".to_string()));
        }

        let parsed: UploadResponse = response.json().await.map_err(|e| {
            error!(error = %e, "unexpected media host response");
            AppError::Upload("Error while uploading file".to_string())
        })?;

        let url = parsed
            .secure_url
            .or(parsed.url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::Upload("Error while uploading file".to_string()))?;
        info!(url = %url, "file uploaded to media host");
        Ok(UploadedAsset {
            url,
            public_id: parsed.public_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_hex_sha256() {
        let sig = sign(1_700_000_000, "secret");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(sig, sign(1_700_000_001, "secret"));
    }

    #[test]
    fn endpoint_includes_cloud_name() {
        let host = CloudinaryHost::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            ..Default::default()
        })
        .unwrap()
        .with_base_url("http://localhost:9999/");
        assert_eq!(host.endpoint(), "http://localhost:9999/demo/auto/upload");
    }

    #[tokio::test]
    async fn missing_file_is_upload_error() {
        let host = CloudinaryHost::new(CloudinaryConfig::default()).unwrap();
        let err = host
            .upload(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }
}
