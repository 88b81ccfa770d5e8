//! Local staging of multipart file fields.

use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Directory where uploads wait for the media host.
#[derive(Debug, Clone)]
pub struct UploadStaging {
    dir: PathBuf,
}

impl UploadStaging {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Stream one multipart field to a fresh file under the staging dir.
    pub async fn stage_field(&self, mut field: Field<'_>) -> AppResult<StagedFile> {
        let original = field.file_name().map(sanitize_file_name);
        let path = self.dir.join(match original {
            Some(name) if !name.is_empty() => format!("{}-{}", Uuid::new_v4().simple(), name),
            _ => Uuid::new_v4().simple().to_string(),
        });

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("create {:?}: {}", self.dir, e)))?;
        let staged = StagedFile::new(path);
        let mut file = tokio::fs::File::create(staged.path())
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("create staged file: {}", e)))?;

        let mut size = 0usize;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?
        {
            size += chunk.len();
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("write staged file: {}", e)))?;
        }
        file.flush()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("flush staged file: {}", e)))?;

        debug!(path = ?staged.path(), size, "staged upload");
        Ok(staged)
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect()
}

/// A staged upload. The file is removed when this is dropped.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = ?self.path, error = %e, "failed to remove staged upload");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\pics\\me.png"), "me.png");
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "myphoto1.jpg");
    }

    #[test]
    fn staged_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.png");
        std::fs::write(&path, b"png").unwrap();
        {
            let staged = StagedFile::new(&path);
            assert!(staged.path().exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn dropping_missing_file_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        drop(StagedFile::new(dir.path().join("never-written")));
    }
}
