//! Upload handling: validation and a self-deleting temp file.
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_EXTENSION: &str = "png";

pub fn validate_content_type(content_type: Option<&str>) -> AppResult<&str> {
    match content_type {
        Some(ct) if ct.starts_with("image/") => Ok(ct),
        other => {
            tracing::warn!(content_type = ?other, "rejecting non-image upload");
            Err(AppError::BadRequest("File must be an image".to_string()))
        }
    }
}

pub fn validate_size(len: usize) -> AppResult<()> {
    if len == 0 {
        return Err(AppError::BadRequest("No image uploaded".to_string()));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("Image must be 10MB or smaller".to_string()));
    }
    Ok(())
}

/// Extension taken from the client's filename, or [`DEFAULT_EXTENSION`].
pub fn extension_for(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Uploaded image persisted for the duration of one request.
///
/// Handlers call [`TempUpload::cleanup`] once the backend is done. If the guard
/// is dropped without that (a panic or a cancelled request), `Drop` removes the
/// file synchronously instead. Removal failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    removed: bool,
}

impl TempUpload {
    pub async fn persist(dir: &Path, bytes: &[u8], original_name: Option<&str>) -> AppResult<Self> {
        let suffix = format!(".{}", extension_for(original_name));
        let named = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        // Ownership of deletion moves to the guard.
        let (_file, path) = named.keep().map_err(|e| AppError::Io(e.error))?;
        let upload = TempUpload { path, removed: false };

        tokio::fs::write(&upload.path, bytes).await?;
        tracing::debug!(path = %upload.path.display(), size = bytes.len(), "stored upload");
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload.{}", DEFAULT_EXTENSION))
    }

    /// Delete the file without blocking the runtime.
    pub async fn cleanup(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed upload"),
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to remove upload"),
        }
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed upload on drop"),
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to remove upload"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_content_types_pass() {
        assert_eq!(validate_content_type(Some("image/jpeg")).unwrap(), "image/jpeg");
        assert!(validate_content_type(Some("application/pdf")).is_err());
        assert!(validate_content_type(Some("text/plain")).is_err());
        assert!(validate_content_type(None).is_err());
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(validate_size(MAX_UPLOAD_BYTES).is_ok());
        assert!(validate_size(MAX_UPLOAD_BYTES + 1).is_err());
        assert!(validate_size(0).is_err());
    }

    #[test]
    fn extension_inference() {
        assert_eq!(extension_for(Some("Beach.JPG")), "jpg");
        assert_eq!(extension_for(Some("photo.heic")), "heic");
        assert_eq!(extension_for(Some("no_extension")), "png");
        assert_eq!(extension_for(Some("weird.p$g")), "png");
        assert_eq!(extension_for(None), "png");
    }

    #[tokio::test]
    async fn cleanup_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::persist(dir.path(), b"data", Some("kid.webp")).await.unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.exists());

        upload.cleanup().await;
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn cleanup_tolerates_already_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::persist(dir.path(), b"data", None).await.unwrap();
        std::fs::remove_file(upload.path()).unwrap();
        upload.cleanup().await;
    }

    #[tokio::test]
    async fn file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::persist(dir.path(), b"data", Some("kid.webp")).await.unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.exists());
        assert!(upload.file_name().starts_with("upload-"));
        assert!(upload.file_name().ends_with(".webp"));
        assert_eq!(std::fs::read(&path).unwrap(), b"data");

        drop(upload);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_tolerates_already_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::persist(dir.path(), b"data", None).await.unwrap();
        std::fs::remove_file(upload.path()).unwrap();
        drop(upload);
    }
}
