//! Blob storage for uploaded files (avatars and task PDFs).
//!
//! Files live on the local filesystem under a configurable directory and are
//! addressed by a server-generated name; entities store only that name.
//! Uploads are two-phase: the blob is written first, the entity reference is
//! committed second, and a failed reference commit deletes the orphaned blob.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::AppError;

/// Upper bound for any uploaded file.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024; // 5 MiB

/// Content types accepted for avatar uploads.
pub const AVATAR_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// The only content type accepted for task attachments.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Checks an upload before anything touches disk: non-empty, within the size
/// limit, and of an accepted content type.
pub fn validate_upload(
    content_type: Option<&str>,
    size: usize,
    allowed: &[&str],
) -> Result<(), AppError> {
    if size == 0 {
        return Err(AppError::BadRequest("File is empty".into()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "File too large. Max size is {}MB",
            MAX_UPLOAD_BYTES / 1024 / 1024
        )));
    }
    match content_type {
        Some(ct) if allowed.contains(&ct) => Ok(()),
        _ => Err(AppError::UnsupportedMediaType(format!(
            "Unsupported file type. Allowed: {}",
            allowed.join(", ")
        ))),
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the storage directory if it does not exist yet.
    pub async fn init(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, name: &str) -> PathBuf {
        // Names are server-generated UUIDs; strip any directory components
        // from stored references defensively before touching disk.
        let file_name = Path::new(name)
            .file_name()
            .map(|n| n.to_owned())
            .unwrap_or_else(|| name.into());
        self.root.join(file_name)
    }

    /// Writes a blob under a fresh UUID name and returns that name.
    pub async fn save(&self, data: &[u8], content_type: &str) -> Result<String, AppError> {
        let name = format!("{}.{}", Uuid::new_v4(), extension_for(content_type));
        fs::write(self.path_for(&name), data).await?;
        Ok(name)
    }

    /// Removes a blob by name. Missing files surface as an error so callers
    /// can decide whether to ignore them.
    pub async fn delete(&self, name: &str) -> Result<(), AppError> {
        fs::remove_file(self.path_for(name)).await?;
        Ok(())
    }
}
