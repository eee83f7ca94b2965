//! Object storage for uploaded media.
//!
//! Uploads land in an [`ObjectStorage`] backend and are referenced by a public URL afterwards.
//! Two backends exist:
//!
//! - [`local::LocalStorage`]: a directory on disk, served back by the HTTP layer under `/media`
//! - [`s3::S3Storage`]: an S3-compatible bucket such as Cloudflare R2
//!
//! Object keys have the shape `{folder}/{yyyy}/{mm}/{uuid}.{ext}`; see [`object_key`].

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Datelike, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{StorageBackendConfig, StorageConfig};
use crate::errors::Error;

pub mod local;
pub mod s3;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Keys are generated by us, but deletes take them from the URL
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(key) => Error::BadRequest {
                message: format!("Invalid object key '{key}'"),
            },
            StorageError::Io(e) => Error::Other(anyhow::Error::from(e).context("local storage")),
            StorageError::Backend(message) => Error::ServiceUnavailable {
                service: "Object storage".to_string(),
                message,
            },
        }
    }
}

/// A place uploaded bytes can be written to and later served from.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key`, replacing anything already there.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()>;

    /// Remove the object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// URL the stored object is reachable at.
    fn public_url(&self, key: &str) -> String;
}

/// Build the configured backend.
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>> {
    Ok(match &config.backend {
        StorageBackendConfig::Local { path, public_base_url } => Arc::new(local::LocalStorage::new(path, public_base_url)),
        StorageBackendConfig::S3 { .. } => Arc::new(s3::S3Storage::from_config(&config.backend).await?),
    })
}

/// Join a base URL and key with exactly one slash between them.
pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

/// Key for a new upload: `{folder}/{yyyy}/{mm}/{id}.{ext}`.
pub fn object_key(folder: &str, extension: &str, now: DateTime<Utc>, id: Uuid) -> String {
    format!("{folder}/{:04}/{:02}/{id}.{extension}", now.year(), now.month())
}

/// Only images and videos may be uploaded.
pub fn is_allowed_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence.starts_with("image/") || essence.starts_with("video/")
}

/// File extension for an upload. The content type decides; the original file name is the
/// fallback when the type has no registered extension.
pub fn extension_for(content_type: &str, file_name: Option<&str>) -> String {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    // Prefer the name's extension when it agrees with the type, e.g. "jpeg" vs "jpg"
    let known = mime_guess::get_mime_extensions_str(content_type).unwrap_or_default();
    match from_name {
        Some(ext) if known.is_empty() || known.contains(&ext.as_str()) => ext,
        _ => known.first().map(|ext| ext.to_string()).unwrap_or_else(|| "bin".to_string()),
    }
}

/// Keys may only contain lowercase ASCII, digits, `-`, `_`, `.` and `/`, with no empty or
/// dot-only segments.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.' | '/'))
        && key.split('/').all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid { Ok(()) } else { Err(StorageError::InvalidKey(key.to_string())) }
}
