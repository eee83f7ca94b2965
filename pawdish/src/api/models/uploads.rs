//! API models for media uploads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Multipart form accepted by the upload endpoint. Only used for the OpenAPI document.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// Image or video file
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Target folder, `[a-z0-9-]+`; defaults to `uploads`
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Public URL of the stored object
    pub url: String,
    /// Storage key, used to delete the object later
    pub key: String,
    pub content_type: String,
    pub size_bytes: u64,
}
