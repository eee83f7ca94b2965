//! API request models for the video endpoints. Responses reuse the types in [`crate::video`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DirectUploadRequest {
    /// Longest video the upload URL accepts
    #[serde(default = "default_max_duration")]
    pub max_duration_seconds: u32,
}

fn default_max_duration() -> u32 {
    3600
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CopyVideoRequest {
    /// Publicly reachable source URL
    pub url: String,
    pub name: Option<String>,
}
