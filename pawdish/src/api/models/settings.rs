//! API request/response models for site settings.

use crate::db::models::settings::SettingDBResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `PUT /settings/{key}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingUpsert {
    /// Any JSON value
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    /// Kept unchanged when omitted on an existing key
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingResponse {
    pub key: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<SettingDBResponse> for SettingResponse {
    fn from(db: SettingDBResponse) -> Self {
        Self {
            key: db.key,
            value: db.value,
            description: db.description,
            updated_at: db.updated_at,
        }
    }
}
