//! Database models for features.

use crate::api::models::articles::ContentStatus;
use crate::types::{FeatureId, RecipeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One section of a feature page, stored in order inside the `sections` JSONB column.
///
/// Recipe ids are not foreign keys; unknown ids are skipped when the feature's recipes are
/// resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeatureSection {
    pub heading: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub recipe_ids: Vec<RecipeId>,
}

#[derive(Debug, Clone)]
pub struct FeatureCreateDBRequest {
    pub id: FeatureId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub sections: Vec<FeatureSection>,
    pub thumbnail_url: Option<String>,
    pub status: ContentStatus,
    pub created_by: Option<UserId>,
}

#[derive(Debug, Clone, Default)]
pub struct FeatureUpdateDBRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub sections: Option<Vec<FeatureSection>>,
    pub thumbnail_url: Option<String>,
    pub status: Option<ContentStatus>,
}

#[derive(Debug, Clone)]
pub struct FeatureDBResponse {
    pub id: FeatureId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub sections: Vec<FeatureSection>,
    pub thumbnail_url: Option<String>,
    pub status: ContentStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
