//! API response models for the admin analytics dashboard.

use crate::api::models::recipes::LifeStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RecipeCounts {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
}

/// Counts for articles and features, which share the same status set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ContentCounts {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
    pub archived: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserCounts {
    pub total: i64,
    pub active: i64,
    pub admins: i64,
    /// Users whose membership has not yet expired
    pub premium: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LifeStageCount {
    pub life_stage: LifeStage,
    pub count: i64,
}

/// Everything the dashboard shows, computed in one go.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsDashboard {
    pub recipes: RecipeCounts,
    pub articles: ContentCounts,
    pub features: ContentCounts,
    pub users: UserCounts,
    /// One entry per life stage, including stages with no recipes
    pub recipes_by_life_stage: Vec<LifeStageCount>,
    pub generated_at: DateTime<Utc>,
}
