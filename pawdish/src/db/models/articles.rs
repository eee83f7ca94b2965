//! Database models for articles.

use crate::api::models::articles::ContentStatus;
use crate::types::{ArticleId, RecipeId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new article. The id is chosen by the caller so a slug can be
/// derived from it.
#[derive(Debug, Clone)]
pub struct ArticleCreateDBRequest {
    pub id: ArticleId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub status: ContentStatus,
    pub recipe_ids: Vec<RecipeId>,
    pub created_by: Option<UserId>,
}

#[derive(Debug, Clone, Default)]
pub struct ArticleUpdateDBRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub thumbnail_url: Option<String>,
    pub status: Option<ContentStatus>,
    pub recipe_ids: Option<Vec<RecipeId>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ArticleDBResponse {
    pub id: ArticleId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub status: ContentStatus,
    pub recipe_ids: Vec<RecipeId>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
