//! API request/response models for articles.

use super::pagination::Pagination;
use crate::db::models::articles::ArticleDBResponse;
use crate::errors::Result;
use crate::types::{ArticleId, RecipeId, UserId};
use crate::validation::{require_text, require_text_if_present, validate_slug_if_present};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Publication state shared by articles and features.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "content_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleCreate {
    /// Derived from the title when omitted
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub status: Option<ContentStatus>,
    /// Recipes referenced by the article, in display order
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub recipe_ids: Vec<RecipeId>,
}

impl ArticleCreate {
    pub fn validate(&self) -> Result<()> {
        require_text(&self.title, "Title")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ArticleUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub thumbnail_url: Option<String>,
    pub status: Option<ContentStatus>,
    #[schema(value_type = Option<Vec<String>>)]
    pub recipe_ids: Option<Vec<RecipeId>>,
}

impl ArticleUpdate {
    /// Validated, trimmed `(slug, title)`.
    pub fn validate(&self) -> Result<(Option<String>, Option<String>)> {
        let title = require_text_if_present(self.title.as_deref(), "Title")?;
        let slug = validate_slug_if_present(self.slug.as_deref())?;
        Ok((slug, title))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ArticleId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub status: ContentStatus,
    #[schema(value_type = Vec<String>)]
    pub recipe_ids: Vec<RecipeId>,
    pub published_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing articles
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListArticlesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    pub status: Option<ContentStatus>,
}

impl From<ArticleDBResponse> for ArticleResponse {
    fn from(db: ArticleDBResponse) -> Self {
        Self {
            id: db.id,
            slug: db.slug,
            title: db.title,
            excerpt: db.excerpt,
            content: db.content,
            thumbnail_url: db.thumbnail_url,
            status: db.status,
            recipe_ids: db.recipe_ids,
            published_at: db.published_at,
            created_by: db.created_by,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_title() {
        let request: ArticleCreate = serde_json::from_value(serde_json::json!({ "title": "   " })).unwrap();
        let err = request.validate().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "Title is required");
    }

    #[test]
    fn test_create_defaults() {
        let request: ArticleCreate = serde_json::from_value(serde_json::json!({ "title": "Senior dogs" })).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.status.is_none());
        assert!(request.recipe_ids.is_empty());
        assert_eq!(ContentStatus::default(), ContentStatus::Draft);
    }

    #[test]
    fn test_update_validation() {
        let update = ArticleUpdate {
            slug: Some("Not A Slug".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = ArticleUpdate {
            title: Some(" New title ".to_string()),
            slug: Some("new-title".to_string()),
            ..Default::default()
        };
        assert_eq!(
            update.validate().unwrap(),
            (Some("new-title".to_string()), Some("New title".to_string()))
        );
    }
}
