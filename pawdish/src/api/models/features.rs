//! API request/response models for features: curated, sectioned recipe collections.

use super::articles::ContentStatus;
use super::pagination::Pagination;
use crate::db::models::features::{FeatureDBResponse, FeatureSection};
use crate::errors::Result;
use crate::types::{FeatureId, RecipeId, UserId};
use crate::validation::{require_text, require_text_if_present, validate_slug_if_present};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeatureCreate {
    /// Derived from the title when omitted
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub sections: Vec<FeatureSection>,
    pub thumbnail_url: Option<String>,
    /// Defaults to `draft`
    pub status: Option<ContentStatus>,
}

impl FeatureCreate {
    pub fn validate(&self) -> Result<()> {
        require_text(&self.title, "Title")?;
        validate_sections(&self.sections)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FeatureUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    /// Replaces all sections when present
    pub sections: Option<Vec<FeatureSection>>,
    pub thumbnail_url: Option<String>,
    pub status: Option<ContentStatus>,
}

impl FeatureUpdate {
    /// Validated, trimmed `(slug, title)`.
    pub fn validate(&self) -> Result<(Option<String>, Option<String>)> {
        let title = require_text_if_present(self.title.as_deref(), "Title")?;
        let slug = validate_slug_if_present(self.slug.as_deref())?;
        if let Some(sections) = &self.sections {
            validate_sections(sections)?;
        }
        Ok((slug, title))
    }
}

fn validate_sections(sections: &[FeatureSection]) -> Result<()> {
    for section in sections {
        require_text(&section.heading, "Section heading")?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeatureResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: FeatureId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub sections: Vec<FeatureSection>,
    pub thumbnail_url: Option<String>,
    pub status: ContentStatus,
    pub published_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeatureResponse {
    /// Recipe ids across all sections, in section order, first occurrence kept.
    pub fn recipe_ids(&self) -> Vec<RecipeId> {
        let mut seen = HashSet::new();
        self.sections
            .iter()
            .flat_map(|section| section.recipe_ids.iter().copied())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Query parameters for listing features
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListFeaturesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    pub status: Option<ContentStatus>,
}

impl From<FeatureDBResponse> for FeatureResponse {
    fn from(db: FeatureDBResponse) -> Self {
        Self {
            id: db.id,
            slug: db.slug,
            title: db.title,
            excerpt: db.excerpt,
            sections: db.sections,
            thumbnail_url: db.thumbnail_url,
            status: db.status,
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
    use uuid::Uuid;

    #[test]
    fn test_recipe_ids_are_deduplicated_in_section_order() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let feature = FeatureResponse {
            id: Uuid::new_v4(),
            slug: "winter".to_string(),
            title: "Winter".to_string(),
            excerpt: String::new(),
            sections: vec![
                FeatureSection {
                    heading: "Warm soups".to_string(),
                    body: String::new(),
                    recipe_ids: vec![b, a],
                },
                FeatureSection {
                    heading: "Treats".to_string(),
                    body: String::new(),
                    recipe_ids: vec![a, c, b],
                },
            ],
            thumbnail_url: None,
            status: ContentStatus::Draft,
            published_at: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(feature.recipe_ids(), vec![b, a, c]);
    }

    #[test]
    fn test_create_requires_title_and_section_headings() {
        let request: FeatureCreate = serde_json::from_value(serde_json::json!({ "title": "" })).unwrap();
        assert_eq!(request.validate().unwrap_err().user_message(), "Title is required");

        let request: FeatureCreate = serde_json::from_value(serde_json::json!({
            "title": "Summer",
            "sections": [{ "heading": " ", "body": "", "recipe_ids": [] }]
        }))
        .unwrap();
        assert_eq!(request.validate().unwrap_err().user_message(), "Section heading is required");
    }
}
