//! API request/response models for FAQs.

use crate::db::models::faqs::FaqDBResponse;
use crate::errors::{Error, Result};
use crate::types::FaqId;
use crate::validation::{require_text, require_text_if_present};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "faq_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FaqStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FaqCreate {
    pub question: String,
    pub answer: String,
    pub status: Option<FaqStatus>,
}

impl FaqCreate {
    pub fn validate(&self) -> Result<()> {
        require_text(&self.question, "Question")?;
        require_text(&self.answer, "Answer")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FaqUpdate {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub status: Option<FaqStatus>,
}

impl FaqUpdate {
    pub fn validate(&self) -> Result<()> {
        require_text_if_present(self.question.as_deref(), "Question")?;
        require_text_if_present(self.answer.as_deref(), "Answer")?;
        Ok(())
    }
}

/// New display order: `ids[i]` gets `display_order = i`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FaqReorder {
    #[schema(value_type = Vec<String>)]
    pub ids: Vec<FaqId>,
}

impl FaqReorder {
    /// Rejects duplicate ids before the database is consulted.
    pub fn validate(&self) -> Result<()> {
        let unique: HashSet<_> = self.ids.iter().collect();
        if unique.len() != self.ids.len() {
            return Err(Error::BadRequest {
                message: "FAQ order contains duplicate ids".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FaqResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    pub display_order: i32,
    pub status: FaqStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListFaqsQuery {
    pub status: Option<FaqStatus>,
}

impl From<FaqDBResponse> for FaqResponse {
    fn from(db: FaqDBResponse) -> Self {
        Self {
            id: db.id,
            question: db.question,
            answer: db.answer,
            display_order: db.display_order,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
