//! Database models for FAQs.

use crate::api::models::faqs::FaqStatus;
use crate::types::FaqId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// New FAQs are appended after the current last entry.
#[derive(Debug, Clone)]
pub struct FaqCreateDBRequest {
    pub question: String,
    pub answer: String,
    pub status: FaqStatus,
}

#[derive(Debug, Clone, Default)]
pub struct FaqUpdateDBRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub status: Option<FaqStatus>,
}

#[derive(Debug, Clone, FromRow)]
pub struct FaqDBResponse {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    pub display_order: i32,
    pub status: FaqStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
