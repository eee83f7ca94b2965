//! Database models for users.

use crate::api::models::users::Role;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub password_hash: Option<String>,
}

/// Database request for updating a user
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
    pub premium_until: Option<DateTime<Utc>>,
}

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub password_hash: Option<String>,
    pub payment_provider_id: Option<String>,
    pub premium_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
