//! API request/response models for users.

use super::pagination::Pagination;
use crate::db::models::users::UserDBResponse;
use crate::errors::{Error, Result};
use crate::types::UserId;
use crate::validation::{require_text_if_present, validate_email};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

// User request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Initial password. Users without one cannot log in until it is set.
    pub password: Option<String>,
}

impl UserCreate {
    /// Normalized email, or a `BadRequest`.
    pub fn validate(&self, min_password: usize, max_password: usize) -> Result<String> {
        require_text_if_present(self.display_name.as_deref(), "Display name")?;
        if let Some(password) = &self.password {
            validate_password(password, min_password, max_password)?;
        }
        validate_email(&self.email)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
    /// Grant or extend premium membership by hand
    pub premium_until: Option<DateTime<Utc>>,
}

impl UserUpdate {
    pub fn validate(&self, min_password: usize, max_password: usize) -> Result<()> {
        require_text_if_present(self.display_name.as_deref(), "Display name")?;
        if let Some(password) = &self.password {
            validate_password(password, min_password, max_password)?;
        }
        Ok(())
    }
}

pub fn validate_password(password: &str, min: usize, max: usize) -> Result<()> {
    let length = password.chars().count();
    if length < min {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {min} characters"),
        });
    }
    if length > max {
        return Err(Error::BadRequest {
            message: format!("Password must be at most {max} characters"),
        });
    }
    Ok(())
}

// User response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub premium_until: Option<DateTime<Utc>>,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    /// Whether the user has a customer record at the payment provider. The provider's id is
    /// never exposed.
    pub has_payment_provider_id: bool,
}

/// Query parameters for listing users
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    pub role: Option<Role>,

    /// Case-insensitive substring match on email or display name
    pub search: Option<String>,
}

/// The authenticated caller, loaded fresh from the database on every request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub premium_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub payment_provider_id: Option<String>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins see premium content without a membership.
    pub fn is_premium(&self) -> bool {
        self.is_admin() || self.premium_until.is_some_and(|until| until > Utc::now())
    }
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            is_premium: db.premium_until.is_some_and(|until| until > Utc::now()),
            email: db.email,
            display_name: db.display_name,
            role: db.role,
            is_active: db.is_active,
            premium_until: db.premium_until,
            created_at: db.created_at,
            updated_at: db.updated_at,
            last_login: db.last_login,
            has_payment_provider_id: db.payment_provider_id.is_some(),
        }
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            display_name: db.display_name,
            role: db.role,
            premium_until: db.premium_until,
            payment_provider_id: db.payment_provider_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn current_user(role: Role, premium_until: Option<DateTime<Utc>>) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            display_name: None,
            role,
            premium_until,
            payment_provider_id: Some("cus_123".to_string()),
        }
    }

    #[test]
    fn test_premium_requires_future_expiry_unless_admin() {
        assert!(!current_user(Role::User, None).is_premium());
        assert!(!current_user(Role::User, Some(Utc::now() - Duration::days(1))).is_premium());
        assert!(current_user(Role::User, Some(Utc::now() + Duration::days(1))).is_premium());
        assert!(current_user(Role::Admin, None).is_premium());
    }

    #[test]
    fn test_current_user_hides_payment_provider_id() {
        let json = serde_json::to_value(current_user(Role::User, None)).unwrap();
        assert!(json.get("payment_provider_id").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_user_create_validation() {
        let request = UserCreate {
            email: " New@Example.com".to_string(),
            display_name: None,
            role: Role::User,
            password: Some("longenough".to_string()),
        };
        assert_eq!(request.validate(8, 64).unwrap(), "new@example.com");

        let short = UserCreate {
            password: Some("short".to_string()),
            ..request.clone()
        };
        assert_eq!(
            short.validate(8, 64).unwrap_err().user_message(),
            "Password must be at least 8 characters"
        );

        let bad_email = UserCreate {
            email: "nobody".to_string(),
            ..request
        };
        assert!(bad_email.validate(8, 64).is_err());
    }
}
