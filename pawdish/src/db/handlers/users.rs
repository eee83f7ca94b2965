//! Database repository for users.

use crate::types::{UserId, abbrev_uuid};
use crate::{
    api::models::users::Role,
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
    pub role: Option<Role>,
    /// Case-insensitive substring of email or display name
    pub search: Option<String>,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")))
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn record_login(&mut self, id: UserId) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, provider_id), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn set_payment_provider_id(&mut self, id: UserId, provider_id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET payment_provider_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(provider_id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Push `premium_until` forward by `duration`, starting from whichever is later: now or the
    /// current expiry. Returns the new expiry.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn extend_premium(&mut self, id: UserId, duration: std::time::Duration) -> Result<DateTime<Utc>> {
        let seconds = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        let until: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE users SET
                premium_until = GREATEST(COALESCE(premium_until, NOW()), NOW()) + make_interval(secs => $2),
                updated_at = NOW()
            WHERE id = $1
            RETURNING premium_until
            "#,
        )
        .bind(id)
        .bind(seconds as f64)
        .fetch_optional(&mut *self.db)
        .await?;

        until.ok_or(DbError::NotFound)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(role = ?request.role), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (id, email, display_name, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.email.trim().to_lowercase())
        .bind(&request.display_name)
        .bind(request.role)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<UserId>) -> Result<HashMap<Self::Id, UserDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT * FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::text IS NULL OR email ILIKE $2 OR display_name ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.role)
        .bind(filter.search_pattern())
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::text IS NULL OR email ILIKE $2 OR display_name ILIKE $2)
            "#,
        )
        .bind(filter.role)
        .bind(filter.search_pattern())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users SET
                display_name = COALESCE($2, display_name),
                role = COALESCE($3, role),
                is_active = COALESCE($4, is_active),
                password_hash = COALESCE($5, password_hash),
                premium_until = COALESCE($6, premium_until),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.display_name)
        .bind(request.role)
        .bind(request.is_active)
        .bind(&request.password_hash)
        .bind(request.premium_until)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;
    use std::time::Duration;

    fn create_request(email: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            email: email.to_string(),
            display_name: Some("Test User".to_string()),
            role: Role::User,
            password_hash: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&create_request("Owner@Example.com")).await.unwrap();
        assert_eq!(user.email, "owner@example.com");
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);
        assert!(user.premium_until.is_none());

        let found = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        let by_email = repo.get_user_by_email("OWNER@example.com ").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_email_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&create_request("dup@example.com")).await.unwrap();
        let err = repo.create(&create_request("DUP@example.com")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_only_touches_given_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let user = repo.create(&create_request("edit@example.com")).await.unwrap();

        let updated = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.display_name.as_deref(), Some("Test User"));

        let missing = repo.update(Uuid::new_v4(), &UserUpdateDBRequest::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_and_counts(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        for email in ["alice@example.com", "bob@example.com", "carol@shop.example"] {
            repo.create(&create_request(email)).await.unwrap();
        }

        let filter = UserFilter {
            search: Some("EXAMPLE.COM".to_string()),
            ..UserFilter::new(0, 10)
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        let page = repo.list(&UserFilter::new(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);

        let admins = UserFilter {
            role: Some(Role::Admin),
            ..UserFilter::new(0, 10)
        };
        assert_eq!(repo.count(&admins).await.unwrap(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_extend_premium_stacks_on_existing_membership(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let user = repo.create(&create_request("member@example.com")).await.unwrap();
        let thirty_days = Duration::from_secs(30 * 24 * 3600);

        let first = repo.extend_premium(user.id, thirty_days).await.unwrap();
        let expected = Utc::now() + chrono::Duration::days(30);
        assert!((first - expected).num_seconds().abs() < 60);

        let second = repo.extend_premium(user.id, thirty_days).await.unwrap();
        assert_eq!((second - first).num_days(), 30);

        assert!(matches!(
            repo.extend_premium(Uuid::new_v4(), thirty_days).await,
            Err(DbError::NotFound)
        ));
    }
}
