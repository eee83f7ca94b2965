//! Database repository for features.

use crate::api::models::articles::ContentStatus;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::features::{FeatureCreateDBRequest, FeatureDBResponse, FeatureSection, FeatureUpdateDBRequest},
};
use crate::types::{FeatureId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, types::Json};
use std::collections::HashMap;
use tracing::instrument;

/// Filter for listing features
#[derive(Debug, Clone)]
pub struct FeatureFilter {
    pub skip: i64,
    pub limit: i64,
    pub status: Option<ContentStatus>,
}

impl FeatureFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, status: None }
    }

    pub fn with_status(mut self, status: Option<ContentStatus>) -> Self {
        self.status = status;
        self
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Feature {
    pub id: FeatureId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub sections: Json<Vec<FeatureSection>>,
    pub thumbnail_url: Option<String>,
    pub status: ContentStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Feature> for FeatureDBResponse {
    fn from(feature: Feature) -> Self {
        Self {
            id: feature.id,
            slug: feature.slug,
            title: feature.title,
            excerpt: feature.excerpt,
            sections: feature.sections.0,
            thumbnail_url: feature.thumbnail_url,
            status: feature.status,
            published_at: feature.published_at,
            created_by: feature.created_by,
            created_at: feature.created_at,
            updated_at: feature.updated_at,
        }
    }
}

pub struct Features<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Features<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<FeatureDBResponse>> {
        let feature = sqlx::query_as::<_, Feature>("SELECT * FROM features WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(feature.map(Into::into))
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Features<'c> {
    type CreateRequest = FeatureCreateDBRequest;
    type UpdateRequest = FeatureUpdateDBRequest;
    type Response = FeatureDBResponse;
    type Id = FeatureId;
    type Filter = FeatureFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let feature = sqlx::query_as::<_, Feature>(
            r#"
            INSERT INTO features (id, slug, title, excerpt, sections, thumbnail_url, status, published_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $7 = 'published'::content_status THEN NOW() END, $8)
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(&request.slug)
        .bind(&request.title)
        .bind(&request.excerpt)
        .bind(Json(&request.sections))
        .bind(&request.thumbnail_url)
        .bind(request.status)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(feature.into())
    }

    #[instrument(skip(self), fields(feature_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let feature = sqlx::query_as::<_, Feature>("SELECT * FROM features WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(feature.map(Into::into))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<FeatureId>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let features = sqlx::query_as::<_, Feature>("SELECT * FROM features WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(features.into_iter().map(|f| (f.id, f.into())).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip, status = ?filter.status), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let features = sqlx::query_as::<_, Feature>(
            r#"
            SELECT * FROM features
            WHERE ($1::content_status IS NULL OR status = $1)
            ORDER BY COALESCE(published_at, created_at) DESC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.status)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(features.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM features WHERE ($1::content_status IS NULL OR status = $1)")
            .bind(filter.status)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(feature_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM features WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(feature_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let feature = sqlx::query_as::<_, Feature>(
            r#"
            UPDATE features SET
                slug = COALESCE($2, slug),
                title = COALESCE($3, title),
                excerpt = COALESCE($4, excerpt),
                sections = COALESCE($5, sections),
                thumbnail_url = COALESCE($6, thumbnail_url),
                status = COALESCE($7, status),
                published_at = CASE
                    WHEN published_at IS NULL AND COALESCE($7, status) = 'published'::content_status THEN NOW()
                    ELSE published_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.slug)
        .bind(&request.title)
        .bind(&request.excerpt)
        .bind(request.sections.as_ref().map(Json))
        .bind(&request.thumbnail_url)
        .bind(request.status)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(feature.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn feature(slug: &str) -> FeatureCreateDBRequest {
        FeatureCreateDBRequest {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: "Kidney care week".to_string(),
            excerpt: String::new(),
            sections: vec![FeatureSection {
                heading: "Low phosphorus".to_string(),
                body: "Start here".to_string(),
                recipe_ids: vec![Uuid::new_v4()],
            }],
            thumbnail_url: None,
            status: ContentStatus::Draft,
            created_by: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_sections_round_trip_and_replace(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Features::new(&mut conn);

        let request = feature("kidney-care-week");
        let created = repo.create(&request).await.unwrap();
        assert_eq!(created.sections, request.sections);
        assert_eq!(created.status, ContentStatus::Draft);

        let by_slug = repo.get_by_slug("kidney-care-week").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);

        let updated = repo
            .update(
                created.id,
                &FeatureUpdateDBRequest {
                    sections: Some(vec![]),
                    status: Some(ContentStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.sections.is_empty());
        assert!(updated.published_at.is_some());
        assert_eq!(updated.title, "Kidney care week");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_status(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Features::new(&mut conn);
        repo.create(&feature("one")).await.unwrap();
        let mut published = feature("two");
        published.status = ContentStatus::Published;
        repo.create(&published).await.unwrap();

        let filter = FeatureFilter::new(0, 10).with_status(Some(ContentStatus::Published));
        let listed = repo.list(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].slug, "two");
        assert_eq!(repo.count(&FeatureFilter::new(0, 10)).await.unwrap(), 2);
    }
}
