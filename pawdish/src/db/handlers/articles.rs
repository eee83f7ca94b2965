//! Database repository for articles.

use crate::api::models::articles::ContentStatus;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::articles::{ArticleCreateDBRequest, ArticleDBResponse, ArticleUpdateDBRequest},
};
use crate::types::{ArticleId, abbrev_uuid};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;

/// Filter for listing articles
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    pub skip: i64,
    pub limit: i64,
    pub status: Option<ContentStatus>,
}

impl ArticleFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, status: None }
    }

    pub fn with_status(mut self, status: Option<ContentStatus>) -> Self {
        self.status = status;
        self
    }
}

pub struct Articles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Articles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<ArticleDBResponse>> {
        let article = sqlx::query_as::<_, ArticleDBResponse>("SELECT * FROM articles WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(article)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Articles<'c> {
    type CreateRequest = ArticleCreateDBRequest;
    type UpdateRequest = ArticleUpdateDBRequest;
    type Response = ArticleDBResponse;
    type Id = ArticleId;
    type Filter = ArticleFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let article = sqlx::query_as::<_, ArticleDBResponse>(
            r#"
            INSERT INTO articles (id, slug, title, excerpt, content, thumbnail_url, status, recipe_ids, published_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, CASE WHEN $7 = 'published'::content_status THEN NOW() END, $9)
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(&request.slug)
        .bind(&request.title)
        .bind(&request.excerpt)
        .bind(&request.content)
        .bind(&request.thumbnail_url)
        .bind(request.status)
        .bind(&request.recipe_ids)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(article)
    }

    #[instrument(skip(self), fields(article_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let article = sqlx::query_as::<_, ArticleDBResponse>("SELECT * FROM articles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(article)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<ArticleId>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let articles = sqlx::query_as::<_, ArticleDBResponse>("SELECT * FROM articles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(articles.into_iter().map(|a| (a.id, a)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip, status = ?filter.status), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        // Published articles read newest-publication first; drafts fall back to creation time
        let articles = sqlx::query_as::<_, ArticleDBResponse>(
            r#"
            SELECT * FROM articles
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

        Ok(articles)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE ($1::content_status IS NULL OR status = $1)")
            .bind(filter.status)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(article_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(article_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let article = sqlx::query_as::<_, ArticleDBResponse>(
            r#"
            UPDATE articles SET
                slug = COALESCE($2, slug),
                title = COALESCE($3, title),
                excerpt = COALESCE($4, excerpt),
                content = COALESCE($5, content),
                thumbnail_url = COALESCE($6, thumbnail_url),
                status = COALESCE($7, status),
                recipe_ids = COALESCE($8, recipe_ids),
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
        .bind(&request.content)
        .bind(&request.thumbnail_url)
        .bind(request.status)
        .bind(&request.recipe_ids)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn article(slug: &str, status: ContentStatus) -> ArticleCreateDBRequest {
        ArticleCreateDBRequest {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: format!("Title for {slug}"),
            excerpt: String::new(),
            content: "Body".to_string(),
            thumbnail_url: None,
            status,
            recipe_ids: vec![Uuid::new_v4()],
            created_by: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_published_at_set_once(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Articles::new(&mut conn);

        let draft = repo.create(&article("draft-first", ContentStatus::Draft)).await.unwrap();
        assert!(draft.published_at.is_none());

        let published = repo
            .update(
                draft.id,
                &ArticleUpdateDBRequest {
                    status: Some(ContentStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let first_published = published.published_at.expect("published_at set on publish");

        let archived = repo
            .update(
                draft.id,
                &ArticleUpdateDBRequest {
                    status: Some(ContentStatus::Archived),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(archived.published_at, Some(first_published));

        let direct = repo.create(&article("born-published", ContentStatus::Published)).await.unwrap();
        assert!(direct.published_at.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_slug_conflicts(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Articles::new(&mut conn);

        repo.create(&article("same-slug", ContentStatus::Draft)).await.unwrap();
        let err = repo.create(&article("same-slug", ContentStatus::Draft)).await.unwrap_err();
        match err {
            DbError::UniqueViolation { table, .. } => assert_eq!(table.as_deref(), Some("articles")),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_by_status_with_pagination(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Articles::new(&mut conn);
        for i in 0..3 {
            repo.create(&article(&format!("pub-{i}"), ContentStatus::Published)).await.unwrap();
        }
        repo.create(&article("hidden", ContentStatus::Draft)).await.unwrap();

        let filter = ArticleFilter::new(0, 2).with_status(Some(ContentStatus::Published));
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 3);
        assert_eq!(repo.count(&ArticleFilter::new(0, 10)).await.unwrap(), 4);

        let found = repo.get_by_slug("hidden").await.unwrap().unwrap();
        assert_eq!(found.status, ContentStatus::Draft);
        assert!(repo.get_by_slug("missing").await.unwrap().is_none());
    }
}
