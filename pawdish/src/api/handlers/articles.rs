//! HTTP handlers for articles.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    api::models::{
        articles::{ArticleCreate, ArticleResponse, ArticleUpdate, ContentStatus, ListArticlesQuery},
        pagination::{PaginatedResponse, Pagination},
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Articles, Repository, articles::ArticleFilter},
        models::articles::{ArticleCreateDBRequest, ArticleUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{ArticleId, UserId},
    validation::resolve_slug,
};

impl ArticleCreateDBRequest {
    /// Assigns the id up front so a slug derived from it matches the stored row.
    fn new(created_by: UserId, create: ArticleCreate) -> Result<Self> {
        let id = Uuid::new_v4();
        let title = create.title.trim().to_string();
        let slug = resolve_slug(create.slug.as_deref(), &title, "article", &id)?;

        Ok(Self {
            id,
            slug,
            title,
            excerpt: create.excerpt,
            content: create.content,
            thumbnail_url: create.thumbnail_url,
            status: create.status.unwrap_or_default(),
            recipe_ids: create.recipe_ids,
            created_by: Some(created_by),
        })
    }
}

fn not_found(id: impl ToString) -> Error {
    Error::NotFound {
        resource: "Article".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/articles",
    tag = "articles",
    summary = "List articles",
    params(ListArticlesQuery),
    responses(
        (status = 200, description = "Page of articles, newest first", body = PaginatedResponse<ArticleResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
    _: RequiresPermission<resource::Articles, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<ArticleResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = ArticleFilter::new(skip, limit).with_status(query.status);
    page(&state, filter).await.map(Json)
}

async fn page(state: &AppState, filter: ArticleFilter) -> Result<PaginatedResponse<ArticleResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Articles::new(&mut conn);

    let articles = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(PaginatedResponse::new(
        articles.into_iter().map(ArticleResponse::from).collect(),
        total_count,
        filter.skip,
        filter.limit,
    ))
}

#[utoipa::path(
    get,
    path = "/articles/{id}",
    tag = "articles",
    summary = "Get article",
    params(("id" = String, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article", body = ArticleResponse),
        (status = 404, description = "Article not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
    _: RequiresPermission<resource::Articles, operation::ReadAll>,
) -> Result<Json<ArticleResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let article = Articles::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(id))?;

    Ok(Json(ArticleResponse::from(article)))
}

#[utoipa::path(
    get,
    path = "/articles/by-slug/{slug}",
    tag = "articles",
    summary = "Get article by slug",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Article", body = ArticleResponse),
        (status = 404, description = "Article not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_article_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    _: RequiresPermission<resource::Articles, operation::ReadAll>,
) -> Result<Json<ArticleResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let article = Articles::new(&mut conn)
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| not_found(&slug))?;

    Ok(Json(ArticleResponse::from(article)))
}

#[utoipa::path(
    post,
    path = "/articles",
    tag = "articles",
    summary = "Create article",
    request_body = ArticleCreate,
    responses(
        (status = 201, description = "Article created", body = ArticleResponse),
        (status = 400, description = "Missing title or invalid slug"),
        (status = 409, description = "Slug already in use")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_article(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Articles, operation::CreateAll>,
    Json(create): Json<ArticleCreate>,
) -> Result<(StatusCode, Json<ArticleResponse>)> {
    create.validate()?;
    let request = ArticleCreateDBRequest::new(current_user.id, create)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let article = Articles::new(&mut conn).create(&request).await?;

    tracing::info!(article_id = %article.id, slug = %article.slug, "Created article");
    Ok((StatusCode::CREATED, Json(ArticleResponse::from(article))))
}

#[utoipa::path(
    put,
    path = "/articles/{id}",
    tag = "articles",
    summary = "Update article",
    params(("id" = String, Path, description = "Article ID")),
    request_body = ArticleUpdate,
    responses(
        (status = 200, description = "Article updated", body = ArticleResponse),
        (status = 400, description = "Invalid title or slug"),
        (status = 404, description = "Article not found"),
        (status = 409, description = "Slug already in use")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
    _: RequiresPermission<resource::Articles, operation::UpdateAll>,
    Json(update): Json<ArticleUpdate>,
) -> Result<Json<ArticleResponse>> {
    let (slug, title) = update.validate()?;
    let request = ArticleUpdateDBRequest {
        slug,
        title,
        excerpt: update.excerpt,
        content: update.content,
        thumbnail_url: update.thumbnail_url,
        status: update.status,
        recipe_ids: update.recipe_ids,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let article = Articles::new(&mut conn).update(id, &request).await?;

    Ok(Json(ArticleResponse::from(article)))
}

#[utoipa::path(
    delete,
    path = "/articles/{id}",
    tag = "articles",
    summary = "Delete article",
    params(("id" = String, Path, description = "Article ID")),
    responses(
        (status = 204, description = "Article deleted"),
        (status = 404, description = "Article not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
    _: RequiresPermission<resource::Articles, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Articles::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

#[utoipa::path(
    get,
    path = "/articles",
    tag = "public",
    summary = "List published articles",
    params(Pagination),
    responses((status = 200, description = "Page of published articles", body = PaginatedResponse<ArticleResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_published_articles(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<ArticleResponse>>> {
    let (skip, limit) = pagination.params();
    let filter = ArticleFilter::new(skip, limit).with_status(Some(ContentStatus::Published));
    page(&state, filter).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/articles/{slug}",
    tag = "public",
    summary = "Get a published article",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Article", body = ArticleResponse),
        (status = 404, description = "Article not found or not published")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_published_article(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<ArticleResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let article = Articles::new(&mut conn)
        .get_by_slug(&slug)
        .await?
        .filter(|article| article.status == ContentStatus::Published)
        .ok_or_else(|| not_found(&slug))?;

    Ok(Json(ArticleResponse::from(article)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::{CurrentUser, Role};
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_state, create_test_user};
    use serde_json::json;
    use sqlx::{PgPool, postgres::PgPoolOptions};
    use std::time::Duration;

    #[test_log::test(tokio::test)]
    async fn test_empty_title_rejected_before_any_query() {
        // Nothing listens here: any query would fail with a database error instead of a 400
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:1/unreachable")
            .unwrap();
        let state = create_test_state(pool);

        let admin = CurrentUser {
            id: Uuid::new_v4(),
            email: "editor@example.com".to_string(),
            display_name: None,
            role: Role::Admin,
            premium_until: None,
            payment_provider_id: None,
        };
        let create: ArticleCreate = serde_json::from_value(json!({ "title": "   ", "content": "Body" })).unwrap();

        let err = create_article(State(state), RequiresPermission::granted(admin), Json(create))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "Title is required");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_derives_slug_and_conflicts_on_duplicate(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let headers = add_auth_headers(&admin, &config);

        let response = server
            .post("/admin/api/v1/articles")
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({ "title": "Feeding Senior Dogs", "content": "..." }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let article: ArticleResponse = response.json();
        assert_eq!(article.slug, "feeding-senior-dogs");
        assert_eq!(article.status, ContentStatus::Draft);

        // All-Japanese titles fall back to article-{short id}
        let japanese: ArticleResponse = server
            .post("/admin/api/v1/articles")
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({ "title": "シニア犬のごはん" }))
            .await
            .json();
        assert!(japanese.slug.starts_with("article-"), "{}", japanese.slug);

        server
            .post("/admin/api/v1/articles")
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({ "title": "Another", "slug": "feeding-senior-dogs" }))
            .await
            .assert_status(StatusCode::CONFLICT);

        server
            .post("/admin/api/v1/articles")
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({ "title": "Another", "slug": "Not A Slug" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let by_slug: ArticleResponse = server
            .get("/admin/api/v1/articles/by-slug/feeding-senior-dogs")
            .add_header(&headers[0].0, &headers[0].1)
            .await
            .json();
        assert_eq!(by_slug.id, article.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_public_endpoints_only_show_published(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let headers = add_auth_headers(&admin, &config);

        for (title, status) in [("Published one", "published"), ("Draft one", "draft"), ("Old one", "archived")] {
            server
                .post("/admin/api/v1/articles")
                .add_header(&headers[0].0, &headers[0].1)
                .json(&json!({ "title": title, "status": status }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let page: PaginatedResponse<ArticleResponse> = server.get("/api/v1/articles").await.json();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.data[0].slug, "published-one");
        assert!(page.data[0].published_at.is_some());

        server.get("/api/v1/articles/published-one").await.assert_status_ok();
        server
            .get("/api/v1/articles/draft-one")
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let admin_page: PaginatedResponse<ArticleResponse> = server
            .get("/admin/api/v1/articles")
            .add_query_param("status", "archived")
            .add_header(&headers[0].0, &headers[0].1)
            .await
            .json();
        assert_eq!(admin_page.total_count, 1);
        assert_eq!(admin_page.data[0].title, "Old one");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_delete(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let headers = add_auth_headers(&admin, &config);

        let article: ArticleResponse = server
            .post("/admin/api/v1/articles")
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({ "title": "Draft title" }))
            .await
            .json();

        server
            .put(&format!("/admin/api/v1/articles/{}", article.id))
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({ "title": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let updated: ArticleResponse = server
            .put(&format!("/admin/api/v1/articles/{}", article.id))
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({ "title": "Final title", "status": "published" }))
            .await
            .json();
        assert_eq!(updated.title, "Final title");
        assert_eq!(updated.slug, "draft-title");
        assert!(updated.published_at.is_some());

        server
            .delete(&format!("/admin/api/v1/articles/{}", article.id))
            .add_header(&headers[0].0, &headers[0].1)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/admin/api/v1/articles/{}", article.id))
            .add_header(&headers[0].0, &headers[0].1)
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .put(&format!("/admin/api/v1/articles/{}", Uuid::new_v4()))
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({ "title": "Ghost" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
