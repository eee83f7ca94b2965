//! HTTP handlers for features (curated, sectioned recipe collections).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    api::models::{
        articles::ContentStatus,
        features::{FeatureCreate, FeatureResponse, FeatureUpdate, ListFeaturesQuery},
        pagination::{PaginatedResponse, Pagination},
        recipes::RecipeResponse,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Features, Recipes, Repository, features::FeatureFilter},
        models::features::{FeatureCreateDBRequest, FeatureUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{FeatureId, UserId},
    validation::resolve_slug,
};

impl FeatureCreateDBRequest {
    fn new(created_by: UserId, create: FeatureCreate) -> Result<Self> {
        let id = Uuid::new_v4();
        let title = create.title.trim().to_string();
        let slug = resolve_slug(create.slug.as_deref(), &title, "feature", &id)?;

        Ok(Self {
            id,
            slug,
            title,
            excerpt: create.excerpt,
            sections: create.sections,
            thumbnail_url: create.thumbnail_url,
            status: create.status.unwrap_or(ContentStatus::Draft),
            created_by: Some(created_by),
        })
    }
}

fn not_found(id: impl ToString) -> Error {
    Error::NotFound {
        resource: "Feature".to_string(),
        id: id.to_string(),
    }
}

async fn page(state: &AppState, filter: FeatureFilter) -> Result<PaginatedResponse<FeatureResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Features::new(&mut conn);

    let features = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(PaginatedResponse::new(
        features.into_iter().map(FeatureResponse::from).collect(),
        total_count,
        filter.skip,
        filter.limit,
    ))
}

#[utoipa::path(
    get,
    path = "/features",
    tag = "features",
    summary = "List features",
    params(ListFeaturesQuery),
    responses(
        (status = 200, description = "Page of features, newest first", body = PaginatedResponse<FeatureResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_features(
    State(state): State<AppState>,
    Query(query): Query<ListFeaturesQuery>,
    _: RequiresPermission<resource::Features, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<FeatureResponse>>> {
    let (skip, limit) = query.pagination.params();
    page(&state, FeatureFilter::new(skip, limit).with_status(query.status))
        .await
        .map(Json)
}

#[utoipa::path(
    get,
    path = "/features/{id}",
    tag = "features",
    summary = "Get feature",
    params(("id" = String, Path, description = "Feature ID")),
    responses(
        (status = 200, description = "Feature", body = FeatureResponse),
        (status = 404, description = "Feature not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_feature(
    State(state): State<AppState>,
    Path(id): Path<FeatureId>,
    _: RequiresPermission<resource::Features, operation::ReadAll>,
) -> Result<Json<FeatureResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let feature = Features::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(id))?;

    Ok(Json(FeatureResponse::from(feature)))
}

#[utoipa::path(
    get,
    path = "/features/by-slug/{slug}",
    tag = "features",
    summary = "Get feature by slug",
    params(("slug" = String, Path, description = "Feature slug")),
    responses(
        (status = 200, description = "Feature", body = FeatureResponse),
        (status = 404, description = "Feature not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_feature_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    _: RequiresPermission<resource::Features, operation::ReadAll>,
) -> Result<Json<FeatureResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let feature = Features::new(&mut conn)
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| not_found(&slug))?;

    Ok(Json(FeatureResponse::from(feature)))
}

/// Recipes referenced by the feature's sections, in section order. Ids that no longer resolve
/// to a recipe are skipped.
#[utoipa::path(
    get,
    path = "/features/{id}/recipes",
    tag = "features",
    summary = "Resolve a feature's recipes",
    params(("id" = String, Path, description = "Feature ID")),
    responses(
        (status = 200, description = "Recipes in section order, deduplicated", body = Vec<RecipeResponse>),
        (status = 404, description = "Feature not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_feature_recipes(
    State(state): State<AppState>,
    Path(id): Path<FeatureId>,
    _: RequiresPermission<resource::Features, operation::ReadAll>,
) -> Result<Json<Vec<RecipeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let feature = Features::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(id))?;

    let recipe_ids = FeatureResponse::from(feature).recipe_ids();
    let mut recipes = Recipes::new(&mut conn).get_bulk(recipe_ids.clone()).await?;

    let resolved: Vec<RecipeResponse> = recipe_ids
        .iter()
        .filter_map(|recipe_id| recipes.remove(recipe_id))
        .map(RecipeResponse::from)
        .collect();
    if resolved.len() < recipe_ids.len() {
        tracing::debug!(
            feature_id = %id,
            missing = recipe_ids.len() - resolved.len(),
            "Skipped feature recipe ids with no matching recipe"
        );
    }

    Ok(Json(resolved))
}

#[utoipa::path(
    post,
    path = "/features",
    tag = "features",
    summary = "Create feature",
    request_body = FeatureCreate,
    responses(
        (status = 201, description = "Feature created", body = FeatureResponse),
        (status = 400, description = "Missing title, section heading or invalid slug"),
        (status = 409, description = "Slug already in use")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_feature(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Features, operation::CreateAll>,
    Json(create): Json<FeatureCreate>,
) -> Result<(StatusCode, Json<FeatureResponse>)> {
    create.validate()?;
    let request = FeatureCreateDBRequest::new(current_user.id, create)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let feature = Features::new(&mut conn).create(&request).await?;

    tracing::info!(feature_id = %feature.id, slug = %feature.slug, "Created feature");
    Ok((StatusCode::CREATED, Json(FeatureResponse::from(feature))))
}

#[utoipa::path(
    put,
    path = "/features/{id}",
    tag = "features",
    summary = "Update feature",
    params(("id" = String, Path, description = "Feature ID")),
    request_body = FeatureUpdate,
    responses(
        (status = 200, description = "Feature updated", body = FeatureResponse),
        (status = 400, description = "Invalid title, section or slug"),
        (status = 404, description = "Feature not found"),
        (status = 409, description = "Slug already in use")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_feature(
    State(state): State<AppState>,
    Path(id): Path<FeatureId>,
    _: RequiresPermission<resource::Features, operation::UpdateAll>,
    Json(update): Json<FeatureUpdate>,
) -> Result<Json<FeatureResponse>> {
    let (slug, title) = update.validate()?;
    let request = FeatureUpdateDBRequest {
        slug,
        title,
        excerpt: update.excerpt,
        sections: update.sections,
        thumbnail_url: update.thumbnail_url,
        status: update.status,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let feature = Features::new(&mut conn).update(id, &request).await?;

    Ok(Json(FeatureResponse::from(feature)))
}

#[utoipa::path(
    delete,
    path = "/features/{id}",
    tag = "features",
    summary = "Delete feature",
    params(("id" = String, Path, description = "Feature ID")),
    responses(
        (status = 204, description = "Feature deleted"),
        (status = 404, description = "Feature not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_feature(
    State(state): State<AppState>,
    Path(id): Path<FeatureId>,
    _: RequiresPermission<resource::Features, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Features::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

#[utoipa::path(
    get,
    path = "/features",
    tag = "public",
    summary = "List published features",
    params(Pagination),
    responses((status = 200, description = "Page of published features", body = PaginatedResponse<FeatureResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_published_features(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<FeatureResponse>>> {
    let (skip, limit) = pagination.params();
    page(&state, FeatureFilter::new(skip, limit).with_status(Some(ContentStatus::Published)))
        .await
        .map(Json)
}

#[utoipa::path(
    get,
    path = "/features/{slug}",
    tag = "public",
    summary = "Get a published feature",
    params(("slug" = String, Path, description = "Feature slug")),
    responses(
        (status = 200, description = "Feature", body = FeatureResponse),
        (status = 404, description = "Feature not found or not published")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_published_feature(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<FeatureResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let feature = Features::new(&mut conn)
        .get_by_slug(&slug)
        .await?
        .filter(|feature| feature.status == ContentStatus::Published)
        .ok_or_else(|| not_found(&slug))?;

    Ok(Json(FeatureResponse::from(feature)))
}
