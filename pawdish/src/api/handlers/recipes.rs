//! HTTP handlers for recipes: admin CRUD plus the public, published-only search.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        recipes::{RecipeCreate, RecipeResponse, RecipeStatus, RecipeUpdate, resolve_ingredients},
        users::CurrentUser,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Recipes, Repository, recipes::RecipeListFilter},
        models::recipes::{RecipeCreateDBRequest, RecipeUpdateDBRequest},
    },
    errors::{Error, Result},
    search::RecipeFilter,
    types::{RecipeId, UserId},
};

impl RecipeCreateDBRequest {
    fn new(created_by: UserId, create: RecipeCreate) -> Result<Self> {
        Ok(Self {
            title: create.title.trim().to_string(),
            description: create.description,
            cooking_time: create.cooking_time,
            servings: create.servings,
            calories: create.calories,
            life_stage: create.life_stage,
            protein_type: create.protein_type,
            meal_scene: create.meal_scene,
            difficulty: create.difficulty,
            health_conditions: create.health_conditions,
            ingredients: resolve_ingredients(create.ingredients)?,
            instructions: create.instructions,
            thumbnail_url: create.thumbnail_url,
            video_uid: create.video_uid,
            is_premium: create.is_premium,
            status: create.status.unwrap_or(RecipeStatus::Draft),
            created_by: Some(created_by),
        })
    }
}

impl TryFrom<RecipeUpdate> for RecipeUpdateDBRequest {
    type Error = Error;

    fn try_from(update: RecipeUpdate) -> Result<Self> {
        Ok(Self {
            title: update.title.map(|t| t.trim().to_string()),
            description: update.description,
            cooking_time: update.cooking_time,
            servings: update.servings,
            calories: update.calories,
            life_stage: update.life_stage,
            protein_type: update.protein_type,
            meal_scene: update.meal_scene,
            difficulty: update.difficulty,
            health_conditions: update.health_conditions,
            ingredients: update.ingredients.map(resolve_ingredients).transpose()?,
            instructions: update.instructions,
            thumbnail_url: update.thumbnail_url,
            video_uid: update.video_uid,
            is_premium: update.is_premium,
            status: update.status,
        })
    }
}

fn not_found(id: RecipeId) -> Error {
    Error::NotFound {
        resource: "Recipe".to_string(),
        id: id.to_string(),
    }
}

fn can_view_premium(viewer: Option<&CurrentUser>) -> bool {
    viewer.is_some_and(|user| user.is_admin() || user.is_premium())
}

#[utoipa::path(
    get,
    path = "/recipes",
    tag = "recipes",
    summary = "List and search recipes",
    params(RecipeFilter),
    responses(
        (status = 200, description = "Every recipe matching the filter", body = Vec<RecipeResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(filter): Query<RecipeFilter>,
    _: RequiresPermission<resource::Recipes, operation::ReadAll>,
) -> Result<Json<Vec<RecipeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let recipes = Recipes::new(&mut conn).list(&RecipeListFilter::default()).await?;

    let recipes = recipes.into_iter().map(RecipeResponse::from).collect();
    Ok(Json(filter.apply(recipes)))
}

#[utoipa::path(
    get,
    path = "/recipes/{id}",
    tag = "recipes",
    summary = "Get recipe",
    params(("id" = String, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 404, description = "Recipe not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
    _: RequiresPermission<resource::Recipes, operation::ReadAll>,
) -> Result<Json<RecipeResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let recipe = Recipes::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(id))?;

    Ok(Json(RecipeResponse::from(recipe)))
}

#[utoipa::path(
    post,
    path = "/recipes",
    tag = "recipes",
    summary = "Create recipe",
    request_body = RecipeCreate,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid recipe"),
        (status = 403, description = "Forbidden")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_recipe(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Recipes, operation::CreateAll>,
    Json(create): Json<RecipeCreate>,
) -> Result<(StatusCode, Json<RecipeResponse>)> {
    create.validate()?;
    let request = RecipeCreateDBRequest::new(current_user.id, create)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let recipe = Recipes::new(&mut conn).create(&request).await?;

    tracing::info!(recipe_id = %recipe.id, "Created recipe");
    Ok((StatusCode::CREATED, Json(RecipeResponse::from(recipe))))
}

#[utoipa::path(
    put,
    path = "/recipes/{id}",
    tag = "recipes",
    summary = "Update recipe",
    params(("id" = String, Path, description = "Recipe ID")),
    request_body = RecipeUpdate,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid recipe"),
        (status = 404, description = "Recipe not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
    _: RequiresPermission<resource::Recipes, operation::UpdateAll>,
    Json(update): Json<RecipeUpdate>,
) -> Result<Json<RecipeResponse>> {
    update.validate()?;
    let request = RecipeUpdateDBRequest::try_from(update)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let recipe = Recipes::new(&mut conn).update(id, &request).await?;

    Ok(Json(RecipeResponse::from(recipe)))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}",
    tag = "recipes",
    summary = "Delete recipe",
    params(("id" = String, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 404, description = "Recipe not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
    _: RequiresPermission<resource::Recipes, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Recipes::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// Public search over published recipes. A `status` in the query is ignored.
#[utoipa::path(
    get,
    path = "/recipes",
    tag = "public",
    summary = "Search published recipes",
    params(RecipeFilter),
    responses((status = 200, description = "Published recipes matching the filter", body = Vec<RecipeResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn search_published_recipes(
    State(state): State<AppState>,
    Query(mut filter): Query<RecipeFilter>,
    viewer: Option<CurrentUser>,
) -> Result<Json<Vec<RecipeResponse>>> {
    filter.status = Some(RecipeStatus::Published);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let recipes = Recipes::new(&mut conn).list(&RecipeListFilter::published()).await?;

    let premium = can_view_premium(viewer.as_ref());
    let recipes = recipes
        .into_iter()
        .map(|recipe| RecipeResponse::from(recipe).for_viewer(premium))
        .collect();
    Ok(Json(filter.apply(recipes)))
}

#[utoipa::path(
    get,
    path = "/recipes/{id}",
    tag = "public",
    summary = "Get a published recipe",
    params(("id" = String, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe; premium instructions are only included for members", body = RecipeResponse),
        (status = 404, description = "Recipe not found or not published")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_published_recipe(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
    viewer: Option<CurrentUser>,
) -> Result<Json<RecipeResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let recipe = Recipes::new(&mut conn)
        .get_by_id(id)
        .await?
        .filter(|recipe| recipe.status == RecipeStatus::Published)
        .ok_or_else(|| not_found(id))?;

    Ok(Json(RecipeResponse::from(recipe).for_viewer(can_view_premium(viewer.as_ref()))))
}
