//! Database repository for recipes.

use crate::api::models::recipes::{Difficulty, HealthCondition, LifeStage, MealScene, ProteinType, RecipeStatus};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::recipes::{IngredientLine, InstructionStep, RecipeCreateDBRequest, RecipeDBResponse, RecipeUpdateDBRequest},
};
use crate::types::{RecipeId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, types::Json};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing recipes.
///
/// Recipes are listed whole; search and ordering happen in memory via [`crate::search`].
#[derive(Debug, Clone, Default)]
pub struct RecipeListFilter {
    pub status: Option<RecipeStatus>,
}

impl RecipeListFilter {
    pub fn published() -> Self {
        Self {
            status: Some(RecipeStatus::Published),
        }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: String,
    pub cooking_time: i32,
    pub servings: i32,
    pub calories: Option<i32>,
    pub life_stage: LifeStage,
    pub protein_type: ProteinType,
    pub meal_scene: MealScene,
    pub difficulty: Difficulty,
    pub health_conditions: Vec<HealthCondition>,
    pub ingredients: Json<Vec<IngredientLine>>,
    pub instructions: Json<Vec<InstructionStep>>,
    pub thumbnail_url: Option<String>,
    pub video_uid: Option<String>,
    pub is_premium: bool,
    pub status: RecipeStatus,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Recipe> for RecipeDBResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            cooking_time: recipe.cooking_time,
            servings: recipe.servings,
            calories: recipe.calories,
            life_stage: recipe.life_stage,
            protein_type: recipe.protein_type,
            meal_scene: recipe.meal_scene,
            difficulty: recipe.difficulty,
            health_conditions: recipe.health_conditions,
            ingredients: recipe.ingredients.0,
            instructions: recipe.instructions.0,
            thumbnail_url: recipe.thumbnail_url,
            video_uid: recipe.video_uid,
            is_premium: recipe.is_premium,
            status: recipe.status,
            created_by: recipe.created_by,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

pub struct Recipes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Recipes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Recipes<'c> {
    type CreateRequest = RecipeCreateDBRequest;
    type UpdateRequest = RecipeUpdateDBRequest;
    type Response = RecipeDBResponse;
    type Id = RecipeId;
    type Filter = RecipeListFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (
                id, title, description, cooking_time, servings, calories,
                life_stage, protein_type, meal_scene, difficulty, health_conditions,
                ingredients, instructions, thumbnail_url, video_uid, is_premium, status, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.cooking_time)
        .bind(request.servings)
        .bind(request.calories)
        .bind(request.life_stage)
        .bind(request.protein_type)
        .bind(request.meal_scene)
        .bind(request.difficulty)
        .bind(&request.health_conditions)
        .bind(Json(&request.ingredients))
        .bind(Json(&request.instructions))
        .bind(&request.thumbnail_url)
        .bind(&request.video_uid)
        .bind(request.is_premium)
        .bind(request.status)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(recipe.into())
    }

    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let recipe = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(recipe.map(Into::into))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<RecipeId>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let recipes = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(recipes.into_iter().map(|r| (r.id, r.into())).collect())
    }

    #[instrument(skip(self, filter), fields(status = ?filter.status), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let recipes = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT * FROM recipes
            WHERE ($1::recipe_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(filter.status)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(recipes.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE ($1::recipe_status IS NULL OR status = $1)")
            .bind(filter.status)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(recipe_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                cooking_time = COALESCE($4, cooking_time),
                servings = COALESCE($5, servings),
                calories = COALESCE($6, calories),
                life_stage = COALESCE($7, life_stage),
                protein_type = COALESCE($8, protein_type),
                meal_scene = COALESCE($9, meal_scene),
                difficulty = COALESCE($10, difficulty),
                health_conditions = COALESCE($11, health_conditions),
                ingredients = COALESCE($12, ingredients),
                instructions = COALESCE($13, instructions),
                thumbnail_url = COALESCE($14, thumbnail_url),
                video_uid = COALESCE($15, video_uid),
                is_premium = COALESCE($16, is_premium),
                status = COALESCE($17, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.cooking_time)
        .bind(request.servings)
        .bind(request.calories)
        .bind(request.life_stage)
        .bind(request.protein_type)
        .bind(request.meal_scene)
        .bind(request.difficulty)
        .bind(&request.health_conditions)
        .bind(request.ingredients.as_ref().map(Json))
        .bind(request.instructions.as_ref().map(Json))
        .bind(&request.thumbnail_url)
        .bind(&request.video_uid)
        .bind(request.is_premium)
        .bind(request.status)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(recipe.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_user, recipe_create_request};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_round_trips_enums_and_json(pool: PgPool) {
        let admin = create_test_user(&pool, Role::Admin).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recipes::new(&mut conn);

        let mut request = recipe_create_request("Chicken Porridge", LifeStage::Senior, RecipeStatus::Draft);
        request.created_by = Some(admin.id);
        let created = repo.create(&request).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.life_stage, LifeStage::Senior);
        assert_eq!(fetched.health_conditions, vec![HealthCondition::Digestive, HealthCondition::KidneyCare]);
        assert_eq!(fetched.ingredients, request.ingredients);
        assert_eq!(fetched.instructions, request.instructions);
        assert_eq!(fetched.created_by, Some(admin.id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_by_status_and_bulk_lookup(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recipes::new(&mut conn);

        let published = repo
            .create(&recipe_create_request("Published", LifeStage::Adult, RecipeStatus::Published))
            .await
            .unwrap();
        let draft = repo
            .create(&recipe_create_request("Draft", LifeStage::Adult, RecipeStatus::Draft))
            .await
            .unwrap();

        let all = repo.list(&RecipeListFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let public = repo.list(&RecipeListFilter::published()).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, published.id);
        assert_eq!(repo.count(&RecipeListFilter::published()).await.unwrap(), 1);

        let bulk = repo.get_bulk(vec![draft.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(bulk.len(), 1);
        assert!(bulk.contains_key(&draft.id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_partial_update_and_delete(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recipes::new(&mut conn);
        let recipe = repo
            .create(&recipe_create_request("Before", LifeStage::Puppy, RecipeStatus::Draft))
            .await
            .unwrap();

        let updated = repo
            .update(
                recipe.id,
                &RecipeUpdateDBRequest {
                    title: Some("After".to_string()),
                    status: Some(RecipeStatus::Published),
                    health_conditions: Some(vec![]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "After");
        assert_eq!(updated.status, RecipeStatus::Published);
        assert!(updated.health_conditions.is_empty());
        assert_eq!(updated.cooking_time, 20);
        assert_eq!(updated.ingredients.len(), 1);

        assert!(repo.delete(recipe.id).await.unwrap());
        assert!(!repo.delete(recipe.id).await.unwrap());
        assert!(matches!(
            repo.update(recipe.id, &RecipeUpdateDBRequest::default()).await,
            Err(DbError::NotFound)
        ));
    }
}
