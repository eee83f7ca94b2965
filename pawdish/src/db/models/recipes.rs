//! Database models for recipes.

use crate::api::models::recipes::{Difficulty, HealthCondition, LifeStage, MealScene, ProteinType, RecipeStatus};
use crate::types::{RecipeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One ingredient line, stored in order inside the `ingredients` JSONB column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IngredientLine {
    pub name: String,
    pub unit: String,
    pub grams: f64,
}

/// One cooking step, stored in order inside the `instructions` JSONB column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InstructionStep {
    pub step: i32,
    pub text: String,
    /// Image or video shown next to the step
    pub media_url: Option<String>,
}

/// Database request for creating a new recipe
#[derive(Debug, Clone)]
pub struct RecipeCreateDBRequest {
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
    pub ingredients: Vec<IngredientLine>,
    pub instructions: Vec<InstructionStep>,
    pub thumbnail_url: Option<String>,
    pub video_uid: Option<String>,
    pub is_premium: bool,
    pub status: RecipeStatus,
    pub created_by: Option<UserId>,
}

/// Database request for updating a recipe; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cooking_time: Option<i32>,
    pub servings: Option<i32>,
    pub calories: Option<i32>,
    pub life_stage: Option<LifeStage>,
    pub protein_type: Option<ProteinType>,
    pub meal_scene: Option<MealScene>,
    pub difficulty: Option<Difficulty>,
    pub health_conditions: Option<Vec<HealthCondition>>,
    pub ingredients: Option<Vec<IngredientLine>>,
    pub instructions: Option<Vec<InstructionStep>>,
    pub thumbnail_url: Option<String>,
    pub video_uid: Option<String>,
    pub is_premium: Option<bool>,
    pub status: Option<RecipeStatus>,
}

/// Database response for a recipe
#[derive(Debug, Clone)]
pub struct RecipeDBResponse {
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
    pub ingredients: Vec<IngredientLine>,
    pub instructions: Vec<InstructionStep>,
    pub thumbnail_url: Option<String>,
    pub video_uid: Option<String>,
    pub is_premium: bool,
    pub status: RecipeStatus,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
