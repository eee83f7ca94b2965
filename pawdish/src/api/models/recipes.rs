//! API request/response models for recipes.

use crate::db::models::recipes::{IngredientLine, InstructionStep, RecipeDBResponse};
use crate::errors::Result;
use crate::ingredient_units;
use crate::types::{RecipeId, UserId};
use crate::validation::{require_non_negative, require_text, require_text_if_present};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Dog-age bucket a recipe is written for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "life_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Puppy,
    Adult,
    Senior,
    All,
}

impl LifeStage {
    pub const VARIANTS: [LifeStage; 4] = [LifeStage::Puppy, LifeStage::Adult, LifeStage::Senior, LifeStage::All];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "protein_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProteinType {
    Chicken,
    Beef,
    Pork,
    Fish,
    Lamb,
    Horse,
    Venison,
    Egg,
    Other,
}

/// Intended usage context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "meal_scene", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MealScene {
    Daily,
    Snack,
    Special,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "difficulty", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Dietary concern a recipe addresses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "health_condition", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HealthCondition {
    KidneyCare,
    WeightManagement,
    Allergy,
    Digestive,
    JointCare,
    SkinCoat,
    HeartCare,
    Diabetes,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "recipe_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecipeStatus {
    #[default]
    Draft,
    Published,
}

/// Ingredient line as submitted. Missing `grams` are filled from the ingredient unit table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientLineInput {
    pub name: String,
    pub unit: String,
    pub grams: Option<f64>,
}

impl IngredientLineInput {
    fn resolve(self) -> IngredientLine {
        let grams = self
            .grams
            .unwrap_or_else(|| ingredient_units::convert_to_grams(&self.name, &self.unit));
        IngredientLine {
            name: self.name.trim().to_string(),
            unit: self.unit.trim().to_string(),
            grams,
        }
    }
}

/// Resolves submitted ingredient lines, keeping their order.
pub fn resolve_ingredients(lines: Vec<IngredientLineInput>) -> Result<Vec<IngredientLine>> {
    lines
        .into_iter()
        .map(|line| {
            require_text(&line.name, "Ingredient name")?;
            if line.grams.is_some_and(|g| g < 0.0 || !g.is_finite()) {
                return Err(crate::errors::Error::BadRequest {
                    message: format!("Ingredient '{}' has an invalid gram amount", line.name.trim()),
                });
            }
            Ok(line.resolve())
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Minutes
    pub cooking_time: i32,
    pub servings: i32,
    /// kcal per serving
    pub calories: Option<i32>,
    pub life_stage: LifeStage,
    pub protein_type: ProteinType,
    pub meal_scene: MealScene,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub health_conditions: Vec<HealthCondition>,
    #[serde(default)]
    pub ingredients: Vec<IngredientLineInput>,
    #[serde(default)]
    pub instructions: Vec<InstructionStep>,
    pub thumbnail_url: Option<String>,
    pub video_uid: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    pub status: Option<RecipeStatus>,
}

impl RecipeCreate {
    pub fn validate(&self) -> Result<()> {
        require_text(&self.title, "Title")?;
        require_non_negative(self.cooking_time, "Cooking time")?;
        require_non_negative(self.servings, "Servings")?;
        if let Some(calories) = self.calories {
            require_non_negative(calories, "Calories")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RecipeUpdate {
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
    pub ingredients: Option<Vec<IngredientLineInput>>,
    pub instructions: Option<Vec<InstructionStep>>,
    pub thumbnail_url: Option<String>,
    pub video_uid: Option<String>,
    pub is_premium: Option<bool>,
    pub status: Option<RecipeStatus>,
}

impl RecipeUpdate {
    pub fn validate(&self) -> Result<()> {
        require_text_if_present(self.title.as_deref(), "Title")?;
        for (value, label) in [
            (self.cooking_time, "Cooking time"),
            (self.servings, "Servings"),
            (self.calories, "Calories"),
        ] {
            if let Some(value) = value {
                require_non_negative(value, label)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    #[schema(value_type = String, format = "uuid")]
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
    #[schema(value_type = Option<String>, format = "uuid")]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeResponse {
    /// Total weight of all ingredient lines.
    pub fn total_grams(&self) -> f64 {
        self.ingredients.iter().map(|line| line.grams).sum()
    }

    /// Strips the instructions of a premium recipe unless the viewer may see premium content.
    pub fn for_viewer(mut self, can_view_premium: bool) -> Self {
        if self.is_premium && !can_view_premium {
            self.instructions.clear();
        }
        self
    }
}

impl From<RecipeDBResponse> for RecipeResponse {
    fn from(db: RecipeDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            cooking_time: db.cooking_time,
            servings: db.servings,
            calories: db.calories,
            life_stage: db.life_stage,
            protein_type: db.protein_type,
            meal_scene: db.meal_scene,
            difficulty: db.difficulty,
            health_conditions: db.health_conditions,
            ingredients: db.ingredients,
            instructions: db.instructions,
            thumbnail_url: db.thumbnail_url,
            video_uid: db.video_uid,
            is_premium: db.is_premium,
            status: db.status,
            created_by: db.created_by,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
