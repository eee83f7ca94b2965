//! Recipe filter composer.
//!
//! The recipe list is small enough to fetch whole, so searching happens in memory: every active
//! filter dimension is a predicate, a recipe is kept only if it satisfies all of them, and the
//! survivors are sorted by a single key. Each dimension takes at most one value.
//!
//! The sort is stable, so recipes that compare equal on the chosen key keep the order they were
//! fetched in.

use serde::Deserialize;
use std::cmp::Ordering;
use utoipa::{IntoParams, ToSchema};

use crate::api::models::recipes::{Difficulty, HealthCondition, LifeStage, MealScene, ProteinType, RecipeResponse, RecipeStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    CreatedAt,
    Title,
    CookingTime,
    Calories,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

/// Filter state for recipe search. Every field is optional; absent fields match everything.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RecipeFilter {
    pub life_stage: Option<LifeStage>,
    /// Recipe must address this condition
    pub health_condition: Option<HealthCondition>,
    pub protein_type: Option<ProteinType>,
    pub meal_scene: Option<MealScene>,
    pub difficulty: Option<Difficulty>,
    pub status: Option<RecipeStatus>,
    /// Inclusive lower bound on cooking time in minutes
    pub min_cooking_time: Option<i32>,
    /// Inclusive upper bound on cooking time in minutes
    pub max_cooking_time: Option<i32>,
    /// Inclusive lower bound on kcal; recipes without calories never match a calorie bound
    pub min_calories: Option<i32>,
    /// Inclusive upper bound on kcal
    pub max_calories: Option<i32>,
    /// Case-insensitive text matched against title, description and ingredient names
    pub q: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_dir: Direction,
}

impl RecipeFilter {
    /// Normalized free-text needle, `None` when blank.
    fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// True when no predicate is active. Sorting still applies.
    pub fn is_empty(&self) -> bool {
        self.life_stage.is_none()
            && self.health_condition.is_none()
            && self.protein_type.is_none()
            && self.meal_scene.is_none()
            && self.difficulty.is_none()
            && self.status.is_none()
            && self.min_cooking_time.is_none()
            && self.max_cooking_time.is_none()
            && self.min_calories.is_none()
            && self.max_calories.is_none()
            && self.needle().is_none()
    }

    /// Does `recipe` satisfy every active predicate?
    pub fn matches(&self, recipe: &RecipeResponse) -> bool {
        self.matches_with_needle(recipe, self.needle().as_deref())
    }

    fn matches_with_needle(&self, recipe: &RecipeResponse, needle: Option<&str>) -> bool {
        fn eq_if_set<T: PartialEq>(wanted: Option<T>, actual: T) -> bool {
            wanted.is_none_or(|w| w == actual)
        }

        eq_if_set(self.life_stage, recipe.life_stage)
            && eq_if_set(self.protein_type, recipe.protein_type)
            && eq_if_set(self.meal_scene, recipe.meal_scene)
            && eq_if_set(self.difficulty, recipe.difficulty)
            && eq_if_set(self.status, recipe.status)
            && self
                .health_condition
                .is_none_or(|condition| recipe.health_conditions.contains(&condition))
            && self.min_cooking_time.is_none_or(|min| recipe.cooking_time >= min)
            && self.max_cooking_time.is_none_or(|max| recipe.cooking_time <= max)
            && self
                .min_calories
                .is_none_or(|min| recipe.calories.is_some_and(|kcal| kcal >= min))
            && self
                .max_calories
                .is_none_or(|max| recipe.calories.is_some_and(|kcal| kcal <= max))
            && needle.is_none_or(|needle| text_matches(recipe, needle))
    }

    /// Ordering of two recipes under the chosen key and direction.
    pub fn compare(&self, a: &RecipeResponse, b: &RecipeResponse) -> Ordering {
        let ordering = match self.sort_by {
            SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortBy::CookingTime => a.cooking_time.cmp(&b.cooking_time),
            // Unknown calories order before every known value
            SortBy::Calories => a.calories.cmp(&b.calories),
        };

        match self.sort_dir {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }

    /// Keep the recipes matching every predicate, then sort them.
    pub fn apply(&self, recipes: Vec<RecipeResponse>) -> Vec<RecipeResponse> {
        let needle = self.needle();
        let mut kept: Vec<RecipeResponse> = recipes
            .into_iter()
            .filter(|recipe| self.matches_with_needle(recipe, needle.as_deref()))
            .collect();
        kept.sort_by(|a, b| self.compare(a, b));
        kept
    }
}

fn text_matches(recipe: &RecipeResponse, needle: &str) -> bool {
    recipe.title.to_lowercase().contains(needle)
        || recipe.description.to_lowercase().contains(needle)
        || recipe
            .ingredients
            .iter()
            .any(|line| line.name.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::recipes::IngredientLine;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn recipe(title: &str, life_stage: LifeStage, difficulty: Difficulty, minutes_after_epoch: i64) -> RecipeResponse {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes_after_epoch);
        RecipeResponse {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            cooking_time: 15,
            servings: 1,
            calories: None,
            life_stage,
            protein_type: ProteinType::Chicken,
            meal_scene: MealScene::Daily,
            difficulty,
            health_conditions: vec![],
            ingredients: vec![],
            instructions: vec![],
            thumbnail_url: None,
            video_uid: None,
            is_premium: false,
            status: RecipeStatus::Published,
            created_by: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn sample() -> Vec<RecipeResponse> {
        let mut chicken = recipe("Chicken & Pumpkin Bowl", LifeStage::Puppy, Difficulty::Easy, 0);
        chicken.cooking_time = 20;
        chicken.calories = Some(320);
        chicken.health_conditions = vec![HealthCondition::Digestive];
        chicken.ingredients = vec![IngredientLine {
            name: "鶏むね肉".to_string(),
            unit: "1枚".to_string(),
            grams: 150.0,
        }];

        let mut salmon = recipe("salmon rice", LifeStage::Adult, Difficulty::Medium, 10);
        salmon.cooking_time = 35;
        salmon.calories = Some(410);
        salmon.protein_type = ProteinType::Fish;
        salmon.health_conditions = vec![HealthCondition::SkinCoat, HealthCondition::JointCare];
        salmon.description = "Omega-3 rich dinner".to_string();

        let mut tofu = recipe("Tofu Snack", LifeStage::Senior, Difficulty::Easy, 5);
        tofu.cooking_time = 5;
        tofu.meal_scene = MealScene::Snack;
        tofu.status = RecipeStatus::Draft;
        tofu.health_conditions = vec![HealthCondition::KidneyCare];

        vec![chicken, salmon, tofu]
    }

    fn titles(recipes: &[RecipeResponse]) -> Vec<&str> {
        recipes.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_life_stage_and_difficulty_are_combined_with_and() {
        let recipes = vec![
            recipe("Puppy Easy", LifeStage::Puppy, Difficulty::Easy, 0),
            recipe("Adult Easy", LifeStage::Adult, Difficulty::Easy, 1),
        ];
        let filter = RecipeFilter {
            life_stage: Some(LifeStage::Puppy),
            difficulty: Some(Difficulty::Easy),
            ..Default::default()
        };

        let result = filter.apply(recipes);
        assert_eq!(titles(&result), vec!["Puppy Easy"]);
    }

    #[test]
    fn test_empty_filter_keeps_everything_newest_first() {
        let filter = RecipeFilter::default();
        assert!(filter.is_empty());

        let result = filter.apply(sample());
        assert_eq!(titles(&result), vec!["salmon rice", "Tofu Snack", "Chicken & Pumpkin Bowl"]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let filter = RecipeFilter {
            protein_type: Some(ProteinType::Horse),
            ..Default::default()
        };
        assert!(filter.apply(sample()).is_empty());
    }

    #[test]
    fn test_health_condition_is_set_membership() {
        let filter = RecipeFilter {
            health_condition: Some(HealthCondition::JointCare),
            ..Default::default()
        };
        assert_eq!(titles(&filter.apply(sample())), vec!["salmon rice"]);
    }

    #[test]
    fn test_ranges_are_inclusive_and_unknown_calories_never_match() {
        let filter = RecipeFilter {
            min_cooking_time: Some(5),
            max_cooking_time: Some(20),
            sort_dir: Direction::Asc,
            ..Default::default()
        };
        assert_eq!(titles(&filter.apply(sample())), vec!["Chicken & Pumpkin Bowl", "Tofu Snack"]);

        let filter = RecipeFilter {
            max_calories: Some(1000),
            ..Default::default()
        };
        // Tofu Snack has no calorie value
        assert_eq!(titles(&filter.apply(sample())), vec!["salmon rice", "Chicken & Pumpkin Bowl"]);
    }

    #[test]
    fn test_free_text_searches_title_description_and_ingredients() {
        let by_ingredient = RecipeFilter {
            q: Some("鶏むね".to_string()),
            ..Default::default()
        };
        assert_eq!(titles(&by_ingredient.apply(sample())), vec!["Chicken & Pumpkin Bowl"]);

        let by_description = RecipeFilter {
            q: Some("  OMEGA ".to_string()),
            ..Default::default()
        };
        assert_eq!(titles(&by_description.apply(sample())), vec!["salmon rice"]);

        let blank = RecipeFilter {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.is_empty());
        assert_eq!(blank.apply(sample()).len(), 3);
    }

    #[test]
    fn test_sort_by_title_is_case_insensitive() {
        let filter = RecipeFilter {
            sort_by: SortBy::Title,
            sort_dir: Direction::Asc,
            ..Default::default()
        };
        assert_eq!(
            titles(&filter.apply(sample())),
            vec!["Chicken & Pumpkin Bowl", "salmon rice", "Tofu Snack"]
        );
    }

    #[test]
    fn test_sort_by_calories_puts_unknown_first_ascending() {
        let filter = RecipeFilter {
            sort_by: SortBy::Calories,
            sort_dir: Direction::Asc,
            ..Default::default()
        };
        assert_eq!(
            titles(&filter.apply(sample())),
            vec!["Tofu Snack", "Chicken & Pumpkin Bowl", "salmon rice"]
        );
    }

    #[test]
    fn test_ties_keep_input_order() {
        let recipes = vec![
            recipe("first", LifeStage::Adult, Difficulty::Easy, 0),
            recipe("second", LifeStage::Adult, Difficulty::Easy, 1),
            recipe("third", LifeStage::Adult, Difficulty::Easy, 2),
        ];
        // All have cooking_time 15
        for sort_dir in [Direction::Asc, Direction::Desc] {
            let filter = RecipeFilter {
                sort_by: SortBy::CookingTime,
                sort_dir,
                ..Default::default()
            };
            assert_eq!(titles(&filter.apply(recipes.clone())), vec!["first", "second", "third"]);
        }
    }

    #[test]
    fn test_result_is_subset_matching_every_predicate_and_resort_is_idempotent() {
        let filters = [
            RecipeFilter {
                difficulty: Some(Difficulty::Easy),
                sort_by: SortBy::CookingTime,
                ..Default::default()
            },
            RecipeFilter {
                status: Some(RecipeStatus::Published),
                min_calories: Some(300),
                sort_by: SortBy::Title,
                sort_dir: Direction::Asc,
                ..Default::default()
            },
            RecipeFilter {
                meal_scene: Some(MealScene::Snack),
                life_stage: Some(LifeStage::Senior),
                q: Some("tofu".to_string()),
                ..Default::default()
            },
        ];

        let input = sample();
        for filter in filters {
            let result = filter.apply(input.clone());

            assert!(result.len() <= input.len());
            for recipe in &result {
                assert!(input.iter().any(|r| r.id == recipe.id));
                assert!(filter.matches(recipe));
            }
            for pair in result.windows(2) {
                assert_ne!(filter.compare(&pair[0], &pair[1]), Ordering::Greater);
            }

            let resorted = filter.apply(result.clone());
            let ids: Vec<_> = result.iter().map(|r| r.id).collect();
            let resorted_ids: Vec<_> = resorted.iter().map(|r| r.id).collect();
            assert_eq!(ids, resorted_ids);
        }
    }

    fn from_query(query: &str) -> RecipeFilter {
        let uri: axum::http::Uri = format!("/api/v1/recipes?{query}").parse().unwrap();
        axum::extract::Query::<RecipeFilter>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_deserializes_from_query_string() {
        let filter = from_query("life_stage=puppy&difficulty=easy&min_cooking_time=10&max_calories=400&q=chicken%20rice&sort_by=cooking_time&sort_dir=asc");
        assert_eq!(filter.life_stage, Some(LifeStage::Puppy));
        assert_eq!(filter.difficulty, Some(Difficulty::Easy));
        assert_eq!(filter.min_cooking_time, Some(10));
        assert_eq!(filter.max_calories, Some(400));
        assert_eq!(filter.q.as_deref(), Some("chicken rice"));
        assert_eq!(filter.sort_by, SortBy::CookingTime);
        assert_eq!(filter.sort_dir, Direction::Asc);

        let empty = from_query("");
        assert!(empty.is_empty());
        assert_eq!(empty.sort_by, SortBy::CreatedAt);
        assert_eq!(empty.sort_dir, Direction::Desc);

        let uri: axum::http::Uri = "/api/v1/recipes?life_stage=kitten".parse().unwrap();
        assert!(axum::extract::Query::<RecipeFilter>::try_from_uri(&uri).is_err());
    }
}
