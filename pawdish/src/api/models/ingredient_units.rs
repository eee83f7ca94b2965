//! API models for the ingredient unit table.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::ingredient_units::IngredientUnit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IngredientUnitResponse {
    pub name: String,
    pub unit: String,
    pub grams: f64,
}

impl From<&IngredientUnit> for IngredientUnitResponse {
    fn from(row: &IngredientUnit) -> Self {
        Self {
            name: row.name.to_string(),
            unit: row.unit.to_string(),
            grams: row.grams,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListIngredientUnitsQuery {
    /// Only rows for this ingredient
    pub ingredient: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConvertQuery {
    pub ingredient: String,
    pub unit: String,
}

/// `grams` is 0 when the pair is not in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConvertResponse {
    pub grams: f64,
}
