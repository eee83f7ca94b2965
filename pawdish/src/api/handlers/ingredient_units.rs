//! Read-only HTTP access to the ingredient unit table.

use axum::{Json, extract::Query};

use crate::{
    api::models::ingredient_units::{ConvertQuery, ConvertResponse, IngredientUnitResponse, ListIngredientUnitsQuery},
    ingredient_units,
};

#[utoipa::path(
    get,
    path = "/ingredient-units",
    tag = "public",
    summary = "List ingredient units",
    params(ListIngredientUnitsQuery),
    responses((status = 200, description = "Unit table rows, in table order", body = Vec<IngredientUnitResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_ingredient_units(Query(query): Query<ListIngredientUnitsQuery>) -> Json<Vec<IngredientUnitResponse>> {
    let rows = ingredient_units::all()
        .iter()
        .filter(|row| query.ingredient.as_deref().is_none_or(|name| row.name == name))
        .map(IngredientUnitResponse::from)
        .collect();
    Json(rows)
}

/// Unknown ingredient/unit pairs convert to 0 grams rather than failing.
#[utoipa::path(
    get,
    path = "/ingredient-units/convert",
    tag = "public",
    summary = "Convert a unit to grams",
    params(ConvertQuery),
    responses((status = 200, description = "Weight in grams", body = ConvertResponse))
)]
#[tracing::instrument(skip_all, fields(ingredient = %query.ingredient, unit = %query.unit))]
pub async fn convert(Query(query): Query<ConvertQuery>) -> Json<ConvertResponse> {
    Json(ConvertResponse {
        grams: ingredient_units::convert_to_grams(&query.ingredient, &query.unit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_app;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_convert_known_and_unknown_pairs(pool: PgPool) {
        let (server, _) = create_test_app(pool).await;

        let known: ConvertResponse = server
            .get("/api/v1/ingredient-units/convert")
            .add_query_param("ingredient", "鶏むね肉")
            .add_query_param("unit", "1枚")
            .await
            .json();
        assert_eq!(known.grams, 150.0);

        let unknown: ConvertResponse = server
            .get("/api/v1/ingredient-units/convert")
            .add_query_param("ingredient", "鶏むね肉")
            .add_query_param("unit", "9枚")
            .await
            .json();
        assert_eq!(unknown.grams, 0.0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_ingredient(pool: PgPool) {
        let (server, _) = create_test_app(pool).await;

        let all: Vec<IngredientUnitResponse> = server.get("/api/v1/ingredient-units").await.json();
        assert_eq!(all.len(), ingredient_units::all().len());

        let chicken: Vec<IngredientUnitResponse> = server
            .get("/api/v1/ingredient-units")
            .add_query_param("ingredient", "鶏むね肉")
            .await
            .json();
        assert!(!chicken.is_empty());
        assert!(chicken.iter().all(|row| row.name == "鶏むね肉"));
        assert_eq!(
            chicken.iter().map(|row| row.unit.as_str()).collect::<Vec<_>>(),
            ingredient_units::units_for("鶏むね肉")
        );
    }
}
