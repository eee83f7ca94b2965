//! HTTP handler for the admin analytics dashboard.

use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::analytics::AnalyticsDashboard,
    auth::permissions::{RequiresPermission, operation, resource},
    errors::Result,
};

/// Five content and user metrics, fetched concurrently and cached briefly. Any failing metric
/// fails the whole request.
#[utoipa::path(
    get,
    path = "/analytics",
    tag = "analytics",
    summary = "Get dashboard metrics",
    responses(
        (status = 200, description = "Dashboard metrics", body = AnalyticsDashboard),
        (status = 403, description = "Forbidden")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Analytics, operation::ReadAll>,
) -> Result<Json<AnalyticsDashboard>> {
    let dashboard = state.analytics.get_or_compute(&state.db).await?;
    Ok(Json(dashboard))
}
