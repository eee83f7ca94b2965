//! HTTP handlers for site settings.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::settings::{SettingResponse, SettingUpsert},
    auth::permissions::{RequiresPermission, operation, resource},
    db::{handlers::Settings, models::settings::SettingUpsertDBRequest},
    errors::{Error, Result},
    validation::is_valid_setting_key,
};

fn validate_key(key: &str) -> Result<()> {
    if is_valid_setting_key(key) {
        Ok(())
    } else {
        Err(Error::BadRequest {
            message: format!("Invalid setting key '{key}': use lowercase letters, digits, '_', '.' and '-'"),
        })
    }
}

fn not_found(key: &str) -> Error {
    Error::NotFound {
        resource: "Setting".to_string(),
        id: key.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    summary = "List settings",
    responses(
        (status = 200, description = "All settings, by key", body = Vec<SettingResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_settings(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Settings, operation::ReadAll>,
) -> Result<Json<Vec<SettingResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let settings = Settings::new(&mut conn).list().await?;

    Ok(Json(settings.into_iter().map(SettingResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/settings/{key}",
    tag = "settings",
    summary = "Get setting",
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 200, description = "Setting", body = SettingResponse),
        (status = 400, description = "Invalid key"),
        (status = 404, description = "Setting not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(key = %key))]
pub async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    _: RequiresPermission<resource::Settings, operation::ReadAll>,
) -> Result<Json<SettingResponse>> {
    validate_key(&key)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let setting = Settings::new(&mut conn).get(&key).await?.ok_or_else(|| not_found(&key))?;

    Ok(Json(SettingResponse::from(setting)))
}

#[utoipa::path(
    put,
    path = "/settings/{key}",
    tag = "settings",
    summary = "Create or replace setting",
    params(("key" = String, Path, description = "Setting key")),
    request_body = SettingUpsert,
    responses(
        (status = 200, description = "Stored setting", body = SettingResponse),
        (status = 400, description = "Invalid key")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(key = %key))]
pub async fn upsert_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    _: RequiresPermission<resource::Settings, operation::UpdateAll>,
    Json(upsert): Json<SettingUpsert>,
) -> Result<Json<SettingResponse>> {
    validate_key(&key)?;

    let request = SettingUpsertDBRequest {
        key,
        value: upsert.value,
        description: upsert.description,
    };
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let setting = Settings::new(&mut conn).upsert(&request).await?;

    Ok(Json(SettingResponse::from(setting)))
}

#[utoipa::path(
    delete,
    path = "/settings/{key}",
    tag = "settings",
    summary = "Delete setting",
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 204, description = "Setting deleted"),
        (status = 404, description = "Setting not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(key = %key))]
pub async fn delete_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    _: RequiresPermission<resource::Settings, operation::DeleteAll>,
) -> Result<StatusCode> {
    validate_key(&key)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Settings::new(&mut conn).delete(&key).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&key))
    }
}
