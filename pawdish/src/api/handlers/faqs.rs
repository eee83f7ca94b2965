//! HTTP handlers for FAQs.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::faqs::{FaqCreate, FaqReorder, FaqResponse, FaqStatus, FaqUpdate, ListFaqsQuery},
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Faqs, Repository, faqs::FaqFilter},
        models::faqs::{FaqCreateDBRequest, FaqUpdateDBRequest},
    },
    errors::{Error, Result},
    types::FaqId,
};

fn not_found(id: FaqId) -> Error {
    Error::NotFound {
        resource: "FAQ".to_string(),
        id: id.to_string(),
    }
}

async fn list(state: &AppState, filter: FaqFilter) -> Result<Vec<FaqResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let faqs = Faqs::new(&mut conn).list(&filter).await?;
    Ok(faqs.into_iter().map(FaqResponse::from).collect())
}

#[utoipa::path(
    get,
    path = "/faqs",
    tag = "faqs",
    summary = "List FAQs",
    params(ListFaqsQuery),
    responses(
        (status = 200, description = "FAQs in display order", body = Vec<FaqResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_faqs(
    State(state): State<AppState>,
    Query(query): Query<ListFaqsQuery>,
    _: RequiresPermission<resource::Faqs, operation::ReadAll>,
) -> Result<Json<Vec<FaqResponse>>> {
    list(&state, FaqFilter { status: query.status }).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/faqs/{id}",
    tag = "faqs",
    summary = "Get FAQ",
    params(("id" = String, Path, description = "FAQ ID")),
    responses(
        (status = 200, description = "FAQ", body = FaqResponse),
        (status = 404, description = "FAQ not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_faq(
    State(state): State<AppState>,
    Path(id): Path<FaqId>,
    _: RequiresPermission<resource::Faqs, operation::ReadAll>,
) -> Result<Json<FaqResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let faq = Faqs::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(id))?;

    Ok(Json(FaqResponse::from(faq)))
}

/// New FAQs go to the end of the display order.
#[utoipa::path(
    post,
    path = "/faqs",
    tag = "faqs",
    summary = "Create FAQ",
    request_body = FaqCreate,
    responses(
        (status = 201, description = "FAQ created", body = FaqResponse),
        (status = 400, description = "Missing question or answer")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_faq(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Faqs, operation::CreateAll>,
    Json(create): Json<FaqCreate>,
) -> Result<(StatusCode, Json<FaqResponse>)> {
    create.validate()?;
    let request = FaqCreateDBRequest {
        question: create.question.trim().to_string(),
        answer: create.answer.trim().to_string(),
        status: create.status.unwrap_or_default(),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let faq = Faqs::new(&mut conn).create(&request).await?;

    Ok((StatusCode::CREATED, Json(FaqResponse::from(faq))))
}

#[utoipa::path(
    put,
    path = "/faqs/{id}",
    tag = "faqs",
    summary = "Update FAQ",
    params(("id" = String, Path, description = "FAQ ID")),
    request_body = FaqUpdate,
    responses(
        (status = 200, description = "FAQ updated", body = FaqResponse),
        (status = 400, description = "Blank question or answer"),
        (status = 404, description = "FAQ not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<FaqId>,
    _: RequiresPermission<resource::Faqs, operation::UpdateAll>,
    Json(update): Json<FaqUpdate>,
) -> Result<Json<FaqResponse>> {
    update.validate()?;
    let request = FaqUpdateDBRequest {
        question: update.question.map(|q| q.trim().to_string()),
        answer: update.answer.map(|a| a.trim().to_string()),
        status: update.status,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let faq = Faqs::new(&mut conn).update(id, &request).await?;

    Ok(Json(FaqResponse::from(faq)))
}

#[utoipa::path(
    delete,
    path = "/faqs/{id}",
    tag = "faqs",
    summary = "Delete FAQ",
    params(("id" = String, Path, description = "FAQ ID")),
    responses(
        (status = 204, description = "FAQ deleted"),
        (status = 404, description = "FAQ not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<FaqId>,
    _: RequiresPermission<resource::Faqs, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Faqs::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// Rewrite the display order. `ids` must list every FAQ exactly once.
#[utoipa::path(
    put,
    path = "/faqs/order",
    tag = "faqs",
    summary = "Reorder FAQs",
    request_body = FaqReorder,
    responses(
        (status = 200, description = "FAQs in their new order", body = Vec<FaqResponse>),
        (status = 400, description = "Ids are not exactly the set of existing FAQs")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(count = reorder.ids.len()))]
pub async fn reorder_faqs(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Faqs, operation::UpdateAll>,
    Json(reorder): Json<FaqReorder>,
) -> Result<Json<Vec<FaqResponse>>> {
    reorder.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Faqs::new(&mut conn);
    if !repo.reorder(&reorder.ids).await? {
        return Err(Error::BadRequest {
            message: "FAQ order must list every FAQ exactly once".to_string(),
        });
    }

    let faqs = repo.list(&FaqFilter::default()).await?;
    Ok(Json(faqs.into_iter().map(FaqResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/faqs",
    tag = "public",
    summary = "List published FAQs",
    responses((status = 200, description = "Published FAQs in display order", body = Vec<FaqResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_published_faqs(State(state): State<AppState>) -> Result<Json<Vec<FaqResponse>>> {
    list(
        &state,
        FaqFilter {
            status: Some(FaqStatus::Published),
        },
    )
    .await
    .map(Json)
}
