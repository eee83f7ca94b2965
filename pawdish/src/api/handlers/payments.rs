//! HTTP handlers for premium membership payments.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;

use crate::{
    AppState,
    api::models::{
        payments::{CheckoutResponse, MembershipResponse, PaymentResponse},
        users::CurrentUser,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::{Payments, Repository, Users},
    errors::{Error, Result},
    payment_providers::PaymentProvider,
};

fn provider(state: &AppState) -> Result<Arc<dyn PaymentProvider>> {
    state.payment.clone().ok_or_else(|| Error::ServiceUnavailable {
        service: "Payments".to_string(),
        message: "no payment provider configured".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/payments/checkout",
    tag = "payments",
    summary = "Start a membership checkout",
    responses(
        (status = 200, description = "Redirect the browser to the returned URL", body = CheckoutResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "No payment provider configured")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_checkout(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Payments, operation::CreateOwn>,
) -> Result<Json<CheckoutResponse>> {
    let provider = provider(&state)?;

    let site = state.config.site_url.trim_end_matches('/');
    let success_url = format!("{site}/premium?payment=success&session_id={{CHECKOUT_SESSION_ID}}");
    let cancel_url = format!("{site}/premium?payment=cancelled");

    let url = provider
        .create_checkout_session(&state.db, &current_user, &cancel_url, &success_url)
        .await?;

    Ok(Json(CheckoutResponse { url }))
}

/// Provider webhook. The raw body is needed for signature verification.
#[utoipa::path(
    post,
    path = "/payments/webhook",
    tag = "payments",
    summary = "Payment provider webhook",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Invalid signature or payload"),
        (status = 503, description = "No payment provider configured")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: String) -> Result<StatusCode> {
    let provider = provider(&state)?;

    let Some(event) = provider.validate_webhook(&headers, &body).await? else {
        return Err(Error::BadRequest {
            message: "The configured payment provider does not send webhooks".to_string(),
        });
    };

    provider
        .process_webhook_event(&state.db, &event, state.config.membership.duration)
        .await?;
    state.analytics.invalidate().await;

    Ok(StatusCode::OK)
}

/// Called from the checkout success page so membership is granted without waiting for the webhook.
#[utoipa::path(
    patch,
    path = "/payments/{session_id}",
    tag = "payments",
    summary = "Process a completed checkout session",
    params(("session_id" = String, Path, description = "Provider checkout session id")),
    responses(
        (status = 200, description = "Session processed", body = MembershipResponse),
        (status = 400, description = "Unknown session"),
        (status = 402, description = "Session not paid yet"),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn process_payment(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    current_user: RequiresPermission<resource::Payments, operation::CreateOwn>,
) -> Result<Json<MembershipResponse>> {
    let provider = provider(&state)?;
    provider
        .process_payment_session(&state.db, &session_id, state.config.membership.duration)
        .await?;
    // Premium member counts just changed
    state.analytics.invalidate().await;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: current_user.id.to_string(),
        })?;
    let current = CurrentUser::from(user);

    Ok(Json(MembershipResponse {
        is_premium: current.is_premium(),
        premium_until: current.premium_until,
    }))
}

#[utoipa::path(
    get,
    path = "/payments",
    tag = "payments",
    summary = "List my payments",
    responses(
        (status = 200, description = "Payments, newest first", body = Vec<PaymentResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_my_payments(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Payments, operation::ReadOwn>,
) -> Result<Json<Vec<PaymentResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let payments = Payments::new(&mut conn).list_for_user(current_user.id).await?;

    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use crate::api::models::payments::{CheckoutResponse, MembershipResponse, PaymentResponse};
    use crate::api::models::users::Role;
    use crate::config::{DummyConfig, PaymentConfig};
    use crate::test_utils::{add_auth_headers, create_test_app_with_config, create_test_config, create_test_user};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn dummy_payments() -> crate::Config {
        let mut config = create_test_config();
        config.payment = Some(PaymentConfig::Dummy(DummyConfig {
            amount: Decimal::new(980, 0),
        }));
        config
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_dummy_checkout_grants_membership_once(pool: PgPool) {
        let config = dummy_payments();
        let (server, _state) = create_test_app_with_config(pool.clone(), config.clone()).await;
        let user = create_test_user(&pool, Role::User).await;
        let headers = add_auth_headers(&user, &config);

        let checkout = server
            .post("/api/v1/payments/checkout")
            .add_header(&headers[0].0, &headers[0].1)
            .await;
        checkout.assert_status_ok();
        let url = checkout.json::<CheckoutResponse>().url;
        assert!(url.starts_with(&format!("{}/premium?payment=success", config.site_url)));
        let session_id = url.split("session_id=").nth(1).unwrap().to_string();

        for _ in 0..2 {
            let processed = server
                .patch(&format!("/api/v1/payments/{session_id}"))
                .add_header(&headers[0].0, &headers[0].1)
                .await;
            processed.assert_status_ok();
            let membership = processed.json::<MembershipResponse>();
            assert!(membership.is_premium);
        }

        let payments = server
            .get("/api/v1/payments")
            .add_header(&headers[0].0, &headers[0].1)
            .await
            .json::<Vec<PaymentResponse>>();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, Decimal::new(980, 0));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_checkout_requires_login_and_provider(pool: PgPool) {
        let config = create_test_config();
        let (server, _state) = create_test_app_with_config(pool.clone(), config.clone()).await;

        server.post("/api/v1/payments/checkout").await.assert_status_unauthorized();

        let user = create_test_user(&pool, Role::User).await;
        let headers = add_auth_headers(&user, &config);
        server
            .post("/api/v1/payments/checkout")
            .add_header(&headers[0].0, &headers[0].1)
            .await
            .assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_dummy_provider_has_no_webhooks(pool: PgPool) {
        let (server, _state) = create_test_app_with_config(pool, dummy_payments()).await;
        server
            .post("/api/v1/payments/webhook")
            .text("{}")
            .await
            .assert_status_bad_request();
    }
}
