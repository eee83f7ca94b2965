//! Dummy payment provider implementation
//!
//! Every checkout is instantly "paid": the checkout URL is the success URL itself. The session
//! id encodes the buyer so no provider-side state is needed. Useful for development and tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    api::models::users::CurrentUser,
    config::DummyConfig,
    payment_providers::{PaymentError, PaymentProvider, PaymentSession, Result, WebhookEvent},
    types::{UserId, abbrev_uuid},
};

const SESSION_PREFIX: &str = "dummy_session_";

pub struct DummyProvider {
    amount: Decimal,
}

impl From<DummyConfig> for DummyProvider {
    fn from(config: DummyConfig) -> Self {
        Self { amount: config.amount }
    }
}

/// Session ids look like `dummy_session_{user_id}_{random uuid}`.
fn parse_session_id(session_id: &str) -> Result<UserId> {
    let invalid = || PaymentError::InvalidData("Invalid dummy session ID format".to_string());

    let rest = session_id.strip_prefix(SESSION_PREFIX).ok_or_else(invalid)?;
    let (user_id, nonce) = rest.split_once('_').ok_or_else(invalid)?;
    nonce.parse::<uuid::Uuid>().map_err(|_| invalid())?;
    user_id.parse().map_err(|_| invalid())
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    async fn create_checkout_session(&self, _db_pool: &PgPool, user: &CurrentUser, _cancel_url: &str, success_url: &str) -> Result<String> {
        let session_id = format!("{SESSION_PREFIX}{}_{}", user.id, uuid::Uuid::new_v4());

        tracing::info!(user_id = %abbrev_uuid(&user.id), %session_id, "Dummy provider created checkout session");

        Ok(success_url.replace("{CHECKOUT_SESSION_ID}", &session_id))
    }

    async fn get_payment_session(&self, session_id: &str) -> Result<PaymentSession> {
        Ok(PaymentSession {
            user_id: parse_session_id(session_id)?,
            amount: self.amount,
            is_paid: true,
            payment_provider_id: None,
        })
    }

    async fn validate_webhook(&self, _headers: &axum::http::HeaderMap, _body: &str) -> Result<Option<WebhookEvent>> {
        Ok(None)
    }
}
