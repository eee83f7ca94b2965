//! Payment provider abstraction layer
//!
//! Premium membership is sold through a hosted checkout. This module defines the
//! [`PaymentProvider`] trait that each provider implements, and the provider-independent
//! fulfilment logic: once a checkout session is paid, one payment row is written and the buyer's
//! `premium_until` is extended, in a single transaction.
//!
//! Fulfilment is idempotent. A session that already has a payment row is skipped before the
//! provider is even asked, and the unique constraint on `payments.provider_session_id` catches
//! concurrent attempts (the success page and the webhook often race).

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    api::models::users::CurrentUser,
    config::PaymentConfig,
    db::{
        errors::DbError,
        handlers::{Payments, Users, payments::is_duplicate_session},
        models::payments::PaymentCreateDBRequest,
    },
    errors::Error,
    types::{UserId, abbrev_uuid},
};

pub mod dummy;
pub mod stripe;

/// Webhook event types that mean a checkout session has been paid.
pub const PAID_SESSION_EVENTS: [&str; 2] = ["checkout.session.completed", "checkout.session.async_payment_succeeded"];

/// Create a payment provider from configuration
///
/// Adding a new provider requires adding a match arm here.
pub fn create_provider(config: PaymentConfig) -> Arc<dyn PaymentProvider> {
    match config {
        PaymentConfig::Stripe(stripe_config) => Arc::new(stripe::StripeProvider::from(stripe_config)),
        PaymentConfig::Dummy(dummy_config) => Arc::new(dummy::DummyProvider::from(dummy_config)),
    }
}

/// Result type for payment provider operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider API error: {0}")]
    ProviderApi(String),

    #[error(transparent)]
    Database(DbError),

    #[error("Payment not completed yet")]
    PaymentNotCompleted,

    #[error("Invalid payment data: {0}")]
    InvalidData(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Payment already processed")]
    AlreadyProcessed,
}

impl From<DbError> for PaymentError {
    fn from(err: DbError) -> Self {
        if is_duplicate_session(&err) {
            PaymentError::AlreadyProcessed
        } else {
            PaymentError::Database(err)
        }
    }
}

impl From<sqlx::Error> for PaymentError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

impl From<PaymentError> for Error {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::ProviderApi(message) => Error::ServiceUnavailable {
                service: "Payment provider".to_string(),
                message,
            },
            PaymentError::Database(db) => Error::Database(db),
            PaymentError::PaymentNotCompleted => Error::PaymentRequired {
                message: "Payment has not been completed".to_string(),
            },
            PaymentError::InvalidData(message) => Error::BadRequest { message },
            PaymentError::InvalidSignature(_) => Error::BadRequest {
                message: "Invalid webhook signature".to_string(),
            },
            PaymentError::AlreadyProcessed => Error::Conflict {
                message: "Payment already processed".to_string(),
            },
        }
    }
}

/// A checkout session as reported by the provider
#[derive(Debug, Clone)]
pub struct PaymentSession {
    /// Local user who bought the membership
    pub user_id: UserId,
    /// Amount paid, in major currency units
    pub amount: Decimal,
    /// Whether the payment has been completed
    pub is_paid: bool,
    /// Provider-side customer id, when the provider has one
    pub payment_provider_id: Option<String>,
}

/// Represents a webhook event from a payment provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Type of event (e.g., "checkout.session.completed")
    pub event_type: String,
    /// Session ID associated with this event, if applicable
    pub session_id: Option<String>,
}

/// Abstract payment provider interface
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a new checkout session for a membership purchase
    ///
    /// Returns a URL that the user should be redirected to for payment. `success_url` may contain
    /// the `{CHECKOUT_SESSION_ID}` placeholder, which the provider fills in.
    async fn create_checkout_session(
        &self,
        db_pool: &PgPool,
        user: &CurrentUser,
        cancel_url: &str,
        success_url: &str,
    ) -> Result<String>;

    /// Retrieve a payment session from the provider
    async fn get_payment_session(&self, session_id: &str) -> Result<PaymentSession>;

    /// Validate and extract webhook event from raw request data
    ///
    /// Returns None if this provider doesn't support webhooks.
    /// Returns Err if validation fails (invalid signature, malformed data, etc.)
    async fn validate_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<Option<WebhookEvent>>;

    /// Fulfil a paid session: record the payment and extend the buyer's membership.
    ///
    /// Calling this any number of times for one session writes one payment row.
    async fn process_payment_session(&self, db_pool: &PgPool, session_id: &str, membership: Duration) -> Result<()> {
        {
            let mut conn = db_pool.acquire().await?;
            if Payments::new(&mut conn).find_by_session(session_id).await?.is_some() {
                tracing::debug!(session_id, "Session already fulfilled");
                return Ok(());
            }
        }

        let session = self.get_payment_session(session_id).await?;
        if !session.is_paid {
            return Err(PaymentError::PaymentNotCompleted);
        }

        match fulfil_session(db_pool, session_id, &session, membership).await {
            Ok(()) | Err(PaymentError::AlreadyProcessed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Process a validated webhook event. Events other than a paid checkout are acknowledged
    /// and ignored.
    async fn process_webhook_event(&self, db_pool: &PgPool, event: &WebhookEvent, membership: Duration) -> Result<()> {
        if !PAID_SESSION_EVENTS.contains(&event.event_type.as_str()) {
            tracing::debug!(event_type = %event.event_type, "Ignoring webhook event");
            return Ok(());
        }

        let session_id = event
            .session_id
            .as_deref()
            .ok_or_else(|| PaymentError::InvalidData("Checkout event without a session id".to_string()))?;

        self.process_payment_session(db_pool, session_id, membership).await
    }
}

/// Write the payment row and extend membership in one transaction.
///
/// Fails with [`PaymentError::AlreadyProcessed`] if another request fulfilled the session first.
async fn fulfil_session(db_pool: &PgPool, session_id: &str, session: &PaymentSession, membership: Duration) -> Result<()> {
    let mut tx = db_pool.begin().await?;

    Payments::new(&mut tx)
        .create(&PaymentCreateDBRequest {
            user_id: session.user_id,
            provider_session_id: session_id.to_string(),
            amount: session.amount,
        })
        .await?;

    let mut users = Users::new(&mut tx);
    let premium_until = users.extend_premium(session.user_id, membership).await?;
    if let Some(customer_id) = &session.payment_provider_id {
        users.set_payment_provider_id(session.user_id, customer_id).await?;
    }

    tx.commit().await?;

    tracing::info!(
        user_id = %abbrev_uuid(&session.user_id),
        session_id,
        amount = %session.amount,
        %premium_until,
        "Premium membership purchased"
    );
    Ok(())
}
