//! Stripe payment provider implementation
//!
//! Checkout sessions are created and retrieved through the async-stripe client, and webhook
//! payloads are verified with `stripe_webhook::Webhook`. The signature timestamp is screened
//! against the configured tolerance before the payload is handed to the library.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::time::Duration;
use stripe::Client;
use stripe_checkout::{
    CheckoutSessionId, CheckoutSessionMode, CheckoutSessionPaymentStatus,
    checkout_session::{CreateCheckoutSession, CreateCheckoutSessionCustomerCreation, CreateCheckoutSessionLineItems, RetrieveCheckoutSession},
};
use stripe_webhook::{EventObject, Webhook};

use crate::{
    api::models::users::CurrentUser,
    config::StripeConfig,
    db::handlers::Users,
    payment_providers::{PAID_SESSION_EVENTS, PaymentError, PaymentProvider, PaymentSession, Result, WebhookEvent},
    types::abbrev_uuid,
};

const SIGNATURE_HEADER: &str = "stripe-signature";

/// Currencies Stripe expresses in whole units rather than hundredths.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv", "xaf", "xof", "xpf",
];

/// Stripe payment provider
pub struct StripeProvider {
    client: Client,
    price_id: String,
    webhook_secret: String,
    webhook_tolerance: Duration,
}

impl From<StripeConfig> for StripeProvider {
    fn from(config: StripeConfig) -> Self {
        Self {
            client: Client::new(config.api_key),
            price_id: config.price_id,
            webhook_secret: config.webhook_secret,
            webhook_tolerance: config.webhook_tolerance,
        }
    }
}

fn provider_error(action: &str, err: impl std::fmt::Display) -> PaymentError {
    tracing::error!("Failed to {action}: {err}");
    PaymentError::ProviderApi(err.to_string())
}

/// Convert a Stripe minor-unit amount into major units.
fn to_major_units(amount: i64, currency: Option<&str>) -> Decimal {
    let zero_decimal = currency.is_some_and(|c| ZERO_DECIMAL_CURRENCIES.contains(&c.to_ascii_lowercase().as_str()));
    Decimal::new(amount, if zero_decimal { 0 } else { 2 })
}

/// Checkout session ids are `cs_` followed by URL-safe characters; anything else is refused
/// before it reaches a request path.
fn is_valid_session_id(session_id: &str) -> bool {
    session_id
        .strip_prefix("cs_")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

/// Reject a `Stripe-Signature` header whose `t=` timestamp is missing or further than
/// `tolerance` from `now`. The header is untrusted, so the distance is computed without
/// signed arithmetic.
fn check_signature_timestamp(header: &str, tolerance: Duration, now: i64) -> Result<()> {
    let signed_at = header
        .split(',')
        .find_map(|part| part.trim().strip_prefix("t="))
        .and_then(|t| t.parse::<i64>().ok())
        .ok_or_else(|| PaymentError::InvalidSignature("missing timestamp".to_string()))?;

    if now.abs_diff(signed_at) > tolerance.as_secs() {
        return Err(PaymentError::InvalidSignature("timestamp outside tolerance".to_string()));
    }
    Ok(())
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_checkout_session(&self, db_pool: &PgPool, user: &CurrentUser, cancel_url: &str, success_url: &str) -> Result<String> {
        let mut params = CreateCheckoutSession::new()
            .mode(CheckoutSessionMode::Payment)
            .cancel_url(cancel_url)
            .success_url(success_url)
            .client_reference_id(user.id.to_string())
            .line_items(vec![CreateCheckoutSessionLineItems {
                price: Some(self.price_id.clone()),
                quantity: Some(1),
                ..Default::default()
            }]);

        // Reuse the Stripe customer if we have one, otherwise let Stripe create one
        params = match &user.payment_provider_id {
            Some(customer_id) => params.customer(customer_id.as_str()),
            None => params
                .customer_email(user.email.as_str())
                .customer_creation(CreateCheckoutSessionCustomerCreation::Always),
        };

        let session = params
            .send(&self.client)
            .await
            .map_err(|e| provider_error("create Stripe checkout session", e))?;

        tracing::info!(user_id = %abbrev_uuid(&user.id), session_id = %session.id, "Created checkout session");

        if user.payment_provider_id.is_none()
            && let Some(customer) = &session.customer
        {
            let mut conn = db_pool.acquire().await?;
            Users::new(&mut conn)
                .set_payment_provider_id(user.id, &customer.id().to_string())
                .await?;
        }

        session
            .url
            .ok_or_else(|| PaymentError::ProviderApi("Checkout session missing URL".to_string()))
    }

    async fn get_payment_session(&self, session_id: &str) -> Result<PaymentSession> {
        let invalid = || PaymentError::InvalidData("Invalid Stripe session ID".to_string());
        if !is_valid_session_id(session_id) {
            return Err(invalid());
        }
        let session_id: CheckoutSessionId = session_id.parse().map_err(|_| invalid())?;

        let session = RetrieveCheckoutSession::new(session_id)
            .send(&self.client)
            .await
            .map_err(|e| provider_error("retrieve Stripe checkout session", e))?;

        let user_id = session
            .client_reference_id
            .as_deref()
            .ok_or_else(|| PaymentError::InvalidData("Missing client_reference_id".to_string()))?
            .parse()
            .map_err(|_| PaymentError::InvalidData("client_reference_id is not a user id".to_string()))?;

        let amount = session
            .amount_total
            .ok_or_else(|| PaymentError::InvalidData("Missing payment amount".to_string()))?;
        let currency = session.currency.as_ref().map(|c| c.to_string());

        Ok(PaymentSession {
            user_id,
            amount: to_major_units(amount, currency.as_deref()),
            is_paid: session.payment_status == CheckoutSessionPaymentStatus::Paid,
            payment_provider_id: session.customer.as_ref().map(|c| c.id().to_string()),
        })
    }

    async fn validate_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<Option<WebhookEvent>> {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .ok_or_else(|| PaymentError::InvalidSignature("missing stripe-signature header".to_string()))?
            .to_str()
            .map_err(|_| PaymentError::InvalidSignature("unreadable stripe-signature header".to_string()))?;

        check_signature_timestamp(signature, self.webhook_tolerance, Utc::now().timestamp())
            .inspect_err(|e| tracing::warn!("Rejected Stripe webhook: {e}"))?;

        let event = Webhook::construct_event(body, signature, &self.webhook_secret).map_err(|e| {
            tracing::warn!("Rejected Stripe webhook: {e}");
            PaymentError::InvalidSignature(e.to_string())
        })?;

        let [completed, async_succeeded] = PAID_SESSION_EVENTS;
        let webhook_event = match event.data.object {
            EventObject::CheckoutSessionCompleted(session) => WebhookEvent {
                event_type: completed.to_string(),
                session_id: Some(session.id.to_string()),
            },
            EventObject::CheckoutSessionAsyncPaymentSucceeded(session) => WebhookEvent {
                event_type: async_succeeded.to_string(),
                session_id: Some(session.id.to_string()),
            },
            _ => WebhookEvent {
                event_type: format!("{:?}", event.type_),
                session_id: None,
            },
        };

        tracing::debug!(event_type = %webhook_event.event_type, session_id = ?webhook_event.session_id, "Validated Stripe webhook");
        Ok(Some(webhook_event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::{handlers::Payments, models::payments::PaymentCreateDBRequest};
    use crate::test_utils::create_test_user;
    use axum::http::{HeaderMap, HeaderValue};

    const TOLERANCE: Duration = Duration::from_secs(300);

    fn provider() -> StripeProvider {
        crate::http::install_crypto_provider();
        StripeProvider::from(StripeConfig {
            api_key: "sk_test_fake".to_string(),
            webhook_secret: "whsec_fake".to_string(),
            price_id: "price_membership".to_string(),
            webhook_tolerance: TOLERANCE,
        })
    }

    fn signed_headers(signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(signature).unwrap());
        headers
    }

    #[test]
    fn test_stripe_provider_creation() {
        let provider = provider();

        assert_eq!(provider.price_id, "price_membership");
        assert_eq!(provider.webhook_secret, "whsec_fake");
        assert_eq!(provider.webhook_tolerance, TOLERANCE);
    }

    #[test]
    fn test_signature_timestamp_tolerance() {
        let signed_at = 1_700_000_000;
        let header = format!("t={signed_at},v1=abcd");

        assert!(check_signature_timestamp(&header, TOLERANCE, signed_at + 299).is_ok());
        assert!(check_signature_timestamp(&header, TOLERANCE, signed_at - 299).is_ok());
        assert!(check_signature_timestamp(&header, TOLERANCE, signed_at + 301).is_err());
        assert!(check_signature_timestamp("v1=abcd", TOLERANCE, signed_at).is_err());
        assert!(check_signature_timestamp("t=soon,v1=abcd", TOLERANCE, signed_at).is_err());
    }

    #[test]
    fn test_extreme_signature_timestamps_are_rejected() {
        let now = 1_760_000_000;
        for t in [i64::MIN, i64::MIN + 1, i64::MAX, -now] {
            let header = format!("t={t},v1=00");
            assert!(
                matches!(
                    check_signature_timestamp(&header, TOLERANCE, now),
                    Err(PaymentError::InvalidSignature(_))
                ),
                "timestamp {t} should be rejected"
            );
        }
        assert!(check_signature_timestamp(&format!("t={}", i64::MIN), TOLERANCE, i64::MAX).is_err());
    }

    #[test]
    fn test_amounts_respect_zero_decimal_currencies() {
        assert_eq!(to_major_units(980, Some("jpy")), Decimal::new(980, 0));
        assert_eq!(to_major_units(980, Some("JPY")), Decimal::new(980, 0));
        assert_eq!(to_major_units(1999, Some("usd")), Decimal::new(1999, 2));
        assert_eq!(to_major_units(1999, None), Decimal::new(1999, 2));
    }

    #[test]
    fn test_session_id_validation() {
        assert!(is_valid_session_id("cs_test_a1B2c3"));
        assert!(!is_valid_session_id("cs_"));
        assert!(!is_valid_session_id("cs_../../v1/customers"));
        assert!(!is_valid_session_id("pi_123"));
    }

    #[tokio::test]
    async fn test_invalid_session_id_is_refused_before_calling_stripe() {
        let result = provider().get_payment_session("cs_../../v1/customers").await;
        assert!(matches!(result, Err(PaymentError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_webhooks_without_valid_signature_are_rejected() {
        let payload = r#"{"type":"checkout.session.completed"}"#;
        let provider = provider();

        let missing = provider.validate_webhook(&HeaderMap::new(), payload).await;
        assert!(matches!(missing, Err(PaymentError::InvalidSignature(_))));

        let extreme = provider.validate_webhook(&signed_headers(&format!("t={},v1=00", i64::MIN)), payload).await;
        assert!(matches!(extreme, Err(PaymentError::InvalidSignature(_))));

        let forged = format!("t={},v1={}", Utc::now().timestamp(), "0".repeat(64));
        let forged = provider.validate_webhook(&signed_headers(&forged), payload).await;
        assert!(matches!(forged, Err(PaymentError::InvalidSignature(_))));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_fulfilled_session_skips_stripe(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let session_id = "cs_test_already_paid";

        let mut conn = pool.acquire().await.unwrap();
        Payments::new(&mut conn)
            .create(&PaymentCreateDBRequest {
                user_id: user.id,
                provider_session_id: session_id.to_string(),
                amount: Decimal::new(980, 0),
            })
            .await
            .unwrap();
        drop(conn);

        // The fake key would fail any real API call, so success means Stripe was never asked
        provider()
            .process_payment_session(&pool, session_id, Duration::from_secs(30 * 24 * 60 * 60))
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE provider_session_id = $1")
            .bind(session_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
