//! API request/response models for membership payments.

use crate::db::models::payments::PaymentDBResponse;
use crate::types::PaymentId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where to send the browser to pay.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub url: String,
}

/// Membership state after a session has been processed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MembershipResponse {
    pub is_premium: bool,
    pub premium_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PaymentId,
    pub provider_session_id: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentDBResponse> for PaymentResponse {
    fn from(db: PaymentDBResponse) -> Self {
        Self {
            id: db.id,
            provider_session_id: db.provider_session_id,
            amount: db.amount,
            created_at: db.created_at,
        }
    }
}
