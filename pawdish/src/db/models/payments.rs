//! Database models for membership payments.

use crate::types::{PaymentId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct PaymentCreateDBRequest {
    pub user_id: UserId,
    pub provider_session_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentDBResponse {
    pub id: PaymentId,
    pub user_id: UserId,
    pub provider_session_id: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}
