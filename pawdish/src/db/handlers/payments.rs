//! Database repository for membership payments.
//!
//! One row exists per completed checkout session. The unique constraint on
//! `provider_session_id` is what makes fulfilment idempotent: the second insert for a session
//! fails with [`DbError::UniqueViolation`] on [`SESSION_UNIQUE_CONSTRAINT`].

use crate::db::{
    errors::{DbError, Result},
    models::payments::{PaymentCreateDBRequest, PaymentDBResponse},
};
use crate::types::{UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub const SESSION_UNIQUE_CONSTRAINT: &str = "payments_provider_session_id_key";

pub struct Payments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Payments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn find_by_session(&mut self, provider_session_id: &str) -> Result<Option<PaymentDBResponse>> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>("SELECT * FROM payments WHERE provider_session_id = $1")
            .bind(provider_session_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(payment)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), session = %request.provider_session_id), err)]
    pub async fn create(&mut self, request: &PaymentCreateDBRequest) -> Result<PaymentDBResponse> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>(
            r#"
            INSERT INTO payments (id, user_id, provider_session_id, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.provider_session_id)
        .bind(request.amount)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(payment)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<PaymentDBResponse>> {
        let payments =
            sqlx::query_as::<_, PaymentDBResponse>("SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(payments)
    }
}

/// True when the error is the duplicate-session violation, i.e. the session was already fulfilled.
pub fn is_duplicate_session(err: &DbError) -> bool {
    err.is_unique_violation_of(SESSION_UNIQUE_CONSTRAINT)
}
