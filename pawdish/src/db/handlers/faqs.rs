//! Database repository for FAQs.

use crate::api::models::faqs::FaqStatus;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::faqs::{FaqCreateDBRequest, FaqDBResponse, FaqUpdateDBRequest},
};
use crate::types::{FaqId, abbrev_uuid};
use sqlx::{Connection, PgConnection};
use std::collections::{HashMap, HashSet};
use tracing::instrument;
use uuid::Uuid;

/// Transaction-scoped advisory lock key serializing writes to `faqs.display_order`.
const DISPLAY_ORDER_LOCK: i64 = 0x6661_7173; // "faqs"

/// Hold the display-order lock until the surrounding transaction ends.
async fn lock_display_order(tx: &mut PgConnection) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(DISPLAY_ORDER_LOCK)
        .execute(tx)
        .await?;
    Ok(())
}

/// FAQs are few, so lists are never paginated.
#[derive(Debug, Clone, Default)]
pub struct FaqFilter {
    pub status: Option<FaqStatus>,
}

pub struct Faqs<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Faqs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Rewrite `display_order` so that `ids[i]` gets `i`, in one transaction.
    ///
    /// `ids` must be exactly the set of existing FAQs. Returns `false` without writing anything
    /// when it is not.
    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn reorder(&mut self, ids: &[FaqId]) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        lock_display_order(&mut tx).await?;

        let existing: Vec<FaqId> = sqlx::query_scalar("SELECT id FROM faqs FOR UPDATE")
            .fetch_all(&mut *tx)
            .await?;
        let existing: HashSet<FaqId> = existing.into_iter().collect();
        let requested: HashSet<FaqId> = ids.iter().copied().collect();

        if requested.len() != ids.len() || existing != requested {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE faqs SET
                display_order = (new_order.position - 1)::INTEGER,
                updated_at = NOW()
            FROM UNNEST($1::UUID[]) WITH ORDINALITY AS new_order(id, position)
            WHERE faqs.id = new_order.id
            "#,
        )
        .bind(ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Faqs<'c> {
    type CreateRequest = FaqCreateDBRequest;
    type UpdateRequest = FaqUpdateDBRequest;
    type Response = FaqDBResponse;
    type Id = FaqId;
    type Filter = FaqFilter;

    /// Appends after the current last position. Creates and reorders take the same lock, so
    /// concurrent creates never share a position.
    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;
        lock_display_order(&mut tx).await?;

        let faq = sqlx::query_as::<_, FaqDBResponse>(
            r#"
            INSERT INTO faqs (id, question, answer, status, display_order)
            VALUES ($1, $2, $3, $4, (SELECT COALESCE(MAX(display_order) + 1, 0) FROM faqs))
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.question)
        .bind(&request.answer)
        .bind(request.status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(faq)
    }

    #[instrument(skip(self), fields(faq_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let faq = sqlx::query_as::<_, FaqDBResponse>("SELECT * FROM faqs WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(faq)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<FaqId>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let faqs = sqlx::query_as::<_, FaqDBResponse>("SELECT * FROM faqs WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(faqs.into_iter().map(|f| (f.id, f)).collect())
    }

    #[instrument(skip(self, filter), fields(status = ?filter.status), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let faqs = sqlx::query_as::<_, FaqDBResponse>(
            r#"
            SELECT * FROM faqs
            WHERE ($1::faq_status IS NULL OR status = $1)
            ORDER BY display_order, created_at
            "#,
        )
        .bind(filter.status)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(faqs)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM faqs WHERE ($1::faq_status IS NULL OR status = $1)")
            .bind(filter.status)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(faq_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(faq_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let faq = sqlx::query_as::<_, FaqDBResponse>(
            r#"
            UPDATE faqs SET
                question = COALESCE($2, question),
                answer = COALESCE($3, answer),
                status = COALESCE($4, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.question)
        .bind(&request.answer)
        .bind(request.status)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(faq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn faq(question: &str) -> FaqCreateDBRequest {
        FaqCreateDBRequest {
            question: question.to_string(),
            answer: "Yes".to_string(),
            status: FaqStatus::Published,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_appends_to_display_order(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Faqs::new(&mut conn);

        let first = repo.create(&faq("first")).await.unwrap();
        let second = repo.create(&faq("second")).await.unwrap();
        assert_eq!(first.display_order, 0);
        assert_eq!(second.display_order, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_creates_get_distinct_positions(pool: PgPool) {
        let creates = (0..8).map(|i| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let mut conn = pool.acquire().await.unwrap();
                Faqs::new(&mut conn).create(&faq(&format!("question {i}"))).await.unwrap()
            })
        });

        let mut positions = Vec::new();
        for handle in creates.collect::<Vec<_>>() {
            positions.push(handle.await.unwrap().display_order);
        }
        positions.sort_unstable();
        assert_eq!(positions, (0..8).collect::<Vec<_>>());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reorder_sets_index_positions(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Faqs::new(&mut conn);
        let a = repo.create(&faq("a")).await.unwrap();
        let b = repo.create(&faq("b")).await.unwrap();
        let c = repo.create(&faq("c")).await.unwrap();

        assert!(repo.reorder(&[c.id, a.id, b.id]).await.unwrap());

        let listed = repo.list(&FaqFilter::default()).await.unwrap();
        let order: Vec<_> = listed.iter().map(|f| (f.id, f.display_order)).collect();
        assert_eq!(order, vec![(c.id, 0), (a.id, 1), (b.id, 2)]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reorder_rejects_partial_or_unknown_sets(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Faqs::new(&mut conn);
        let a = repo.create(&faq("a")).await.unwrap();
        let b = repo.create(&faq("b")).await.unwrap();

        assert!(!repo.reorder(&[b.id]).await.unwrap());
        assert!(!repo.reorder(&[b.id, a.id, Uuid::new_v4()]).await.unwrap());
        assert!(!repo.reorder(&[b.id, b.id]).await.unwrap());

        // Nothing was written
        let listed = repo.list(&FaqFilter::default()).await.unwrap();
        assert_eq!(listed[0].id, a.id);
        assert_eq!(listed[0].display_order, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_status(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Faqs::new(&mut conn);
        repo.create(&faq("public")).await.unwrap();
        repo.create(&FaqCreateDBRequest {
            status: FaqStatus::Draft,
            ..faq("hidden")
        })
        .await
        .unwrap();

        let published = FaqFilter {
            status: Some(FaqStatus::Published),
        };
        assert_eq!(repo.list(&published).await.unwrap().len(), 1);
        assert_eq!(repo.count(&FaqFilter::default()).await.unwrap(), 2);
    }
}
