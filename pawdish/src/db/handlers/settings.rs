//! Database repository for site settings.
//!
//! Settings are a key/value store rather than an entity table, so this repository has upsert
//! semantics instead of implementing [`super::Repository`].

use crate::db::{
    errors::Result,
    models::settings::{SettingDBResponse, SettingUpsertDBRequest},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Settings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Settings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<SettingDBResponse>> {
        let settings = sqlx::query_as::<_, SettingDBResponse>("SELECT * FROM settings ORDER BY key")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(settings)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self, key: &str) -> Result<Option<SettingDBResponse>> {
        let setting = sqlx::query_as::<_, SettingDBResponse>("SELECT * FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(setting)
    }

    /// Insert or replace the value for a key. An omitted description keeps the stored one.
    #[instrument(skip(self, request), fields(key = %request.key), err)]
    pub async fn upsert(&mut self, request: &SettingUpsertDBRequest) -> Result<SettingDBResponse> {
        let setting = sqlx::query_as::<_, SettingDBResponse>(
            r#"
            INSERT INTO settings (key, value, description, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                description = COALESCE(EXCLUDED.description, settings.description),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(&request.key)
        .bind(&request.value)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(setting)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE key = $1")
            .bind(key)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
