//! Database queries for the admin analytics dashboard.
//!
//! The five metrics are independent queries run concurrently against the pool, so each one
//! checks out its own connection. A failing metric fails the whole dashboard.

use chrono::Utc;
use moka::future::Cache;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

use crate::{
    api::models::{
        analytics::{AnalyticsDashboard, ContentCounts, LifeStageCount, RecipeCounts, UserCounts},
        recipes::LifeStage,
    },
    db::errors::Result,
};

const DASHBOARD_KEY: &str = "dashboard";

/// In-memory cache holding the last computed dashboard.
#[derive(Clone)]
pub struct DashboardCache {
    inner: Cache<&'static str, AnalyticsDashboard>,
}

impl DashboardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Serve the cached dashboard, computing it on a miss. Errors are not cached.
    pub async fn get_or_compute(&self, db: &PgPool) -> Result<AnalyticsDashboard> {
        if let Some(dashboard) = self.inner.get(DASHBOARD_KEY).await {
            tracing::debug!("Analytics dashboard served from cache");
            return Ok(dashboard);
        }

        let dashboard = get_dashboard(db).await?;
        self.inner.insert(DASHBOARD_KEY, dashboard.clone()).await;
        Ok(dashboard)
    }

    pub async fn invalidate(&self) {
        self.inner.invalidate(DASHBOARD_KEY).await;
    }
}

#[derive(FromRow)]
struct LifeStageRow {
    life_stage: LifeStage,
    count: i64,
}

#[instrument(skip(db), err)]
async fn get_recipe_counts(db: &PgPool) -> Result<RecipeCounts> {
    let counts = sqlx::query_as::<_, RecipeCounts>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status = 'published') AS published,
            COUNT(*) FILTER (WHERE status = 'draft') AS draft
        FROM recipes
        "#,
    )
    .fetch_one(db)
    .await?;

    Ok(counts)
}

/// `table` is one of our own table names, never user input.
async fn get_content_counts(db: &PgPool, table: &'static str) -> Result<ContentCounts> {
    let query = format!(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status = 'published') AS published,
            COUNT(*) FILTER (WHERE status = 'draft') AS draft,
            COUNT(*) FILTER (WHERE status = 'archived') AS archived
        FROM {table}
        "#
    );
    let counts = sqlx::query_as::<_, ContentCounts>(&query).fetch_one(db).await?;

    Ok(counts)
}

#[instrument(skip(db), err)]
async fn get_article_counts(db: &PgPool) -> Result<ContentCounts> {
    get_content_counts(db, "articles").await
}

#[instrument(skip(db), err)]
async fn get_feature_counts(db: &PgPool) -> Result<ContentCounts> {
    get_content_counts(db, "features").await
}

#[instrument(skip(db), err)]
async fn get_user_counts(db: &PgPool) -> Result<UserCounts> {
    let counts = sqlx::query_as::<_, UserCounts>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE is_active) AS active,
            COUNT(*) FILTER (WHERE role = 'admin') AS admins,
            COUNT(*) FILTER (WHERE premium_until > NOW()) AS premium
        FROM users
        "#,
    )
    .fetch_one(db)
    .await?;

    Ok(counts)
}

#[instrument(skip(db), err)]
async fn get_recipes_by_life_stage(db: &PgPool) -> Result<Vec<LifeStageCount>> {
    let rows = sqlx::query_as::<_, LifeStageRow>("SELECT life_stage, COUNT(*) AS count FROM recipes GROUP BY life_stage")
        .fetch_all(db)
        .await?;

    let counts: HashMap<LifeStage, i64> = rows.into_iter().map(|row| (row.life_stage, row.count)).collect();

    Ok(LifeStage::VARIANTS
        .into_iter()
        .map(|life_stage| LifeStageCount {
            life_stage,
            count: counts.get(&life_stage).copied().unwrap_or(0),
        })
        .collect())
}

/// Compute every dashboard metric concurrently.
#[instrument(skip(db), err)]
pub async fn get_dashboard(db: &PgPool) -> Result<AnalyticsDashboard> {
    let (recipes, articles, features, users, recipes_by_life_stage) = tokio::try_join!(
        get_recipe_counts(db),
        get_article_counts(db),
        get_feature_counts(db),
        get_user_counts(db),
        get_recipes_by_life_stage(db),
    )?;

    Ok(AnalyticsDashboard {
        recipes,
        articles,
        features,
        users,
        recipes_by_life_stage,
        generated_at: Utc::now(),
    })
}
