//! # pawdish: backend for a dog-nutrition recipe site
//!
//! `pawdish` serves the content behind a home-cooking site for dogs: recipes tagged by life
//! stage, protein, meal scene, difficulty and health condition, long-form articles, curated
//! features and FAQs. Editors manage everything through an admin API; visitors read published
//! content through a public API, and premium members unlock full recipe instructions through a
//! one-off checkout.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for persistence. Every request is independent; the only in-process state shared
//! between requests is the analytics cache.
//!
//! ### Request Flow
//!
//! #### Admin API (`/admin/api/v1/*`)
//!
//! Requests authenticate with a bearer JWT or the session cookie issued by
//! `/authentication/login`. Handlers declare the permission they need with
//! [`auth::permissions::RequiresPermission`]; only admins hold content permissions. Handlers
//! validate input first and then talk to PostgreSQL through the repositories in [`db::handlers`].
//!
//! #### Public API (`/api/v1/*`)
//!
//! Published recipes, articles, features and FAQs, the ingredient unit table, and premium
//! checkout. Recipe search fetches every published recipe and narrows it in memory with the
//! composable filters in [`search`].
//!
//! ### Core Components
//!
//! - [`api`]: handlers and wire models
//! - [`auth`]: password hashing, JWT sessions and role checks
//! - [`db`]: repositories and database models
//! - [`storage`]: media uploads to a local directory or an S3-compatible bucket
//! - [`video`]: client for the video streaming API
//! - `payment_providers`: Stripe and a dummy provider for development
//! - [`ingredient_units`]: the static unit-to-grams table
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use pawdish::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = pawdish::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     pawdish::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup. To run them yourself:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! pawdish::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod http;
pub mod ingredient_units;
mod openapi;
mod payment_providers;
pub mod search;
pub mod storage;
pub mod telemetry;
mod types;
mod validation;
pub mod video;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::password::{self, Argon2Params},
    config::{CorsOrigin, StorageBackendConfig},
    db::{
        handlers::{Repository, Users, analytics::DashboardCache},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::Error,
    openapi::ApiDoc,
    payment_providers::PaymentProvider,
    storage::ObjectStorage,
    video::VideoClient,
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, patch, post, put},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{ArticleId, FaqId, FeatureId, PaymentId, RecipeId, UserId};

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file and environment
/// - `storage`: Where uploaded media is written
/// - `video`: Video streaming API client, when configured
/// - `payment`: Payment provider for premium checkout, when configured
/// - `analytics`: Short-lived cache of the admin dashboard
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .storage(storage)
///     .analytics(DashboardCache::new(ttl))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub storage: Arc<dyn ObjectStorage>,
    pub video: Option<Arc<VideoClient>>,
    pub payment: Option<Arc<dyn PaymentProvider>>,
    pub analytics: DashboardCache,
}

/// Get the pawdish database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user, or bring an existing account with that email back to an
/// active admin.
///
/// When `password` is given it replaces any existing password, so rotating the configured admin
/// password takes effect on the next start. Returns the admin's user ID.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    email: &str,
    password: Option<&str>,
    params: Argon2Params,
    db: &PgPool,
) -> Result<UserId, Error> {
    let password_hash = match password {
        Some(pwd) => {
            let pwd = pwd.to_string();
            let hash = tokio::task::spawn_blocking(move || password::hash_password(&pwd, params))
                .await
                .map_err(|e| Error::Internal {
                    operation: format!("spawn admin password hashing task: {e}"),
                })??;
            Some(hash)
        }
        None => None,
    };

    let mut tx = db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);

    let user_id = if let Some(existing_user) = user_repo.get_user_by_email(email).await? {
        user_repo
            .update(
                existing_user.id,
                &UserUpdateDBRequest {
                    role: Some(Role::Admin),
                    is_active: Some(true),
                    password_hash,
                    ..Default::default()
                },
            )
            .await?;
        existing_user.id
    } else {
        let created_user = user_repo
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                display_name: None,
                role: Role::Admin,
                password_hash,
            })
            .await?;
        info!(user_id = %created_user.id, "Created initial admin user");
        created_user.id
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    Ok(user_id)
}

/// Connect to PostgreSQL, run migrations and make sure the configured admin exists.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool_settings = &config.database.pool;
    let mut options = PgPoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .min_connections(pool_settings.min_connections)
        .acquire_timeout(Duration::from_secs(pool_settings.acquire_timeout_secs));
    if pool_settings.idle_timeout_secs > 0 {
        options = options.idle_timeout(Duration::from_secs(pool_settings.idle_timeout_secs));
    }
    if pool_settings.max_lifetime_secs > 0 {
        options = options.max_lifetime(Duration::from_secs(pool_settings.max_lifetime_secs));
    }

    let pool = options.connect(&config.database.url).await?;
    migrator().run(&pool).await?;

    create_initial_admin_user(
        &config.admin_email,
        config.admin_password.as_deref(),
        Argon2Params::from(&config.auth.password),
        &pool,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

    Ok(pool)
}

/// Build the shared state: storage backend, optional video and payment clients, analytics cache.
pub async fn build_state(config: Config, pool: PgPool) -> anyhow::Result<AppState> {
    let storage = storage::create_storage(&config.storage).await?;
    let video = config.video.clone().map(VideoClient::new).transpose()?.map(Arc::new);
    let payment = config.payment.clone().map(payment_providers::create_provider);
    let analytics = DashboardCache::new(config.analytics.cache_ttl);

    if video.is_none() {
        info!("Video API not configured; video endpoints will return 503");
    }
    if payment.is_none() {
        info!("Payment provider not configured; checkout endpoints will return 503");
    }

    Ok(AppState::builder()
        .db(pool)
        .config(config)
        .storage(storage)
        .maybe_video(video)
        .maybe_payment(payment)
        .analytics(analytics)
        .build())
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::AUTHORIZATION, axum::http::header::CONTENT_TYPE])
        .expose_headers(vec![axum::http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// - Authentication routes (`/authentication/*`)
/// - Admin API routes (`/admin/api/v1/*`)
/// - Public API routes (`/api/v1/*`)
/// - Local media under `/media` when the local storage backend is configured
/// - OpenAPI document and Scalar UI
/// - Optional Prometheus metrics
/// - CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{
        analytics, articles, auth, faqs, features, ingredient_units, payments, recipes, settings, uploads, users, videos,
    };

    let upload_limit = usize::try_from(state.config.storage.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let auth_routes = Router::new()
        .route("/authentication/login", post(auth::login))
        .route("/authentication/logout", post(auth::logout))
        .with_state(state.clone());

    let admin_routes = Router::new()
        // Recipes
        .route("/recipes", get(recipes::list_recipes).post(recipes::create_recipe))
        .route(
            "/recipes/{id}",
            get(recipes::get_recipe).put(recipes::update_recipe).delete(recipes::delete_recipe),
        )
        // Articles
        .route("/articles", get(articles::list_articles).post(articles::create_article))
        .route("/articles/by-slug/{slug}", get(articles::get_article_by_slug))
        .route(
            "/articles/{id}",
            get(articles::get_article)
                .put(articles::update_article)
                .delete(articles::delete_article),
        )
        // Features
        .route("/features", get(features::list_features).post(features::create_feature))
        .route("/features/by-slug/{slug}", get(features::get_feature_by_slug))
        .route(
            "/features/{id}",
            get(features::get_feature)
                .put(features::update_feature)
                .delete(features::delete_feature),
        )
        .route("/features/{id}/recipes", get(features::get_feature_recipes))
        // FAQs
        .route("/faqs", get(faqs::list_faqs).post(faqs::create_faq))
        .route("/faqs/order", put(faqs::reorder_faqs))
        .route("/faqs/{id}", get(faqs::get_faq).put(faqs::update_faq).delete(faqs::delete_faq))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/current", get(users::get_current_user))
        .route("/users/{id}", get(users::get_user).put(users::update_user).delete(users::delete_user))
        // Settings
        .route("/settings", get(settings::list_settings))
        .route(
            "/settings/{key}",
            get(settings::get_setting)
                .put(settings::upsert_setting)
                .delete(settings::delete_setting),
        )
        // Analytics
        .route("/analytics", get(analytics::get_dashboard))
        // Media
        .route(
            "/uploads",
            post(uploads::upload_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/uploads/{*key}", delete(uploads::delete_media))
        .route("/videos/direct-upload", post(videos::create_direct_upload))
        .route("/videos/copy", post(videos::copy_video))
        .route("/videos/{uid}", get(videos::get_video).delete(videos::delete_video))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/recipes", get(recipes::search_published_recipes))
        .route("/recipes/{id}", get(recipes::get_published_recipe))
        .route("/articles", get(articles::list_published_articles))
        .route("/articles/{slug}", get(articles::get_published_article))
        .route("/features", get(features::list_published_features))
        .route("/features/{slug}", get(features::get_published_feature))
        .route("/faqs", get(faqs::list_published_faqs))
        .route("/ingredient-units", get(ingredient_units::list_ingredient_units))
        .route("/ingredient-units/convert", get(ingredient_units::convert))
        // Premium membership
        .route("/payments", get(payments::list_my_payments))
        .route("/payments/checkout", post(payments::create_checkout))
        .route("/payments/webhook", post(payments::webhook))
        .route("/payments/{session_id}", patch(payments::process_payment))
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .nest("/admin/api/v1", admin_routes)
        .nest("/api/v1", public_routes)
        .merge(Scalar::with_url("/admin/docs", ApiDoc::openapi()));

    // Local uploads are served back from disk; S3 objects are served by the bucket itself
    if let StorageBackendConfig::Local { path, .. } = &state.config.storage.backend {
        router = router.nest_service("/media", ServeDir::new(path));
    }

    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns the router and database pool.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations, ensures the
///    admin user exists and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown future resolves, in-flight requests finish, then the pool
///    and telemetry are closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting pawdish with configuration: {:#?}", config);
        let pool = setup_database(&config).await?;
        Self::new_with_pool(config, pool).await
    }

    /// Create an application on an existing, already migrated pool
    pub async fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let state = build_state(config.clone(), pool.clone()).await?;
        let router = build_router(&state)?;
        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "pawdish listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{Application, build_router, create_initial_admin_user};
    use crate::{
        api::models::users::Role,
        auth::password::{self, Argon2Params},
        db::handlers::Users,
        test_utils::*,
    };
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_create_initial_admin_user_new_user(pool: PgPool) {
        let test_email = "new-admin@example.com";

        let user_id = create_initial_admin_user(test_email, Some("hunter2hunter2"), Argon2Params::fast(), &pool)
            .await
            .expect("Should create admin user successfully");

        let mut conn = pool.acquire().await.unwrap();
        let created_user = Users::new(&mut conn)
            .get_user_by_email(test_email)
            .await
            .expect("Should be able to query user")
            .expect("User should exist");

        assert_eq!(created_user.id, user_id);
        assert_eq!(created_user.role, Role::Admin);
        assert!(created_user.is_active);
        let hash = created_user.password_hash.expect("password set");
        assert!(password::verify_password("hunter2hunter2", &hash).unwrap());
    }

    #[sqlx::test]
    async fn test_create_initial_admin_user_existing_user(pool: PgPool) {
        let existing_user = create_test_user(&pool, Role::User).await;

        let returned_user_id = create_initial_admin_user(&existing_user.email, None, Argon2Params::fast(), &pool)
            .await
            .expect("Should handle existing user successfully");
        assert_eq!(returned_user_id, existing_user.id);

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn)
            .get_user_by_email(&existing_user.email)
            .await
            .unwrap()
            .expect("User should still exist");
        assert_eq!(user.role, Role::Admin);
        assert!(user.password_hash.is_none(), "no password configured, none set");
    }

    #[sqlx::test]
    async fn test_application_integration(pool: PgPool) {
        let mut config = create_test_config();
        config.enable_metrics = false;

        let app = Application::new_with_pool(config, pool).await;
        assert!(app.is_ok(), "Application::new_with_pool should succeed");
        let server = app.unwrap().into_test_server();

        let health_response = server.get("/healthz").await;
        assert_eq!(health_response.status_code().as_u16(), 200);
        assert_eq!(health_response.text(), "OK");

        let openapi_response = server.get("/api-docs/openapi.json").await;
        assert_eq!(openapi_response.status_code().as_u16(), 200);
        assert!(openapi_response.json::<serde_json::Value>()["paths"]["/admin/api/v1/recipes"].is_object());

        // Admin routes require auth
        let api_response = server.get("/admin/api/v1/users").await;
        assert_eq!(api_response.status_code().as_u16(), 401);

        // Public routes do not
        let public_response = server.get("/api/v1/faqs").await;
        assert_eq!(public_response.status_code().as_u16(), 200);
    }

    #[sqlx::test]
    async fn test_local_media_served_back(pool: PgPool) {
        let config = create_test_config();
        let state = create_test_state_with_config(pool, config);
        state
            .storage
            .put("uploads/2026/01/hello.txt", bytes::Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();

        let server = axum_test::TestServer::new(build_router(&state).unwrap()).unwrap();
        let response = server.get("/media/uploads/2026/01/hello.txt").await;
        assert_eq!(response.status_code().as_u16(), 200);
        assert_eq!(response.text(), "hello");
    }

    #[sqlx::test]
    async fn test_build_router_with_metrics_disabled(pool: PgPool) {
        let mut config = create_test_config();
        config.enable_metrics = false;
        let state = create_test_state_with_config(pool, config);

        let server = axum_test::TestServer::new(build_router(&state).unwrap()).unwrap();
        let metrics_response = server.get("/internal/metrics").await;
        assert_eq!(metrics_response.status_code().as_u16(), 404);
    }

    #[sqlx::test]
    async fn test_build_router_with_metrics_enabled(pool: PgPool) {
        let mut config = create_test_config();
        config.enable_metrics = true;
        let state = create_test_state_with_config(pool, config);

        let server = axum_test::TestServer::new(build_router(&state).unwrap()).unwrap();
        server.get("/healthz").await;

        let metrics_response = server.get("/internal/metrics").await;
        assert_eq!(metrics_response.status_code().as_u16(), 200);
        let metrics_content = metrics_response.text();
        assert!(metrics_content.contains("# HELP") || metrics_content.contains("# TYPE"));
    }
}
