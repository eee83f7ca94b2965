//! Test utilities for integration testing.

use crate::api::models::recipes::{Difficulty, HealthCondition, LifeStage, MealScene, ProteinType, RecipeStatus};
use crate::auth::session;
use crate::config::{Config, PasswordConfig, SessionConfig, StorageBackendConfig, StorageConfig};
use crate::db::handlers::analytics::DashboardCache;
use crate::db::handlers::repository::Repository;
use crate::db::models::recipes::{IngredientLine, InstructionStep, RecipeCreateDBRequest};
use crate::storage::local::LocalStorage;
use crate::video::VideoClient;
use crate::{
    AppState,
    api::models::users::{CurrentUser, Role, UserResponse},
    db::{handlers::Users, models::users::UserCreateDBRequest},
};
use axum_test::TestServer;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub async fn create_test_app(pool: PgPool) -> (TestServer, Config) {
    let config = create_test_config();
    let (server, state) = create_test_app_with_config(pool, config).await;
    (server, state.config)
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> (TestServer, AppState) {
    let state = create_test_state_with_config(pool, config);
    let router = crate::build_router(&state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, state)
}

pub fn create_test_config() -> Config {
    // Each config gets its own media directory so tests can't see each other's uploads
    let media_dir = std::env::temp_dir().join(format!("pawdish-test-media-{}", Uuid::new_v4().simple()));

    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: crate::config::AuthConfig {
            session: SessionConfig {
                cookie_secure: false,
                ..Default::default()
            },
            password: PasswordConfig {
                // Minimal Argon2 cost keeps hashing out of the test runtime
                argon2_memory_kib: 1024,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..Default::default()
            },
            security: Default::default(),
        },
        storage: StorageConfig {
            backend: StorageBackendConfig::Local {
                path: media_dir,
                public_base_url: "http://localhost:3001/media".to_string(),
            },
            ..Default::default()
        },
        enable_metrics: false,
        enable_otel_export: false,
        ..Default::default()
    }
}

/// State on the default test config, without video or payment providers.
pub fn create_test_state(pool: PgPool) -> AppState {
    create_test_state_with_config(pool, create_test_config())
}

/// Providers are built from the config: set `config.video` or `config.payment` to enable them.
pub fn create_test_state_with_config(pool: PgPool, config: Config) -> AppState {
    let storage = match &config.storage.backend {
        StorageBackendConfig::Local { path, public_base_url } => Arc::new(LocalStorage::new(path, public_base_url)),
        StorageBackendConfig::S3 { .. } => panic!("test state only supports local storage"),
    };
    let video = config
        .video
        .clone()
        .map(|video| Arc::new(VideoClient::new(video).expect("Failed to create video client")));
    let payment = config.payment.clone().map(crate::payment_providers::create_provider);
    let analytics = DashboardCache::new(config.analytics.cache_ttl);

    AppState::builder()
        .db(pool)
        .config(config)
        .storage(storage)
        .maybe_video(video)
        .maybe_payment(payment)
        .analytics(analytics)
        .build()
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> UserResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);

    let suffix = Uuid::new_v4().simple().to_string();
    let user_create = UserCreateDBRequest {
        email: format!("testuser_{}@example.com", &suffix[..12]),
        display_name: Some("Test User".to_string()),
        role,
        password_hash: None,
    };

    let user = users_repo.create(&user_create).await.expect("Failed to create test user");
    UserResponse::from(user)
}

pub fn current_user_for(user: &UserResponse) -> CurrentUser {
    CurrentUser {
        id: user.id,
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        role: user.role,
        premium_until: user.premium_until,
        payment_provider_id: None,
    }
}

pub fn session_token_for(user: &UserResponse, config: &Config) -> String {
    session::create_session_token(&current_user_for(user), config).expect("Failed to create session token")
}

pub fn add_auth_headers(user: &UserResponse, config: &Config) -> Vec<(String, String)> {
    vec![("authorization".to_string(), format!("Bearer {}", session_token_for(user, config)))]
}

/// A complete, valid recipe: chicken, daily meal, easy, one ingredient and one step.
pub fn recipe_create_request(title: &str, life_stage: LifeStage, status: RecipeStatus) -> RecipeCreateDBRequest {
    RecipeCreateDBRequest {
        title: title.to_string(),
        description: "Gentle on the stomach".to_string(),
        cooking_time: 20,
        servings: 2,
        calories: Some(280),
        life_stage,
        protein_type: ProteinType::Chicken,
        meal_scene: MealScene::Daily,
        difficulty: Difficulty::Easy,
        health_conditions: vec![HealthCondition::Digestive, HealthCondition::KidneyCare],
        ingredients: vec![IngredientLine {
            name: "鶏むね肉".to_string(),
            unit: "1枚".to_string(),
            grams: 150.0,
        }],
        instructions: vec![InstructionStep {
            step: 1,
            text: "Boil the chicken".to_string(),
            media_url: None,
        }],
        thumbnail_url: None,
        video_uid: None,
        is_premium: false,
        status,
        created_by: None,
    }
}
