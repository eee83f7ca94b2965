//! OpenAPI documentation, served with Scalar at `/admin/docs`.
//!
//! The admin surface (`/admin/api/v1/*`) and the public surface (`/api/v1/*`) share path names
//! such as `/recipes`, so each is its own document nested under its prefix.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Bearer JWT or the session cookie set by `/authentication/login`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.security_schemes.insert(
            "BearerAuth".to_string(),
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Session token returned by `POST /authentication/login`:\n\n\
                        ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                    ))
                    .build(),
            ),
        );
        components.security_schemes.insert(
            "CookieAuth".to_string(),
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "pawdish_session",
                "Session cookie set by `POST /authentication/login`",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::recipes::list_recipes,
        api::handlers::recipes::get_recipe,
        api::handlers::recipes::create_recipe,
        api::handlers::recipes::update_recipe,
        api::handlers::recipes::delete_recipe,
        api::handlers::articles::list_articles,
        api::handlers::articles::get_article,
        api::handlers::articles::get_article_by_slug,
        api::handlers::articles::create_article,
        api::handlers::articles::update_article,
        api::handlers::articles::delete_article,
        api::handlers::features::list_features,
        api::handlers::features::get_feature,
        api::handlers::features::get_feature_by_slug,
        api::handlers::features::get_feature_recipes,
        api::handlers::features::create_feature,
        api::handlers::features::update_feature,
        api::handlers::features::delete_feature,
        api::handlers::faqs::list_faqs,
        api::handlers::faqs::get_faq,
        api::handlers::faqs::create_faq,
        api::handlers::faqs::update_faq,
        api::handlers::faqs::delete_faq,
        api::handlers::faqs::reorder_faqs,
        api::handlers::users::list_users,
        api::handlers::users::get_current_user,
        api::handlers::users::get_user,
        api::handlers::users::create_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::settings::list_settings,
        api::handlers::settings::get_setting,
        api::handlers::settings::upsert_setting,
        api::handlers::settings::delete_setting,
        api::handlers::analytics::get_dashboard,
        api::handlers::uploads::upload_media,
        api::handlers::uploads::delete_media,
        api::handlers::videos::create_direct_upload,
        api::handlers::videos::copy_video,
        api::handlers::videos::get_video,
        api::handlers::videos::delete_video,
    ),
    tags(
        (name = "recipes", description = "Recipe authoring, including drafts and premium instructions."),
        (name = "articles", description = "Long-form articles with unique slugs."),
        (name = "features", description = "Editorial features: ordered sections that curate recipes."),
        (name = "faqs", description = "Frequently asked questions and their display order."),
        (name = "users", description = "Accounts, roles and premium membership."),
        (name = "settings", description = "Free-form site settings keyed by name."),
        (name = "analytics", description = "Content and membership counts for the dashboard."),
        (name = "uploads", description = "Image and video uploads to object storage."),
        (name = "videos", description = "Video streaming API: direct uploads, imports and status."),
    )
)]
struct AdminApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::recipes::search_published_recipes,
        api::handlers::recipes::get_published_recipe,
        api::handlers::articles::list_published_articles,
        api::handlers::articles::get_published_article,
        api::handlers::features::list_published_features,
        api::handlers::features::get_published_feature,
        api::handlers::faqs::list_published_faqs,
        api::handlers::ingredient_units::list_ingredient_units,
        api::handlers::ingredient_units::convert,
        api::handlers::payments::create_checkout,
        api::handlers::payments::webhook,
        api::handlers::payments::process_payment,
        api::handlers::payments::list_my_payments,
    ),
    tags(
        (name = "public", description = "Published content, readable without an account."),
        (name = "payments", description = "Premium membership checkout and payment confirmation."),
    )
)]
struct PublicApi;

#[derive(OpenApi)]
#[openapi(
    paths(api::handlers::auth::login, api::handlers::auth::logout),
    nest(
        (path = "/admin/api/v1", api = AdminApi),
        (path = "/api/v1", api = PublicApi),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Password login and session cookies."),
    ),
    info(
        title = "pawdish API",
        version = "1.0.0",
        description = "Dog-nutrition recipe CMS.

## Authentication

Admin endpoints accept either a bearer token or the session cookie, both issued by
`POST /authentication/login`. Errors are returned as `{\"message\": \"...\"}`.",
    ),
)]
pub struct ApiDoc;
