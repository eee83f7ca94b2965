//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/authentication/*`): Login and logout
//! - **Admin** (`/admin/api/v1/*`): Recipes, articles, features, FAQs, users, settings,
//!   analytics, uploads and videos. Admin role required, apart from `/users/current`.
//! - **Public** (`/api/v1/*`): Published content, the ingredient unit table and premium checkout
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa` annotations. The document is browsable at
//! `/admin/docs` when the server is running.

pub mod handlers;
pub mod models;
