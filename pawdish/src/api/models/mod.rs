//! API request and response data models.
//!
//! These structures define the public API contract. They are kept separate from the database
//! models in [`crate::db::models`] so that storage and wire formats can evolve independently.
//! Every model derives `utoipa::ToSchema` for the OpenAPI document.
//!
//! # Model Categories
//!
//! ## Content
//!
//! - [`recipes`]: Recipes, their taxonomy enums, ingredients and instructions
//! - [`articles`]: Articles with slugs and linked recipes
//! - [`features`]: Editorial features made of ordered sections
//! - [`faqs`]: FAQs and reorder requests
//! - [`settings`]: Site settings
//! - [`ingredient_units`]: Unit table rows and conversion results
//!
//! ## Accounts
//!
//! - [`users`]: User profiles, roles, and the authenticated [`users::CurrentUser`]
//! - [`auth`]: Login and logout bodies
//! - [`payments`]: Checkout sessions and payment records
//!
//! ## Media and reporting
//!
//! - [`uploads`]: Upload results
//! - [`videos`]: Video API requests
//! - [`analytics`]: Dashboard counts
//! - [`pagination`]: Shared skip/limit handling

pub mod analytics;
pub mod articles;
pub mod auth;
pub mod faqs;
pub mod features;
pub mod ingredient_units;
pub mod pagination;
pub mod payments;
pub mod recipes;
pub mod settings;
pub mod uploads;
pub mod users;
pub mod videos;
