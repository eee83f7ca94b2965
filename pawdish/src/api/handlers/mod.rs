//! HTTP request handlers for all API endpoints.
//!
//! Handlers are organized by resource. Each one validates its input, checks permissions through
//! the [`crate::auth::permissions::RequiresPermission`] extractor, runs its queries through the
//! repositories in [`crate::db::handlers`], and returns JSON.
//!
//! Most resources have two sets of handlers: admin handlers mounted under `/admin/api/v1` that
//! see every row, and public handlers under `/api/v1` that only see published content.
//!
//! # Handler Modules
//!
//! - [`analytics`]: Dashboard counts
//! - [`articles`]: Article CRUD and public reads by slug
//! - [`auth`]: Login and logout
//! - [`faqs`]: FAQ CRUD and reordering
//! - [`features`]: Feature CRUD and the recipes a feature curates
//! - [`ingredient_units`]: The unit-to-grams table
//! - [`payments`]: Premium checkout, webhooks and payment confirmation
//! - [`recipes`]: Recipe CRUD and the public recipe search
//! - [`settings`]: Key/value site settings
//! - [`uploads`]: Media uploads to object storage
//! - [`users`]: Account management
//! - [`videos`]: Video streaming API wrapper
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to a status code and a
//! `{"message": ...}` body.

pub mod analytics;
pub mod articles;
pub mod auth;
pub mod faqs;
pub mod features;
pub mod ingredient_units;
pub mod payments;
pub mod recipes;
pub mod settings;
pub mod uploads;
pub mod users;
pub mod videos;
