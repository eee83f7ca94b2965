//! Database record models matching table schemas.
//!
//! Models here are what repositories accept and return. They are kept separate from the API
//! models in [`crate::api::models`] so storage and wire formats can evolve independently; the
//! API side converts with `From` impls.
//!
//! - [`users`]: accounts and membership state
//! - [`recipes`]: recipes with JSONB ingredient and instruction lists
//! - [`articles`], [`features`], [`faqs`]: editorial content
//! - [`settings`]: key/value site settings
//! - [`payments`]: fulfilled checkout sessions

pub mod articles;
pub mod faqs;
pub mod features;
pub mod payments;
pub mod recipes;
pub mod settings;
pub mod users;
