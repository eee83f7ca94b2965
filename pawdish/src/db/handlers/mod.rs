//! Repository implementations for database access.
//!
//! Each repository borrows a SQLx connection (or a transaction, which derefs to one), so the
//! caller decides the transaction boundary. Entity tables implement the [`Repository`] trait.
//!
//! # Available Repositories
//!
//! - [`Users`]: accounts, login bookkeeping and premium membership
//! - [`Recipes`]: recipe CRUD
//! - [`Articles`]: articles, with slug lookup
//! - [`Features`]: curated features, with slug lookup
//! - [`Faqs`]: FAQs and their display order
//! - [`Settings`]: key/value site settings (upsert rather than CRUD)
//! - [`Payments`]: fulfilled membership checkouts
//! - [`analytics`]: read-only dashboard queries
//!
//! # Common Pattern
//!
//! ```ignore
//! use pawdish::db::handlers::{Recipes, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Recipes::new(&mut tx);
//!
//!     let recipes = repo.list(&RecipeListFilter::published()).await?;
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod articles;
pub mod faqs;
pub mod features;
pub mod payments;
pub mod recipes;
pub mod repository;
pub mod settings;
pub mod users;

pub use articles::Articles;
pub use faqs::Faqs;
pub use features::Features;
pub use payments::Payments;
pub use recipes::Recipes;
pub use repository::Repository;
pub use settings::Settings;
pub use users::Users;
