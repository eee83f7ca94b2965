//! PostgreSQL persistence.
//!
//! [`handlers`] holds one repository per table and [`models`] the row and request types they
//! exchange. API handlers never write SQL themselves: they acquire a connection from the pool,
//! wrap it in a repository and convert the returned rows into wire models.
//!
//! Recipe, feature and article bodies that are edited as a whole (ingredient lines, instruction
//! steps, feature sections) are stored as JSONB; everything that is filtered or counted has its
//! own column, and the closed vocabularies (life stage, protein, status, ...) are Postgres enums.
//!
//! Payment fulfilment and the startup admin bootstrap span several statements and run in a
//! transaction. A transaction derefs to a connection, so the same repositories work inside one:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! Users::new(&mut tx).extend_premium(user_id, period).await?;
//! Payments::new(&mut tx).create(&payment).await?;
//! tx.commit().await?;
//! ```
//!
//! The schema lives in `migrations/` and is embedded by [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
