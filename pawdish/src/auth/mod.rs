//! Authentication and authorization.
//!
//! Users log in via `/authentication/login` with email and password and receive an HS256 JWT.
//! The token is returned in the response body and also set as an HTTP-only session cookie, so
//! both API clients (`Authorization: Bearer <token>`) and browsers can authenticate.
//!
//! Every authenticated request reloads the user from the database: the token only identifies the
//! user, and the stored role and active flag decide what they may do.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: Role-based permission checks and the [`permissions::RequiresPermission`] extractor
//! - [`session`]: JWT session tokens
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use pawdish::api::models::users::CurrentUser;
//!
//! async fn me(current_user: CurrentUser) -> Json<CurrentUser> {
//!     Json(current_user)
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
