use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    db::{
        errors::DbError,
        handlers::{Repository, Users},
    },
    errors::{Error, Result},
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use sqlx::PgPool;
use tracing::{debug, instrument, trace};

/// Extract the token from an `Authorization: Bearer` header if present
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(token)): Bearer token found
/// - Some(Err(error)): Header present but not valid UTF-8
fn bearer_token(parts: &Parts) -> Option<Result<&str>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    auth_str.strip_prefix("Bearer ").map(|token| Ok(token.trim()))
}

/// Extract the session token from the cookie header if present
fn session_cookie<'a>(parts: &'a Parts, cookie_name: &str) -> Option<&'a str> {
    let cookie_str = parts.headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    cookie_str
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value)
}

/// Resolve a session token to the user it was issued for.
///
/// The user is reloaded from the database so role changes and deactivation apply immediately.
#[instrument(skip_all)]
async fn authenticate_token(token: &str, state: &AppState) -> Result<CurrentUser> {
    let claims = session::verify_session_token(token, &state.config)?;
    load_active_user(&state.db, claims.sub).await
}

async fn load_active_user(db: &PgPool, user_id: crate::types::UserId) -> Result<CurrentUser> {
    let mut conn = db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    match users.get_by_id(user_id).await? {
        Some(user) if user.is_active => Ok(CurrentUser::from(user)),
        Some(_) => Err(Error::Unauthenticated {
            message: Some("Account is deactivated".to_string()),
        }),
        None => Err(Error::Unauthenticated { message: None }),
    }
}

/// Try each credential the request carries, bearer header first.
/// Returns `Ok(None)` when the request carries no credentials at all.
async fn authenticate(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>> {
    let mut auth_errors = Vec::new();
    let mut any_auth_attempted = false;

    match bearer_token(parts) {
        Some(Ok(token)) => {
            any_auth_attempted = true;
            match authenticate_token(token, state).await {
                Ok(user) => {
                    debug!("Found bearer token authenticated user: {}", user.id);
                    return Ok(Some(user));
                }
                Err(e) => {
                    trace!("Bearer token authentication failed: {:?}", e);
                    auth_errors.push(("Bearer token", e));
                }
            }
        }
        Some(Err(e)) => {
            any_auth_attempted = true;
            auth_errors.push(("Authorization header", e));
        }
        None => trace!("No bearer token present"),
    }

    if let Some(token) = session_cookie(parts, &state.config.auth.session.cookie_name) {
        any_auth_attempted = true;
        match authenticate_token(token, state).await {
            Ok(user) => {
                debug!("Found session cookie authenticated user: {}", user.id);
                return Ok(Some(user));
            }
            Err(e) => {
                trace!("Session cookie authentication failed: {:?}", e);
                auth_errors.push(("Session cookie", e));
            }
        }
    }

    if !any_auth_attempted {
        trace!("No authentication credentials found in request");
        return Ok(None);
    }

    // Database failures are server errors, not bad credentials
    if let Some(index) = auth_errors.iter().position(|(_, e)| matches!(e, Error::Database(_))) {
        return Err(auth_errors.swap_remove(index).1);
    }

    trace!("All authentication attempts failed ({}): {:?}", auth_errors.len(), auth_errors);
    let message = auth_errors.into_iter().find_map(|(_, e)| match e {
        Error::Unauthenticated { message } => message,
        _ => None,
    });
    Err(Error::Unauthenticated { message })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        authenticate(parts, state)
            .await?
            .ok_or(Error::Unauthenticated { message: None })
    }
}

/// Public endpoints take `Option<CurrentUser>`: anonymous callers and bad credentials both
/// resolve to `None`.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        match authenticate(parts, state).await {
            Ok(user) => Ok(user),
            Err(Error::Unauthenticated { .. } | Error::BadRequest { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
