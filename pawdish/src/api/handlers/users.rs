//! HTTP handlers for user administration.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        pagination::PaginatedResponse,
        users::{CurrentUser, ListUsersQuery, UserCreate, UserResponse, UserUpdate},
    },
    auth::{
        password::{self, Argon2Params},
        permissions::{RequiresPermission, operation, resource},
    },
    db::{
        handlers::{Repository, Users, users::UserFilter},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::UserId,
};

fn not_found(id: UserId) -> Error {
    Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    }
}

/// Hashes on the blocking pool. `None` leaves the stored password untouched.
async fn hash_password(state: &AppState, password: Option<String>) -> Result<Option<String>> {
    let Some(password) = password else {
        return Ok(None);
    };
    let params = Argon2Params::from(&state.config.auth.password);
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password, params))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;
    Ok(Some(hash))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of users, newest first", body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
    _: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<UserResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = UserFilter {
        role: query.role,
        search: query.search,
        ..UserFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let users = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        users.into_iter().map(UserResponse::from).collect(),
        total_count,
        skip,
        limit,
    )))
}

/// The logged-in user's own account. Open to every role.
#[utoipa::path(
    get,
    path = "/users/current",
    tag = "users",
    summary = "Get current user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_user(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Users, operation::ReadOwn>,
) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| not_found(current_user.id))?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    _: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(id))?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::CreateAll>,
    Json(create): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let limits = &state.config.auth.password;
    let email = create.validate(limits.min_length, limits.max_length)?;

    let request = UserCreateDBRequest {
        email,
        display_name: create.display_name.map(|name| name.trim().to_string()),
        role: create.role,
        password_hash: hash_password(&state, create.password).await?,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).create(&request).await?;

    tracing::info!(user_id = %user.id, role = ?user.role, "Created user");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    params(("id" = String, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid update, or an admin deactivating themselves"),
        (status = 404, description = "User not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    current_user: RequiresPermission<resource::Users, operation::UpdateAll>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    let limits = &state.config.auth.password;
    update.validate(limits.min_length, limits.max_length)?;
    guard_self(&current_user, id, &update)?;

    let request = UserUpdateDBRequest {
        display_name: update.display_name.map(|name| name.trim().to_string()),
        role: update.role,
        is_active: update.is_active,
        password_hash: hash_password(&state, update.password).await?,
        premium_until: update.premium_until,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).update(id, &request).await?;

    Ok(Json(UserResponse::from(user)))
}

/// An admin may not lock themselves out.
fn guard_self(current_user: &CurrentUser, target: UserId, update: &UserUpdate) -> Result<()> {
    if current_user.id != target {
        return Ok(());
    }
    if update.is_active == Some(false) {
        return Err(Error::BadRequest {
            message: "You cannot deactivate your own account".to_string(),
        });
    }
    if update.role.is_some_and(|role| role != current_user.role) {
        return Err(Error::BadRequest {
            message: "You cannot change your own role".to_string(),
        });
    }
    Ok(())
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete user",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Admins cannot delete themselves"),
        (status = 404, description = "User not found")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    current_user: RequiresPermission<resource::Users, operation::DeleteAll>,
) -> Result<StatusCode> {
    if current_user.id == id {
        return Err(Error::BadRequest {
            message: "You cannot delete your own account".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Users::new(&mut conn).delete(id).await? {
        tracing::info!(user_id = %id, "Deleted user");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
