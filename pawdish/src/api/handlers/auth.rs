use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse},
        users::{CurrentUser, UserResponse},
    },
    auth::{password, session},
    config::Config,
    db::handlers::Users,
    errors::Error,
};

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials or inactive account"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo
        .get_user_by_email(request.email.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    // Accounts created without a password can't log in
    let hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;

    // Argon2 runs on the blocking pool
    let password = request.password;
    let is_valid = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(invalid_credentials());
    }

    // Checked after the password so the response doesn't reveal which accounts exist
    if !user.is_active {
        return Err(Error::Unauthenticated {
            message: Some("Account is deactivated".to_string()),
        });
    }

    user_repo.record_login(user.id).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    let current_user = CurrentUser::from(user.clone());
    let user_response = UserResponse::from(user);
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthResponse {
            token,
            user: user_response,
        },
        cookie,
    })
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    let cookie = session_cookie(&state.config, "", 0);

    Ok(LogoutResponse {
        auth_response: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
        cookie,
    })
}

fn create_session_cookie(token: &str, config: &Config) -> String {
    session_cookie(config, token, config.auth.security.jwt_expiry.as_secs())
}

fn session_cookie(config: &Config, value: &str, max_age: u64) -> String {
    let session_config = &config.auth.session;
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}={}; Path=/; HttpOnly{}; SameSite={}; Max-Age={}",
        session_config.cookie_name, value, secure, session_config.cookie_same_site, max_age
    )
}
