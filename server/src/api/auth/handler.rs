//! Authentication Handlers
//!
//! Login, registration and current-user lookup.

use std::time::Duration;

use axum::{Extension, Json, extract::State};

use crate::auth::{CurrentUser, get_default_permissions, password};
use crate::core::ServerState;
use crate::db::repository::user;
use crate::security_log;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_PASSWORD_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::client::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use shared::models::{User, UserCreate};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// Minimum password length for new accounts
const MIN_PASSWORD_LEN: usize = 8;

fn user_info(user: &User) -> UserInfo {
    UserInfo {
        id: user.id,
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        role: user.role,
        permissions: get_default_permissions(user.role),
    }
}

/// POST /api/auth/login
///
/// Authenticates user credentials and returns a JWT token.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let found = user::find_by_username(&state.pool, &req.username).await?;

    // Fixed delay before inspecting the result (timing attacks)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent username enumeration
    let found = match found {
        Some(u) => u,
        None => {
            security_log!(
                WARN,
                "login_failed",
                username = req.username.clone(),
                reason = "user_not_found"
            );
            return Err(AppError::invalid_credentials());
        }
    };

    if !found.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let password_valid = password::verify_password(&req.password, &found.hash_pass)
        .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;

    if !password_valid {
        security_log!(
            WARN,
            "login_failed",
            username = req.username.clone(),
            reason = "invalid_credentials"
        );
        return Err(AppError::invalid_credentials());
    }

    let permissions = get_default_permissions(found.role);
    let token = state
        .get_jwt_service()
        .generate_token(
            found.id,
            &found.username,
            &found.display_name,
            found.role.as_str(),
            &permissions,
        )
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    security_log!(INFO, "login", username = found.username.clone());

    Ok(Json(LoginResponse {
        token,
        user: user_info(&found),
    }))
}

/// POST /api/auth/register
///
/// Creates a customer account. Staff and admin accounts are provisioned
/// out of band.
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<LoginResponse>> {
    validate_required_text(&req.username, "username", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.display_name, "display_name", MAX_NAME_LEN)?;
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort));
    }
    if req.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password is too long (max {MAX_PASSWORD_LEN})"
        )));
    }

    let created = user::create(
        &state.pool,
        UserCreate {
            username: req.username,
            password: req.password,
            display_name: req.display_name,
            role: None, // always a customer
        },
    )
    .await
    .map_err(|e| match e {
        crate::db::repository::RepoError::Duplicate(_) => {
            AppError::new(ErrorCode::UsernameExists)
        }
        other => other.into(),
    })?;

    let permissions = get_default_permissions(created.role);
    let token = state
        .get_jwt_service()
        .generate_token(
            created.id,
            &created.username,
            &created.display_name,
            created.role.as_str(),
            &permissions,
        )
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    tracing::info!(user_id = created.id, username = %created.username, "Customer registered");

    Ok(Json(LoginResponse {
        token,
        user: user_info(&created),
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<UserInfo>> {
    let found = user::find_by_id(&state.pool, current_user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(user_info(&found)))
}
