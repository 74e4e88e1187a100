//! Category API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::auth::{CurrentUser, Operation, authorize};
use crate::core::ServerState;
use crate::db::repository::{RepoError, category};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{Category, CategoryCreate, CategoryUpdate};

/// GET /api/categories - list active categories
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    let categories = category::find_all(&state.pool).await?;
    Ok(Json(categories))
}

/// GET /api/categories/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Category>> {
    let found = category::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound))?;
    Ok(Json(found))
}

/// POST /api/categories
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<Category>> {
    authorize(&current_user, Operation::ManageCatalog)?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let created = category::create(&state.pool, payload)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::new(ErrorCode::CategoryNameExists),
            other => other.into(),
        })?;
    Ok(Json(created))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    authorize(&current_user, Operation::ManageCatalog)?;
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let updated = category::update(&state.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => AppError::new(ErrorCode::CategoryNotFound),
            RepoError::Duplicate(_) => AppError::new(ErrorCode::CategoryNameExists),
            other => other.into(),
        })?;
    Ok(Json(updated))
}

/// DELETE /api/categories/{id}
///
/// Refused while the category still has live books.
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    authorize(&current_user, Operation::ManageCatalog)?;
    if category::count_books(&state.pool, id).await? > 0 {
        return Err(AppError::new(ErrorCode::CategoryHasBooks));
    }

    let deleted = category::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::new(ErrorCode::CategoryNotFound));
    }
    Ok(Json(true))
}
