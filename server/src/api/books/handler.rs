//! Book API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::{CurrentUser, Operation, authorize};
use crate::core::ServerState;
use crate::db::repository::{RepoError, book, category};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_non_negative, validate_optional_text,
    validate_positive_cents, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{Book, BookCreate, BookUpdate};

/// Query params for book search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/books - list the catalog
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Book>>> {
    let books = book::find_all(&state.pool).await?;
    Ok(Json(books))
}

/// GET /api/books/by-category/{category_id}
pub async fn list_by_category(
    State(state): State<ServerState>,
    Path(category_id): Path<i64>,
) -> AppResult<Json<Vec<Book>>> {
    let books = book::find_by_category(&state.pool, category_id).await?;
    Ok(Json(books))
}

/// GET /api/books/search?q= - title/author/ISBN substring search
pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    validate_required_text(&query.q, "q", MAX_NAME_LEN)?;
    let books = book::search(&state.pool, &query.q).await?;
    Ok(Json(books))
}

/// GET /api/books/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Book>> {
    let found = book::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookNotFound))?;
    Ok(Json(found))
}

/// POST /api/books
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<BookCreate>,
) -> AppResult<Json<Book>> {
    authorize(&current_user, Operation::ManageCatalog)?;

    validate_required_text(&payload.isbn, "isbn", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
    validate_required_text(&payload.author, "author", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_positive_cents(payload.price_cents, "price_cents")?;
    validate_non_negative(payload.initial_stock, "initial_stock")?;

    if category::find_by_id(&state.pool, payload.category_id)
        .await?
        .is_none()
    {
        return Err(AppError::new(ErrorCode::CategoryNotFound));
    }

    let created = book::create(&state.pool, payload, current_user.id)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::new(ErrorCode::BookIsbnExists),
            other => other.into(),
        })?;
    Ok(Json(created))
}

/// PUT /api/books/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<BookUpdate>,
) -> AppResult<Json<Book>> {
    authorize(&current_user, Operation::ManageCatalog)?;

    if let Some(isbn) = &payload.isbn {
        validate_required_text(isbn, "isbn", MAX_SHORT_TEXT_LEN)?;
    }
    if let Some(title) = &payload.title {
        validate_required_text(title, "title", MAX_NAME_LEN)?;
    }
    if let Some(author) = &payload.author {
        validate_required_text(author, "author", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    if let Some(price) = payload.price_cents {
        validate_positive_cents(price, "price_cents")?;
    }
    if let Some(category_id) = payload.category_id
        && category::find_by_id(&state.pool, category_id)
            .await?
            .is_none()
    {
        return Err(AppError::new(ErrorCode::CategoryNotFound));
    }

    let updated = book::update(&state.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => AppError::new(ErrorCode::BookNotFound),
            RepoError::Duplicate(_) => AppError::new(ErrorCode::BookIsbnExists),
            other => other.into(),
        })?;
    Ok(Json(updated))
}

/// DELETE /api/books/{id} - mark discontinued
///
/// Books are never hard-deleted: order history keeps pointing at them.
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    authorize(&current_user, Operation::ManageCatalog)?;

    let discontinued = book::discontinue(&state.pool, id).await?;
    if !discontinued {
        return Err(AppError::new(ErrorCode::BookNotFound));
    }

    crate::audit_log!(current_user.id, "book_discontinue", format!("book:{id}"));
    Ok(Json(true))
}
