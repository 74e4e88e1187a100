//! Inventory API Handlers
//!
//! Manual stock adjustments, the append-only ledger and the low-stock
//! report. Everything here requires `inventory:manage`.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::auth::{CurrentUser, Operation, authorize};
use crate::core::ServerState;
use crate::db::repository::{RepoError, inventory};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult};
use shared::models::{Book, InventoryLog, StockAdjust};

/// Query params for the ledger listing
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub book_id: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default)]
    pub offset: i32,
}

/// Query params for the low-stock report
#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    #[serde(default = "default_threshold")]
    pub threshold: i64,
}

fn default_limit() -> i32 {
    50
}

fn default_threshold() -> i64 {
    5
}

/// POST /api/inventory/adjust - manual restock / correction
///
/// A delta that would drive stock negative is rejected and leaves the
/// ledger untouched.
pub async fn adjust(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<StockAdjust>,
) -> AppResult<Json<InventoryLog>> {
    authorize(&current_user, Operation::AdjustStock)?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let entry = inventory::apply_manual_adjustment(
        &state.pool,
        payload.book_id,
        payload.quantity_change,
        current_user.id,
        payload.notes,
    )
    .await
    .map_err(|e| match e {
        // For a manual adjustment the guard failure means the delta would
        // take the count below zero
        RepoError::InsufficientStock(book_id) => AppError::negative_stock(book_id),
        other => other.into(),
    })?;

    crate::audit_log!(
        current_user.id,
        "adjust_stock",
        format!("book:{}", entry.book_id),
        format!("{:+} -> {}", entry.quantity_change, entry.quantity_after)
    );

    Ok(Json(entry))
}

/// GET /api/inventory/logs?book_id= - ledger entries, newest first
pub async fn list_logs(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<Vec<InventoryLog>>> {
    authorize(&current_user, Operation::AdjustStock)?;

    let logs = match query.book_id {
        Some(book_id) => {
            inventory::find_logs_by_book(&state.pool, book_id, query.limit, query.offset).await?
        }
        None => inventory::find_all_logs(&state.pool, query.limit, query.offset).await?,
    };
    Ok(Json(logs))
}

/// GET /api/inventory/low-stock?threshold= - operational alert query
pub async fn low_stock(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<Book>>> {
    authorize(&current_user, Operation::AdjustStock)?;
    let books = inventory::find_low_stock(&state.pool, query.threshold).await?;
    Ok(Json(books))
}
