//! Order workflow tests
//!
//! Run against a real (temp-file) SQLite database with the production
//! migrations, so the stock guards and transaction boundaries behave
//! exactly as they do in the running server.

use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::auth::CurrentUser;
use crate::db::DbService;
use crate::db::repository::{book, cart, category, inventory, order, payment};
use crate::orders::workflow;
use crate::utils::ErrorCode;
use shared::models::{
    BookCreate, BookStatus, CategoryCreate, OrderCreate, OrderStatus, PaymentMethod,
    PaymentStatus,
};

const STAFF_ID: i64 = 9001;
const ALICE_ID: i64 = 9002;
const BOB_ID: i64 = 9003;

async fn test_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let service = DbService::new(&db_path.to_string_lossy())
        .await
        .expect("Failed to open test database");
    let pool = service.pool;

    for (id, username, role) in [
        (STAFF_ID, "staff", "staff"),
        (ALICE_ID, "alice", "customer"),
        (BOB_ID, "bob", "customer"),
    ] {
        sqlx::query(
            "INSERT INTO user (id, username, display_name, hash_pass, role, is_active, created_at, updated_at) VALUES (?1, ?2, ?2, 'x', ?3, 1, 0, 0)",
        )
        .bind(id)
        .bind(username)
        .bind(role)
        .execute(&pool)
        .await
        .expect("Failed to seed user");
    }

    (dir, pool)
}

fn staff() -> CurrentUser {
    CurrentUser {
        id: STAFF_ID,
        username: "staff".into(),
        display_name: "Staff".into(),
        role: "staff".into(),
        permissions: crate::auth::permissions::DEFAULT_STAFF_PERMISSIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

fn customer(id: i64) -> CurrentUser {
    CurrentUser {
        id,
        username: format!("customer-{id}"),
        display_name: "Customer".into(),
        role: "customer".into(),
        permissions: vec![],
    }
}

/// Create a category and one book with the given price and stock
async fn seed_book(pool: &SqlitePool, price_cents: i64, stock: i64) -> i64 {
    let cat = category::create(
        pool,
        CategoryCreate {
            name: format!("cat-{}", shared::util::snowflake_id()),
            description: None,
            sort_order: None,
        },
    )
    .await
    .expect("Failed to create category");

    let created = book::create(
        pool,
        BookCreate {
            isbn: format!("978-{}", shared::util::snowflake_id()),
            title: "The Test Book".into(),
            author: "A. Author".into(),
            description: None,
            price_cents,
            initial_stock: stock,
            status: None,
            category_id: cat.id,
        },
        STAFF_ID,
    )
    .await
    .expect("Failed to create book");
    created.id
}

async fn put_in_cart(pool: &SqlitePool, user_id: i64, book_id: i64, quantity: i64) {
    cart::upsert_item(pool, user_id, book_id, quantity)
        .await
        .expect("Failed to add to cart");
}

fn checkout_payload() -> OrderCreate {
    OrderCreate {
        shipping_address: "1 Main Street".into(),
        shipping_phone: "555-0100".into(),
        note: None,
        payment_method: PaymentMethod::Card,
    }
}

async fn stock_of(pool: &SqlitePool, book_id: i64) -> i64 {
    book::find_by_id(pool, book_id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

// ========================================================================
// Checkout
// ========================================================================

#[tokio::test]
async fn test_checkout_success() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1999, 3).await;
    put_in_cart(&pool, ALICE_ID, book_id, 2).await;

    let detail = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .expect("Checkout should succeed");

    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.total_cents, 2 * 1999);
    assert_eq!(detail.order.user_id, ALICE_ID);
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 2);
    assert_eq!(detail.items[0].price_cents, 1999);

    let pay = detail.payment.expect("Payment record should exist");
    assert_eq!(pay.status, PaymentStatus::Pending);
    assert_eq!(pay.method, PaymentMethod::Card);
    assert_eq!(pay.amount_cents, 2 * 1999);

    // Stock decremented, cart emptied
    assert_eq!(stock_of(&pool, book_id).await, 1);
    assert!(cart::find_items(&pool, ALICE_ID).await.unwrap().is_empty());

    // Ledger: +3 initial, -2 order
    assert_eq!(inventory::ledger_sum(&pool, book_id).await.unwrap(), 1);
    let logs = inventory::find_logs_by_book(&pool, book_id, 10, 0).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].quantity_change, -2);
    assert_eq!(logs[0].quantity_after, 1);
}

#[tokio::test]
async fn test_checkout_insufficient_stock_is_atomic() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1000, 3).await;
    put_in_cart(&pool, ALICE_ID, book_id, 5).await;

    let err = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .expect_err("Checkout should fail");
    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert_eq!(err.details.unwrap().get("book_id").unwrap(), &book_id);

    // Nothing changed: stock, ledger, orders, cart
    assert_eq!(stock_of(&pool, book_id).await, 3);
    let logs = inventory::find_logs_by_book(&pool, book_id, 10, 0).await.unwrap();
    assert_eq!(logs.len(), 1); // only the initial stock entry
    assert!(order::find_by_user(&pool, ALICE_ID, 10, 0).await.unwrap().is_empty());
    assert_eq!(cart::find_items(&pool, ALICE_ID).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_checkout_multi_line_rolls_back_everything() {
    let (_dir, pool) = test_db().await;
    let plenty = seed_book(&pool, 500, 10).await;
    let scarce = seed_book(&pool, 800, 1).await;
    put_in_cart(&pool, ALICE_ID, plenty, 2).await;
    put_in_cart(&pool, ALICE_ID, scarce, 2).await;

    let err = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .expect_err("Checkout should fail on the scarce book");
    assert_eq!(err.code, ErrorCode::InsufficientStock);

    // The first line's decrement must have been rolled back too
    assert_eq!(stock_of(&pool, plenty).await, 10);
    assert_eq!(stock_of(&pool, scarce).await, 1);
    assert_eq!(
        inventory::find_logs_by_book(&pool, plenty, 10, 0).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let (_dir, pool) = test_db().await;

    let err = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .expect_err("Empty cart must not check out");
    assert_eq!(err.code, ErrorCode::CartEmpty);
    assert!(order::find_by_user(&pool, ALICE_ID, 10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_discontinued_book() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1200, 5).await;
    put_in_cart(&pool, ALICE_ID, book_id, 1).await;
    book::discontinue(&pool, book_id).await.unwrap();

    let err = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .expect_err("Discontinued book must not check out");
    assert_eq!(err.code, ErrorCode::BookUnavailable);
    assert_eq!(stock_of(&pool, book_id).await, 5);
}

#[tokio::test]
async fn test_order_numbers_are_date_based_and_sequential() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 700, 10).await;

    put_in_cart(&pool, ALICE_ID, book_id, 1).await;
    let first = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap();

    put_in_cart(&pool, BOB_ID, book_id, 1).await;
    let second = workflow::checkout(&pool, &customer(BOB_ID), checkout_payload())
        .await
        .unwrap();

    let date = chrono::Utc::now().format("%Y%m%d").to_string();
    assert_eq!(first.order.order_no, format!("ORD-{date}-0001"));
    assert_eq!(second.order.order_no, format!("ORD-{date}-0002"));
}

#[tokio::test]
async fn test_price_snapshot_survives_catalog_change() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1500, 5).await;
    put_in_cart(&pool, ALICE_ID, book_id, 1).await;

    let detail = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap();

    book::update(
        &pool,
        book_id,
        shared::models::BookUpdate {
            isbn: None,
            title: None,
            author: None,
            description: None,
            price_cents: Some(9999),
            status: None,
            category_id: None,
        },
    )
    .await
    .unwrap();

    let reloaded = workflow::load_detail(&pool, detail.order.id).await.unwrap();
    assert_eq!(reloaded.items[0].price_cents, 1500);
    assert_eq!(reloaded.order.total_cents, 1500);
}

// ========================================================================
// Status transitions
// ========================================================================

#[tokio::test]
async fn test_invalid_transition_rejected() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1000, 3).await;
    put_in_cart(&pool, ALICE_ID, book_id, 1).await;
    let detail = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap();

    let err = workflow::update_status(&pool, &staff(), detail.order.id, OrderStatus::Delivered)
        .await
        .expect_err("Pending -> Delivered must be rejected");
    assert_eq!(err.code, ErrorCode::OrderInvalidTransition);
    let details = err.details.unwrap();
    assert_eq!(details.get("from").unwrap(), "PENDING");
    assert_eq!(details.get("to").unwrap(), "DELIVERED");

    // Status untouched
    let reloaded = workflow::load_detail(&pool, detail.order.id).await.unwrap();
    assert_eq!(reloaded.order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_full_fulfillment_flow_sets_timestamps() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1000, 3).await;
    put_in_cart(&pool, ALICE_ID, book_id, 1).await;
    let order_id = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap()
        .order
        .id;

    let staff = staff();
    for status in [
        OrderStatus::Processing,
        OrderStatus::Packed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        workflow::update_status(&pool, &staff, order_id, status)
            .await
            .unwrap_or_else(|e| panic!("Transition to {status:?} failed: {e}"));
    }

    let detail = workflow::load_detail(&pool, order_id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Delivered);
    assert!(detail.order.shipped_at.is_some());
    assert!(detail.order.delivered_at.is_some());

    // Terminal: nothing may follow Delivered
    let err = workflow::update_status(&pool, &staff, order_id, OrderStatus::Processing)
        .await
        .expect_err("Delivered is terminal");
    assert_eq!(err.code, ErrorCode::OrderInvalidTransition);
}

#[tokio::test]
async fn test_customer_cannot_update_status() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1000, 3).await;
    put_in_cart(&pool, ALICE_ID, book_id, 1).await;
    let order_id = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap()
        .order
        .id;

    let err = workflow::update_status(&pool, &customer(ALICE_ID), order_id, OrderStatus::Processing)
        .await
        .expect_err("Customers must not drive fulfillment");
    assert_eq!(err.code, ErrorCode::PermissionDenied);
}

// ========================================================================
// Cancellation
// ========================================================================

#[tokio::test]
async fn test_cancel_restores_stock_and_ledger() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 2500, 4).await;
    put_in_cart(&pool, ALICE_ID, book_id, 3).await;
    let order_id = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap()
        .order
        .id;
    assert_eq!(stock_of(&pool, book_id).await, 1);

    let detail = workflow::cancel_by_customer(&pool, &customer(ALICE_ID), order_id)
        .await
        .expect("Cancellation should succeed");

    assert_eq!(detail.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&pool, book_id).await, 4);

    // Ledger gained a matching positive entry; old entries untouched
    let logs = inventory::find_logs_by_book(&pool, book_id, 10, 0).await.unwrap();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0].quantity_change, 3);
    assert_eq!(logs[0].quantity_after, 4);
    assert_eq!(inventory::ledger_sum(&pool, book_id).await.unwrap(), 4);

    // Pending payment settles as failed
    let pay = detail.payment.unwrap();
    assert_eq!(pay.status, PaymentStatus::Failed);
    assert_eq!(pay.failure_reason.as_deref(), Some("Order cancelled"));
}

#[tokio::test]
async fn test_cancel_refunds_completed_payment() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 2000, 2).await;
    put_in_cart(&pool, ALICE_ID, book_id, 1).await;
    let detail = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap();
    let order_id = detail.order.id;
    let payment_id = detail.payment.unwrap().id;

    // Payment completes, fulfillment starts
    payment::transition_status_pool(
        &pool,
        payment_id,
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        Some("txn-123"),
        None,
    )
    .await
    .unwrap();
    workflow::update_status(&pool, &staff(), order_id, OrderStatus::Processing)
        .await
        .unwrap();

    // Staff cancels while still Processing
    let cancelled = workflow::update_status(&pool, &staff(), order_id, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment.unwrap().status, PaymentStatus::Refunded);
    assert_eq!(stock_of(&pool, book_id).await, 2);
}

#[tokio::test]
async fn test_cancel_rejected_after_packed() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1000, 2).await;
    put_in_cart(&pool, ALICE_ID, book_id, 1).await;
    let order_id = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap()
        .order
        .id;

    let staff = staff();
    workflow::update_status(&pool, &staff, order_id, OrderStatus::Processing)
        .await
        .unwrap();
    workflow::update_status(&pool, &staff, order_id, OrderStatus::Packed)
        .await
        .unwrap();

    let err = workflow::cancel_by_customer(&pool, &customer(ALICE_ID), order_id)
        .await
        .expect_err("Packed orders are past the cancellation window");
    assert_eq!(err.code, ErrorCode::OrderNotCancellable);

    // Staff cannot force it through the transition table either
    let err = workflow::update_status(&pool, &staff, order_id, OrderStatus::Cancelled)
        .await
        .expect_err("Packed -> Cancelled is not in the table");
    assert_eq!(err.code, ErrorCode::OrderInvalidTransition);
    assert_eq!(stock_of(&pool, book_id).await, 1);
}

#[tokio::test]
async fn test_cancel_foreign_order_forbidden() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1000, 2).await;
    put_in_cart(&pool, ALICE_ID, book_id, 1).await;
    let order_id = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap()
        .order
        .id;

    let err = workflow::cancel_by_customer(&pool, &customer(BOB_ID), order_id)
        .await
        .expect_err("Bob must not cancel Alice's order");
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let reloaded = workflow::load_detail(&pool, order_id).await.unwrap();
    assert_eq!(reloaded.order.status, OrderStatus::Pending);
}

// ========================================================================
// Stock consistency
// ========================================================================

#[tokio::test]
async fn test_ledger_reconstructs_stock_after_mixed_operations() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1000, 10).await;

    // Order 3, cancel it, order 2 more, restock 5
    put_in_cart(&pool, ALICE_ID, book_id, 3).await;
    let first = workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap();
    workflow::cancel_by_customer(&pool, &customer(ALICE_ID), first.order.id)
        .await
        .unwrap();

    put_in_cart(&pool, BOB_ID, book_id, 2).await;
    workflow::checkout(&pool, &customer(BOB_ID), checkout_payload())
        .await
        .unwrap();

    inventory::apply_manual_adjustment(&pool, book_id, 5, STAFF_ID, Some("restock".into()))
        .await
        .unwrap();

    let stock = stock_of(&pool, book_id).await;
    assert_eq!(stock, 13); // 10 - 3 + 3 - 2 + 5
    assert_eq!(inventory::ledger_sum(&pool, book_id).await.unwrap(), stock);
}

#[tokio::test]
async fn test_manual_adjustment_cannot_go_negative() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1000, 3).await;

    let err = inventory::apply_manual_adjustment(&pool, book_id, -5, STAFF_ID, None)
        .await
        .expect_err("Stock must not go negative");
    assert!(matches!(
        err,
        crate::db::repository::RepoError::InsufficientStock(id) if id == book_id
    ));

    assert_eq!(stock_of(&pool, book_id).await, 3);
    assert_eq!(
        inventory::find_logs_by_book(&pool, book_id, 10, 0).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_stock_status_auto_flip() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 1000, 2).await;

    // Sell out
    put_in_cart(&pool, ALICE_ID, book_id, 2).await;
    workflow::checkout(&pool, &customer(ALICE_ID), checkout_payload())
        .await
        .unwrap();
    let sold_out = book::find_by_id(&pool, book_id).await.unwrap().unwrap();
    assert_eq!(sold_out.stock_quantity, 0);
    assert_eq!(sold_out.status, BookStatus::OutOfStock);

    // Restock flips it back
    inventory::apply_manual_adjustment(&pool, book_id, 7, STAFF_ID, None)
        .await
        .unwrap();
    let restocked = book::find_by_id(&pool, book_id).await.unwrap().unwrap();
    assert_eq!(restocked.status, BookStatus::Available);
    assert_eq!(restocked.stock_quantity, 7);
}

#[tokio::test]
async fn test_low_stock_query() {
    let (_dir, pool) = test_db().await;
    let scarce = seed_book(&pool, 1000, 2).await;
    let plenty = seed_book(&pool, 1000, 50).await;

    let low = inventory::find_low_stock(&pool, 5).await.unwrap();
    let ids: Vec<i64> = low.iter().map(|b| b.id).collect();
    assert!(ids.contains(&scarce));
    assert!(!ids.contains(&plenty));
}

#[tokio::test]
async fn test_concurrent_checkout_of_last_unit() {
    let (_dir, pool) = test_db().await;
    let book_id = seed_book(&pool, 3000, 1).await;
    put_in_cart(&pool, ALICE_ID, book_id, 1).await;
    put_in_cart(&pool, BOB_ID, book_id, 1).await;

    let alice_pool = pool.clone();
    let bob_pool = pool.clone();
    let alice_customer = customer(ALICE_ID);
    let bob_customer = customer(BOB_ID);
    let (alice_result, bob_result) = tokio::join!(
        workflow::checkout(&alice_pool, &alice_customer, checkout_payload()),
        workflow::checkout(&bob_pool, &bob_customer, checkout_payload()),
    );

    let winners = [&alice_result, &bob_result]
        .iter()
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(winners, 1, "exactly one checkout must win the last unit");

    let loser = if alice_result.is_ok() {
        bob_result.expect_err("Bob should have lost")
    } else {
        alice_result.expect_err("Alice should have lost")
    };
    assert!(
        matches!(
            loser.code,
            ErrorCode::InsufficientStock | ErrorCode::StockConflict
        ),
        "loser got unexpected error: {loser:?}"
    );

    assert_eq!(stock_of(&pool, book_id).await, 0);
    assert_eq!(inventory::ledger_sum(&pool, book_id).await.unwrap(), 0);
}
