// gemstore/tests/order_workflow.rs

//! End-to-end order workflow tests against a real Postgres instance.
//!
//! These tests need `DATABASE_URL` pointing at a throwaway database; when it
//! is not set they print a notice and pass as skipped. Every test creates
//! its own user and gems, so runs are independent, but they share the
//! database and are serialised with `serial_test` to keep the logs readable.

use gemstore::errors::AppError;
use gemstore::models::order::{OrderStatus, PaymentMethod};
use gemstore::services::{auth_service, cart_service, catalog_service, order_service};
use gemstore::services::catalog_service::NewGem;
use gemstore::services::order_service::{OrderLineRequest, PlaceOrderRequest, ShippingAddress};
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
  let url = match std::env::var("DATABASE_URL") {
    Ok(u) => u,
    Err(_) => {
      eprintln!("DATABASE_URL not set; skipping database-backed test.");
      return None;
    }
  };
  let pool = PgPool::connect(&url).await.expect("connect to test database");
  sqlx::migrate!("./migrations").run(&pool).await.expect("run migrations");
  Some(pool)
}

async fn create_user(pool: &PgPool) -> Uuid {
  let email = format!("buyer-{}@example.com", Uuid::new_v4().simple());
  let user = auth_service::register_user(pool, &email, "a strong password", "Test Buyer")
    .await
    .expect("register test user");
  user.id
}

async fn create_gem(pool: &PgPool, name: &str, price_cents: i64, stock: i32) -> Uuid {
  let gem = catalog_service::create_gem(
    pool,
    NewGem {
      name: format!("{} {}", name, Uuid::new_v4().simple()),
      category: "test".into(),
      description: None,
      price_cents,
      discount_value: 0,
      discount_type: None,
      stock_quantity: stock,
      is_available: true,
      images: vec![],
      certification: None,
      origin: None,
      audience_tags: vec![],
      benefit_tags: vec![],
    },
  )
  .await
  .expect("create test gem");
  gem.id
}

async fn stock_of(pool: &PgPool, gem_id: Uuid) -> i32 {
  sqlx::query_scalar("SELECT stock_quantity FROM gems WHERE id = $1")
    .bind(gem_id)
    .fetch_one(pool)
    .await
    .expect("read stock")
}

async fn cart_size(pool: &PgPool, user_id: Uuid) -> i64 {
  sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
    .bind(user_id)
    .fetch_one(pool)
    .await
    .expect("count cart items")
}

fn address() -> ShippingAddress {
  ShippingAddress {
    full_name: "Test Buyer".into(),
    street: "1 Test Lane".into(),
    city: "Testville".into(),
    state: "TS".into(),
    postal_code: "00001".into(),
    country: "Testland".into(),
    phone: "+1 555 0100".into(),
  }
}

fn order_of(gem_id: Uuid, quantity: i32) -> PlaceOrderRequest {
  PlaceOrderRequest {
    items: vec![OrderLineRequest { gem_id, quantity, price_cents: None }],
    shipping_address: address(),
    payment_method: PaymentMethod::Cod,
    notes: None,
  }
}

#[tokio::test]
#[serial]
async fn place_then_cancel_restores_stock_exactly() {
  let Some(pool) = test_pool().await else { return };
  let user = create_user(&pool).await;
  let gem = create_gem(&pool, "Ruby", 10_000, 5).await;

  // Order 3 of 5: succeeds, total is priced from the catalog.
  let confirmation = order_service::place_order(&pool, user, &order_of(gem, 3)).await.unwrap();
  assert_eq!(confirmation.status, OrderStatus::Pending);
  assert_eq!(confirmation.total_amount_cents, 30_000);
  assert_eq!(stock_of(&pool, gem).await, 2);

  // Second order of 3 exceeds the remaining 2: fails, stock unchanged.
  let err = order_service::place_order(&pool, user, &order_of(gem, 3)).await.unwrap_err();
  assert!(matches!(err, AppError::InsufficientStock(_)), "got {err:?}");
  assert_eq!(stock_of(&pool, gem).await, 2);

  // Cancelling the first order restores the recorded quantity.
  let cancelled = order_service::cancel_order(&pool, user, &confirmation.order_number).await.unwrap();
  assert_eq!(cancelled.status, OrderStatus::Cancelled);
  assert_eq!(stock_of(&pool, gem).await, 5);
}

#[tokio::test]
#[serial]
async fn failed_placement_leaves_stock_and_cart_untouched() {
  let Some(pool) = test_pool().await else { return };
  let user = create_user(&pool).await;
  let gem = create_gem(&pool, "Emerald", 20_000, 2).await;
  cart_service::add_to_cart(&pool, user, gem, 1).await.unwrap();

  let err = order_service::place_order(&pool, user, &order_of(gem, 3)).await.unwrap_err();
  assert!(matches!(err, AppError::InsufficientStock(_)), "got {err:?}");

  assert_eq!(stock_of(&pool, gem).await, 2);
  assert_eq!(cart_size(&pool, user).await, 1, "failed placement must not clear the cart");
}

#[tokio::test]
#[serial]
async fn successful_placement_clears_the_whole_cart() {
  let Some(pool) = test_pool().await else { return };
  let user = create_user(&pool).await;
  let gem_a = create_gem(&pool, "Sapphire", 15_000, 10).await;
  let gem_b = create_gem(&pool, "Pearl", 4_000, 10).await;
  cart_service::add_to_cart(&pool, user, gem_a, 2).await.unwrap();
  cart_service::add_to_cart(&pool, user, gem_b, 1).await.unwrap();

  let req = PlaceOrderRequest {
    items: vec![
      OrderLineRequest { gem_id: gem_a, quantity: 2, price_cents: None },
      OrderLineRequest { gem_id: gem_b, quantity: 1, price_cents: None },
    ],
    shipping_address: address(),
    payment_method: PaymentMethod::Card,
    notes: Some("gift wrap please".into()),
  };
  let confirmation = order_service::place_order(&pool, user, &req).await.unwrap();
  assert_eq!(confirmation.total_amount_cents, 2 * 15_000 + 4_000);
  assert_eq!(cart_size(&pool, user).await, 0);

  // The fetched order carries both lines with snapshot prices.
  let full = order_service::get_order(&pool, user, &confirmation.order_number).await.unwrap();
  assert_eq!(full.items.len(), 2);
  assert!(full.items.iter().all(|i| i.unit_price_cents > 0));
}

#[tokio::test]
#[serial]
async fn cancelling_twice_is_a_guarded_no_op() {
  let Some(pool) = test_pool().await else { return };
  let user = create_user(&pool).await;
  let gem = create_gem(&pool, "Topaz", 5_000, 4).await;

  let confirmation = order_service::place_order(&pool, user, &order_of(gem, 2)).await.unwrap();
  order_service::cancel_order(&pool, user, &confirmation.order_number).await.unwrap();
  assert_eq!(stock_of(&pool, gem).await, 4);

  let err = order_service::cancel_order(&pool, user, &confirmation.order_number).await.unwrap_err();
  assert!(matches!(err, AppError::AlreadyCancelled), "got {err:?}");
  assert_eq!(stock_of(&pool, gem).await, 4, "second cancel must not restore stock again");
}

#[tokio::test]
#[serial]
async fn shipped_orders_can_no_longer_be_cancelled() {
  let Some(pool) = test_pool().await else { return };
  let user = create_user(&pool).await;
  let gem = create_gem(&pool, "Opal", 8_000, 3).await;

  let confirmation = order_service::place_order(&pool, user, &order_of(gem, 1)).await.unwrap();
  for status in [OrderStatus::Confirmed, OrderStatus::Processing, OrderStatus::Shipped] {
    order_service::advance_status(&pool, &confirmation.order_number, status, None).await.unwrap();
  }

  let err = order_service::cancel_order(&pool, user, &confirmation.order_number).await.unwrap_err();
  assert!(matches!(err, AppError::InvalidTransition(_)), "got {err:?}");
  assert_eq!(stock_of(&pool, gem).await, 2, "no stock restoration for a shipped order");
}

#[tokio::test]
#[serial]
async fn foreign_orders_read_and_cancel_as_not_found() {
  let Some(pool) = test_pool().await else { return };
  let owner = create_user(&pool).await;
  let stranger = create_user(&pool).await;
  let gem = create_gem(&pool, "Garnet", 6_000, 5).await;

  let confirmation = order_service::place_order(&pool, owner, &order_of(gem, 1)).await.unwrap();

  let err = order_service::get_order(&pool, stranger, &confirmation.order_number).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

  let err = order_service::cancel_order(&pool, stranger, &confirmation.order_number).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
  assert_eq!(stock_of(&pool, gem).await, 4, "a stranger's cancel attempt must not touch stock");
}

#[tokio::test]
#[serial]
async fn concurrent_checkouts_cannot_oversell() {
  let Some(pool) = test_pool().await else { return };
  let user_a = create_user(&pool).await;
  let user_b = create_user(&pool).await;
  let gem = create_gem(&pool, "Moonstone", 9_000, 5).await;

  // Two simultaneous orders of 3 against stock 5: both pass the snapshot
  // check, but the conditional decrement lets exactly one commit.
  let req_a = order_of(gem, 3);
  let req_b = order_of(gem, 3);
  let (res_a, res_b) = tokio::join!(
    order_service::place_order(&pool, user_a, &req_a),
    order_service::place_order(&pool, user_b, &req_b),
  );

  let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
  assert_eq!(successes, 1, "exactly one of the racing checkouts may win: {res_a:?} / {res_b:?}");
  for res in [res_a, res_b] {
    if let Err(err) = res {
      assert!(matches!(err, AppError::InsufficientStock(_)), "loser must see InsufficientStock, got {err:?}");
    }
  }

  let final_stock = stock_of(&pool, gem).await;
  assert_eq!(final_stock, 2);
  assert!(final_stock >= 0, "stock must never go negative");
}

#[tokio::test]
#[serial]
async fn listing_is_scoped_newest_first_and_filterable() {
  let Some(pool) = test_pool().await else { return };
  let user = create_user(&pool).await;
  let other = create_user(&pool).await;
  let gem = create_gem(&pool, "Amethyst", 3_000, 50).await;

  let first = order_service::place_order(&pool, user, &order_of(gem, 1)).await.unwrap();
  let second = order_service::place_order(&pool, user, &order_of(gem, 1)).await.unwrap();
  order_service::place_order(&pool, other, &order_of(gem, 1)).await.unwrap();
  order_service::cancel_order(&pool, user, &first.order_number).await.unwrap();

  let (orders, pagination) = order_service::list_orders(&pool, user, None, None, None).await.unwrap();
  assert_eq!(pagination.total_items, 2, "listing must only see the caller's orders");
  assert_eq!(orders[0].order_number, second.order_number, "newest first");

  let (cancelled_only, _) =
    order_service::list_orders(&pool, user, None, None, Some(OrderStatus::Cancelled)).await.unwrap();
  assert_eq!(cancelled_only.len(), 1);
  assert_eq!(cancelled_only[0].order_number, first.order_number);
}
