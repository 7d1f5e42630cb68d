// gemstore/src/services/order_service.rs

//! The order workflow: placement, listing, fetching, cancellation, and the
//! admin fulfilment transitions.
//!
//! Placement is the one operation where several records must change
//! together, so the whole thing runs inside a single Postgres transaction.
//! Stock is mutated only through conditional updates
//! (`... WHERE stock_quantity >= $n`), so two concurrent checkouts against
//! the same gem can never oversell: the loser's update affects zero rows and
//! its transaction rolls back untouched.

use crate::errors::AppError;
use crate::models::gem::Gem;
use crate::models::order::{Order, OrderStatus, PaymentMethod};
use crate::models::order_item::OrderItem;
use crate::services::{page_window, Pagination};
use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, total_amount_cents, payment_method, \
   shipping_full_name, shipping_street, shipping_city, shipping_state, shipping_postal_code, \
   shipping_country, shipping_phone, notes, tracking_number, created_at, updated_at";

const GEM_COLUMNS: &str = "id, name, category, description, price_cents, discount_value, discount_type, \
   stock_quantity, is_available, images, certification, origin, audience_tags, benefit_tags, \
   created_at, updated_at";

// --- Request / response types ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
  pub gem_id: Uuid,
  pub quantity: i32,
  /// The price the client displayed. Accepted for diagnostics only; the
  /// authoritative unit price is always re-derived from the catalog.
  pub price_cents: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  pub full_name: String,
  pub street: String,
  pub city: String,
  pub state: String,
  pub postal_code: String,
  pub country: String,
  pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
  pub items: Vec<OrderLineRequest>,
  pub shipping_address: ShippingAddress,
  pub payment_method: PaymentMethod,
  pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
  pub order_number: String,
  pub status: OrderStatus,
  pub total_amount_cents: i64,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItem>,
}

// --- Validation ---

fn validate_place_order(req: &PlaceOrderRequest) -> Result<(), AppError> {
  let mut field_errors = Vec::new();

  if req.items.is_empty() {
    field_errors.push("Order must contain at least one item.".to_string());
  }
  for (idx, line) in req.items.iter().enumerate() {
    if line.quantity < 1 {
      field_errors.push(format!("Item {}: quantity must be at least 1.", idx + 1));
    }
    if matches!(line.price_cents, Some(p) if p < 0) {
      field_errors.push(format!("Item {}: price must not be negative.", idx + 1));
    }
  }

  let addr = &req.shipping_address;
  for (value, label) in [
    (&addr.full_name, "full name"),
    (&addr.street, "street"),
    (&addr.city, "city"),
    (&addr.state, "state"),
    (&addr.postal_code, "postal code"),
    (&addr.country, "country"),
    (&addr.phone, "phone"),
  ] {
    if value.trim().is_empty() {
      field_errors.push(format!("Shipping address: {} is required.", label));
    }
  }

  if field_errors.is_empty() {
    Ok(())
  } else {
    Err(AppError::FieldValidation(field_errors))
  }
}

/// `ORD-<utc date>-<48 random bits>`. Entropy is high enough that a
/// collision within one day is vanishingly unlikely; the UNIQUE constraint
/// on `order_number` backstops it regardless.
pub fn generate_order_number() -> String {
  let mut bytes = [0u8; 6];
  OsRng.fill_bytes(&mut bytes);
  let suffix: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
  format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

// --- Operations ---

/// Places an order: validates every line against a single in-transaction
/// snapshot, snapshots prices, decrements stock conditionally, clears the
/// cart, and commits — or rolls the whole thing back.
#[instrument(name = "order_service::place_order", skip(pool, req), fields(user_id = %user_id))]
pub async fn place_order(pool: &PgPool, user_id: Uuid, req: &PlaceOrderRequest) -> Result<OrderConfirmation, AppError> {
  validate_place_order(req)?;

  let mut tx = pool.begin().await?;

  // Single consistent snapshot of every referenced gem.
  let gem_ids: Vec<Uuid> = req.items.iter().map(|l| l.gem_id).collect();
  let gems: Vec<Gem> = sqlx::query_as(&format!("SELECT {GEM_COLUMNS} FROM gems WHERE id = ANY($1)"))
    .bind(&gem_ids)
    .fetch_all(&mut *tx)
    .await?;
  let gems_by_id: HashMap<Uuid, &Gem> = gems.iter().map(|g| (g.id, g)).collect();

  // All validation happens before any mutation.
  let mut total_amount_cents: i64 = 0;
  let mut priced_lines: Vec<(&OrderLineRequest, &Gem, i64)> = Vec::with_capacity(req.items.len());
  for line in &req.items {
    let gem = gems_by_id.get(&line.gem_id).copied().ok_or_else(|| {
      warn!("Order references missing gem {}.", line.gem_id);
      AppError::NotFound("One or more items in your order no longer exist.".to_string())
    })?;

    if !gem.is_available || gem.stock_quantity < line.quantity {
      warn!(
        "Insufficient stock for gem {}: available={}, stock={}, requested={}.",
        gem.id, gem.is_available, gem.stock_quantity, line.quantity
      );
      return Err(AppError::InsufficientStock(gem.name.clone()));
    }

    let unit_price_cents = gem.effective_price_cents();
    if let Some(client_price) = line.price_cents {
      if client_price != unit_price_cents {
        // Never trusted, only logged: the catalog price wins.
        warn!(
          "Client price {} disagrees with catalog price {} for gem {}.",
          client_price, unit_price_cents, gem.id
        );
      }
    }

    total_amount_cents += unit_price_cents * i64::from(line.quantity);
    priced_lines.push((line, gem, unit_price_cents));
  }

  let order_number = generate_order_number();
  let addr = &req.shipping_address;
  let order: Order = sqlx::query_as(&format!(
    "INSERT INTO orders (order_number, user_id, status, total_amount_cents, payment_method,
                         shipping_full_name, shipping_street, shipping_city, shipping_state,
                         shipping_postal_code, shipping_country, shipping_phone, notes)
     VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
     RETURNING {ORDER_COLUMNS}"
  ))
  .bind(&order_number)
  .bind(user_id)
  .bind(total_amount_cents)
  .bind(req.payment_method)
  .bind(addr.full_name.trim())
  .bind(addr.street.trim())
  .bind(addr.city.trim())
  .bind(addr.state.trim())
  .bind(addr.postal_code.trim())
  .bind(addr.country.trim())
  .bind(addr.phone.trim())
  .bind(&req.notes)
  .fetch_one(&mut *tx)
  .await?;

  for (line, gem, unit_price_cents) in &priced_lines {
    sqlx::query(
      "INSERT INTO order_items (order_id, gem_id, gem_name, quantity, unit_price_cents)
       VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(order.id)
    .bind(gem.id)
    .bind(&gem.name)
    .bind(line.quantity)
    .bind(unit_price_cents)
    .execute(&mut *tx)
    .await?;
  }

  // Conditional decrement, per line. Zero rows affected means a concurrent
  // checkout beat us to the stock since the snapshot above; the error drops
  // the transaction and nothing persists.
  for (line, gem, _) in &priced_lines {
    let result = sqlx::query(
      "UPDATE gems
       SET stock_quantity = stock_quantity - $1, updated_at = NOW()
       WHERE id = $2 AND is_available AND stock_quantity >= $1",
    )
    .bind(line.quantity)
    .bind(gem.id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
      warn!("Lost stock race for gem {} while placing order {}.", gem.id, order_number);
      return Err(AppError::InsufficientStock(gem.name.clone()));
    }
  }

  // Checkout consumes the whole cart.
  sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

  tx.commit().await?;

  info!(
    "Order {} placed by user {}: {} lines, total {} cents.",
    order.order_number,
    user_id,
    priced_lines.len(),
    total_amount_cents
  );

  Ok(OrderConfirmation {
    order_number: order.order_number,
    status: order.status,
    total_amount_cents: order.total_amount_cents,
    created_at: order.created_at,
  })
}

/// Lists the requesting user's orders, newest first, optionally filtered by
/// status. Never crosses user boundaries.
#[instrument(name = "order_service::list_orders", skip(pool), fields(user_id = %user_id))]
pub async fn list_orders(
  pool: &PgPool,
  user_id: Uuid,
  page: Option<i64>,
  limit: Option<i64>,
  status: Option<OrderStatus>,
) -> Result<(Vec<Order>, Pagination), AppError> {
  let (page, limit, offset) = page_window(page, limit);

  let total_items: i64 = sqlx::query_scalar(
    "SELECT COUNT(*) FROM orders
     WHERE user_id = $1 AND ($2::order_status_enum IS NULL OR status = $2)",
  )
  .bind(user_id)
  .bind(status)
  .fetch_one(pool)
  .await?;

  let orders: Vec<Order> = sqlx::query_as(&format!(
    "SELECT {ORDER_COLUMNS} FROM orders
     WHERE user_id = $1 AND ($2::order_status_enum IS NULL OR status = $2)
     ORDER BY created_at DESC
     LIMIT $3 OFFSET $4"
  ))
  .bind(user_id)
  .bind(status)
  .bind(limit)
  .bind(offset)
  .fetch_all(pool)
  .await?;

  Ok((orders, Pagination::new(page, limit, total_items)))
}

/// Fetches one order with its lines, scoped to the owner. A foreign owner
/// gets `NotFound`, never `Forbidden`, so order numbers leak nothing.
#[instrument(name = "order_service::get_order", skip(pool), fields(user_id = %user_id, order_number = %order_number))]
pub async fn get_order(pool: &PgPool, user_id: Uuid, order_number: &str) -> Result<OrderWithItems, AppError> {
  let order: Option<Order> = sqlx::query_as(&format!(
    "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1 AND user_id = $2"
  ))
  .bind(order_number)
  .bind(user_id)
  .fetch_optional(pool)
  .await?;
  let order = order.ok_or_else(|| AppError::NotFound(format!("Order {} not found.", order_number)))?;

  let items: Vec<OrderItem> = sqlx::query_as(
    "SELECT id, order_id, gem_id, gem_name, quantity, unit_price_cents FROM order_items WHERE order_id = $1",
  )
  .bind(order.id)
  .fetch_all(pool)
  .await?;

  Ok(OrderWithItems { order, items })
}

/// Cancels an order and restores exactly the quantities recorded on its
/// lines, in one transaction. Owner-scoped like `get_order`.
#[instrument(name = "order_service::cancel_order", skip(pool), fields(user_id = %user_id, order_number = %order_number))]
pub async fn cancel_order(pool: &PgPool, user_id: Uuid, order_number: &str) -> Result<Order, AppError> {
  let mut tx = pool.begin().await?;

  // Row lock so a concurrent cancel or fulfilment transition serialises here.
  let order: Option<Order> = sqlx::query_as(&format!(
    "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1 AND user_id = $2 FOR UPDATE"
  ))
  .bind(order_number)
  .bind(user_id)
  .fetch_optional(&mut *tx)
  .await?;
  let order = order.ok_or_else(|| AppError::NotFound(format!("Order {} not found.", order_number)))?;

  match order.status {
    OrderStatus::Cancelled => return Err(AppError::AlreadyCancelled),
    s if !s.can_cancel() => {
      return Err(AppError::InvalidTransition(format!(
        "Order {} can no longer be cancelled: it is already {}.",
        order_number, s
      )));
    }
    _ => {}
  }

  let cancelled: Order = sqlx::query_as(&format!(
    "UPDATE orders SET status = 'cancelled', updated_at = NOW() WHERE id = $1 RETURNING {ORDER_COLUMNS}"
  ))
  .bind(order.id)
  .fetch_one(&mut *tx)
  .await?;

  // Exact inverse of the placement decrement: restore the recorded
  // quantities, regardless of unrelated stock changes since. Lines whose
  // gem was deleted from the catalog have nothing to restore.
  let items: Vec<OrderItem> = sqlx::query_as(
    "SELECT id, order_id, gem_id, gem_name, quantity, unit_price_cents FROM order_items WHERE order_id = $1",
  )
  .bind(order.id)
  .fetch_all(&mut *tx)
  .await?;

  for item in &items {
    if let Some(gem_id) = item.gem_id {
      sqlx::query("UPDATE gems SET stock_quantity = stock_quantity + $1, updated_at = NOW() WHERE id = $2")
        .bind(item.quantity)
        .bind(gem_id)
        .execute(&mut *tx)
        .await?;
    }
  }

  tx.commit().await?;

  info!(
    "Order {} cancelled by user {}; restored stock on {} lines.",
    order_number,
    user_id,
    items.len()
  );
  Ok(cancelled)
}

/// Admin fulfilment transition, validated against the closed transition
/// table. Cancellation must go through `cancel_order` so stock is restored.
#[instrument(name = "order_service::advance_status", skip(pool), fields(order_number = %order_number, next = %next))]
pub async fn advance_status(
  pool: &PgPool,
  order_number: &str,
  next: OrderStatus,
  tracking_number: Option<String>,
) -> Result<Order, AppError> {
  if next == OrderStatus::Cancelled {
    return Err(AppError::InvalidTransition(
      "Use the cancellation endpoint to cancel an order.".to_string(),
    ));
  }

  let mut tx = pool.begin().await?;

  let order: Option<Order> = sqlx::query_as(&format!(
    "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1 FOR UPDATE"
  ))
  .bind(order_number)
  .fetch_optional(&mut *tx)
  .await?;
  let order = order.ok_or_else(|| AppError::NotFound(format!("Order {} not found.", order_number)))?;

  if !order.status.can_transition_to(next) {
    return Err(AppError::InvalidTransition(format!(
      "Order {} cannot move from {} to {}.",
      order_number, order.status, next
    )));
  }

  let updated: Order = sqlx::query_as(&format!(
    "UPDATE orders
     SET status = $2, tracking_number = COALESCE($3, tracking_number), updated_at = NOW()
     WHERE id = $1
     RETURNING {ORDER_COLUMNS}"
  ))
  .bind(order.id)
  .bind(next)
  .bind(&tracking_number)
  .fetch_one(&mut *tx)
  .await?;

  tx.commit().await?;

  info!("Order {} advanced to {}.", order_number, next);
  Ok(updated)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::order::PaymentMethod;

  fn sample_address() -> ShippingAddress {
    ShippingAddress {
      full_name: "Asha Rao".into(),
      street: "12 Marine Drive".into(),
      city: "Mumbai".into(),
      state: "MH".into(),
      postal_code: "400001".into(),
      country: "India".into(),
      phone: "+91 98200 00000".into(),
    }
  }

  fn sample_request(items: Vec<OrderLineRequest>) -> PlaceOrderRequest {
    PlaceOrderRequest {
      items,
      shipping_address: sample_address(),
      payment_method: PaymentMethod::Cod,
      notes: None,
    }
  }

  #[test]
  fn empty_order_is_rejected_before_touching_the_database() {
    let err = validate_place_order(&sample_request(vec![])).unwrap_err();
    match err {
      AppError::FieldValidation(errors) => {
        assert!(errors.iter().any(|e| e.contains("at least one item")));
      }
      other => panic!("expected FieldValidation, got {other:?}"),
    }
  }

  #[test]
  fn non_positive_quantities_and_negative_prices_are_rejected() {
    let req = sample_request(vec![
      OrderLineRequest { gem_id: Uuid::new_v4(), quantity: 0, price_cents: None },
      OrderLineRequest { gem_id: Uuid::new_v4(), quantity: 2, price_cents: Some(-5) },
    ]);
    let err = validate_place_order(&req).unwrap_err();
    match err {
      AppError::FieldValidation(errors) => {
        assert!(errors.iter().any(|e| e.starts_with("Item 1")));
        assert!(errors.iter().any(|e| e.starts_with("Item 2")));
      }
      other => panic!("expected FieldValidation, got {other:?}"),
    }
  }

  #[test]
  fn blank_shipping_fields_are_each_reported() {
    let mut req = sample_request(vec![OrderLineRequest {
      gem_id: Uuid::new_v4(),
      quantity: 1,
      price_cents: None,
    }]);
    req.shipping_address.city = "  ".into();
    req.shipping_address.phone = String::new();
    let err = validate_place_order(&req).unwrap_err();
    match err {
      AppError::FieldValidation(errors) => {
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("city")));
        assert!(errors.iter().any(|e| e.contains("phone")));
      }
      other => panic!("expected FieldValidation, got {other:?}"),
    }
  }

  #[test]
  fn order_numbers_have_the_documented_shape_and_do_not_repeat() {
    let a = generate_order_number();
    let b = generate_order_number();
    assert_ne!(a, b);
    let parts: Vec<&str> = a.split('-').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "ORD");
    assert_eq!(parts[1].len(), 8);
    assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    assert_eq!(parts[2].len(), 12);
    assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
  }
}
