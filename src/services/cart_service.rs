// gemstore/src/services/cart_service.rs

//! Shopping cart operations, keyed per user. The cart is a quote, not a
//! reservation: stock is checked here for a friendly early error, but only
//! the order workflow actually decrements it.

use crate::errors::AppError;
use crate::models::cart_item::CartItem;
use crate::models::gem::{effective_price_cents, DiscountType};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A cart row joined with live gem data, priced at today's effective price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub gem_id: Uuid,
  pub name: String,
  pub category: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub line_total_cents: i64,
  pub stock_quantity: i32,
  pub is_available: bool,
}

#[derive(Debug, FromRow)]
struct CartRow {
  gem_id: Uuid,
  name: String,
  category: String,
  quantity: i32,
  price_cents: i64,
  discount_value: i64,
  discount_type: DiscountType,
  stock_quantity: i32,
  is_available: bool,
}

#[instrument(name = "cart_service::get_cart", skip(pool), fields(user_id = %user_id))]
pub async fn get_cart(pool: &PgPool, user_id: Uuid) -> Result<(Vec<CartLine>, i64), AppError> {
  let rows: Vec<CartRow> = sqlx::query_as(
    "SELECT c.gem_id, g.name, g.category, c.quantity, g.price_cents, g.discount_value,
            g.discount_type, g.stock_quantity, g.is_available
     FROM cart_items c
     JOIN gems g ON g.id = c.gem_id
     WHERE c.user_id = $1
     ORDER BY c.added_at ASC",
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  let lines: Vec<CartLine> = rows
    .into_iter()
    .map(|r| {
      let unit = effective_price_cents(r.price_cents, r.discount_value, r.discount_type);
      CartLine {
        gem_id: r.gem_id,
        name: r.name,
        category: r.category,
        quantity: r.quantity,
        unit_price_cents: unit,
        line_total_cents: unit * i64::from(r.quantity),
        stock_quantity: r.stock_quantity,
        is_available: r.is_available,
      }
    })
    .collect();

  let subtotal = lines.iter().map(|l| l.line_total_cents).sum();
  Ok((lines, subtotal))
}

#[instrument(
  name = "cart_service::add_to_cart",
  skip(pool),
  fields(user_id = %user_id, gem_id = %gem_id, quantity = quantity)
)]
pub async fn add_to_cart(pool: &PgPool, user_id: Uuid, gem_id: Uuid, quantity: i32) -> Result<CartItem, AppError> {
  if quantity < 1 {
    return Err(AppError::Validation("Quantity must be a positive number.".to_string()));
  }

  #[derive(FromRow)]
  struct GemCheck {
    name: String,
    stock_quantity: i32,
    is_available: bool,
  }

  let gem: Option<GemCheck> = sqlx::query_as("SELECT name, stock_quantity, is_available FROM gems WHERE id = $1")
    .bind(gem_id)
    .fetch_optional(pool)
    .await?;
  let gem = gem.ok_or_else(|| AppError::NotFound(format!("Gem with ID {} not found.", gem_id)))?;

  if !gem.is_available {
    warn!("Attempt to add unavailable gem {} to cart.", gem_id);
    return Err(AppError::Validation(format!("\"{}\" is currently not available.", gem.name)));
  }

  let existing_quantity: Option<i32> =
    sqlx::query_scalar("SELECT quantity FROM cart_items WHERE user_id = $1 AND gem_id = $2")
      .bind(user_id)
      .bind(gem_id)
      .fetch_optional(pool)
      .await?;

  let desired = existing_quantity.unwrap_or(0) + quantity;
  if desired > gem.stock_quantity {
    warn!(
      "Cart add would exceed stock for gem {}: desired {}, stock {}.",
      gem_id, desired, gem.stock_quantity
    );
    return Err(AppError::InsufficientStock(gem.name));
  }

  // One row per (user, gem): re-adding increments the quantity.
  let item: CartItem = sqlx::query_as(
    "INSERT INTO cart_items (user_id, gem_id, quantity)
     VALUES ($1, $2, $3)
     ON CONFLICT (user_id, gem_id)
     DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW()
     RETURNING id, user_id, gem_id, quantity, added_at, updated_at",
  )
  .bind(user_id)
  .bind(gem_id)
  .bind(quantity)
  .fetch_one(pool)
  .await?;

  info!("Cart item {} now has quantity {}.", item.id, item.quantity);
  Ok(item)
}

#[instrument(
  name = "cart_service::update_quantity",
  skip(pool),
  fields(user_id = %user_id, gem_id = %gem_id, quantity = quantity)
)]
pub async fn update_quantity(pool: &PgPool, user_id: Uuid, gem_id: Uuid, quantity: i32) -> Result<CartItem, AppError> {
  if quantity < 1 {
    return Err(AppError::Validation(
      "Quantity must be a positive number; use remove to drop the item.".to_string(),
    ));
  }

  #[derive(FromRow)]
  struct GemCheck {
    name: String,
    stock_quantity: i32,
  }

  let gem: Option<GemCheck> = sqlx::query_as("SELECT name, stock_quantity FROM gems WHERE id = $1")
    .bind(gem_id)
    .fetch_optional(pool)
    .await?;
  let gem = gem.ok_or_else(|| AppError::NotFound(format!("Gem with ID {} not found.", gem_id)))?;

  if quantity > gem.stock_quantity {
    return Err(AppError::InsufficientStock(gem.name));
  }

  let item: Option<CartItem> = sqlx::query_as(
    "UPDATE cart_items SET quantity = $3, updated_at = NOW()
     WHERE user_id = $1 AND gem_id = $2
     RETURNING id, user_id, gem_id, quantity, added_at, updated_at",
  )
  .bind(user_id)
  .bind(gem_id)
  .bind(quantity)
  .fetch_optional(pool)
  .await?;

  item.ok_or_else(|| AppError::NotFound("This gem is not in your cart.".to_string()))
}

#[instrument(name = "cart_service::remove_item", skip(pool), fields(user_id = %user_id, gem_id = %gem_id))]
pub async fn remove_item(pool: &PgPool, user_id: Uuid, gem_id: Uuid) -> Result<(), AppError> {
  let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND gem_id = $2")
    .bind(user_id)
    .bind(gem_id)
    .execute(pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("This gem is not in your cart.".to_string()));
  }
  Ok(())
}

#[instrument(name = "cart_service::clear_cart", skip(pool), fields(user_id = %user_id))]
pub async fn clear_cart(pool: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
  let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
    .bind(user_id)
    .execute(pool)
    .await?;
  info!("Cleared {} cart items for user {}.", result.rows_affected(), user_id);
  Ok(result.rows_affected())
}
