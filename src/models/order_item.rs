// gemstore/src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A line item within an order. Name and unit price are copied from the gem
/// at purchase time, so later catalog changes never rewrite order history.
/// `gem_id` goes NULL if the gem is later deleted from the catalog.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub gem_id: Option<Uuid>,
  pub gem_name: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
}
