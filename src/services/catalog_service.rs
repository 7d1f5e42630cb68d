// gemstore/src/services/catalog_service.rs

//! Gem catalog CRUD. Reads are public; writes are reserved for admins
//! (enforced at the route layer by the `AdminUser` extractor).

use crate::errors::AppError;
use crate::models::gem::{DiscountType, Gem};
use crate::services::{page_window, Pagination};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const GEM_COLUMNS: &str = "id, name, category, description, price_cents, discount_value, discount_type, \
   stock_quantity, is_available, images, certification, origin, audience_tags, benefit_tags, \
   created_at, updated_at";

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemFilter {
  pub page: Option<i64>,
  pub limit: Option<i64>,
  pub category: Option<String>,
  pub available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGem {
  pub name: String,
  pub category: String,
  pub description: Option<String>,
  pub price_cents: i64,
  #[serde(default)]
  pub discount_value: i64,
  pub discount_type: Option<DiscountType>,
  pub stock_quantity: i32,
  #[serde(default = "default_true")]
  pub is_available: bool,
  #[serde(default)]
  pub images: Vec<String>,
  pub certification: Option<String>,
  pub origin: Option<String>,
  #[serde(default)]
  pub audience_tags: Vec<String>,
  #[serde(default)]
  pub benefit_tags: Vec<String>,
}

fn default_true() -> bool {
  true
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemUpdate {
  pub name: Option<String>,
  pub category: Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
  pub discount_value: Option<i64>,
  pub discount_type: Option<DiscountType>,
  pub stock_quantity: Option<i32>,
  pub is_available: Option<bool>,
  pub images: Option<Vec<String>>,
  pub certification: Option<String>,
  pub origin: Option<String>,
  pub audience_tags: Option<Vec<String>>,
  pub benefit_tags: Option<Vec<String>>,
}

fn validate_gem_fields(
  name: &str,
  price_cents: i64,
  stock_quantity: i32,
  discount_value: i64,
  discount_type: DiscountType,
) -> Result<(), AppError> {
  let mut field_errors = Vec::new();
  if name.trim().is_empty() {
    field_errors.push("Gem name is required.".to_string());
  }
  if price_cents < 0 {
    field_errors.push("Price must not be negative.".to_string());
  }
  if stock_quantity < 0 {
    field_errors.push("Stock quantity must not be negative.".to_string());
  }
  if discount_value < 0 {
    field_errors.push("Discount must not be negative.".to_string());
  }
  if discount_type == DiscountType::Percentage && discount_value > 100 {
    field_errors.push("Percentage discount cannot exceed 100.".to_string());
  }
  if field_errors.is_empty() {
    Ok(())
  } else {
    Err(AppError::FieldValidation(field_errors))
  }
}

#[instrument(name = "catalog_service::list_gems", skip(pool, filter))]
pub async fn list_gems(pool: &PgPool, filter: &GemFilter) -> Result<(Vec<Gem>, Pagination), AppError> {
  let (page, limit, offset) = page_window(filter.page, filter.limit);

  let total_items: i64 = sqlx::query_scalar(
    "SELECT COUNT(*) FROM gems
     WHERE ($1::text IS NULL OR category = $1)
       AND ($2::bool IS NULL OR is_available = $2)",
  )
  .bind(&filter.category)
  .bind(filter.available)
  .fetch_one(pool)
  .await?;

  let gems: Vec<Gem> = sqlx::query_as(&format!(
    "SELECT {GEM_COLUMNS} FROM gems
     WHERE ($1::text IS NULL OR category = $1)
       AND ($2::bool IS NULL OR is_available = $2)
     ORDER BY created_at DESC
     LIMIT $3 OFFSET $4"
  ))
  .bind(&filter.category)
  .bind(filter.available)
  .bind(limit)
  .bind(offset)
  .fetch_all(pool)
  .await?;

  info!("Fetched {} gems (page {}, total {}).", gems.len(), page, total_items);
  Ok((gems, Pagination::new(page, limit, total_items)))
}

#[instrument(name = "catalog_service::get_gem", skip(pool), fields(gem_id = %gem_id))]
pub async fn get_gem(pool: &PgPool, gem_id: Uuid) -> Result<Gem, AppError> {
  let gem: Option<Gem> = sqlx::query_as(&format!("SELECT {GEM_COLUMNS} FROM gems WHERE id = $1"))
    .bind(gem_id)
    .fetch_optional(pool)
    .await?;

  gem.ok_or_else(|| {
    warn!("Gem {} not found.", gem_id);
    AppError::NotFound(format!("Gem with ID {} not found.", gem_id))
  })
}

#[instrument(name = "catalog_service::create_gem", skip(pool, new_gem), fields(name = %new_gem.name))]
pub async fn create_gem(pool: &PgPool, new_gem: NewGem) -> Result<Gem, AppError> {
  let discount_type = new_gem.discount_type.unwrap_or(DiscountType::Fixed);
  validate_gem_fields(
    &new_gem.name,
    new_gem.price_cents,
    new_gem.stock_quantity,
    new_gem.discount_value,
    discount_type,
  )?;

  let gem: Gem = sqlx::query_as(&format!(
    "INSERT INTO gems (name, category, description, price_cents, discount_value, discount_type,
                       stock_quantity, is_available, images, certification, origin, audience_tags, benefit_tags)
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
     RETURNING {GEM_COLUMNS}"
  ))
  .bind(new_gem.name.trim())
  .bind(&new_gem.category)
  .bind(&new_gem.description)
  .bind(new_gem.price_cents)
  .bind(new_gem.discount_value)
  .bind(discount_type)
  .bind(new_gem.stock_quantity)
  .bind(new_gem.is_available)
  .bind(&new_gem.images)
  .bind(&new_gem.certification)
  .bind(&new_gem.origin)
  .bind(&new_gem.audience_tags)
  .bind(&new_gem.benefit_tags)
  .fetch_one(pool)
  .await?;

  info!("Gem created: ID={}, name={}.", gem.id, gem.name);
  Ok(gem)
}

#[instrument(name = "catalog_service::update_gem", skip(pool, update), fields(gem_id = %gem_id))]
pub async fn update_gem(pool: &PgPool, gem_id: Uuid, update: GemUpdate) -> Result<Gem, AppError> {
  // Read-modify-write keeps the partial-update logic in one place; catalog
  // edits are an admin operation and do not contend with checkout, which
  // adjusts stock only through atomic conditional updates.
  let current = get_gem(pool, gem_id).await?;

  let name = update.name.unwrap_or(current.name);
  let category = update.category.unwrap_or(current.category);
  let description = update.description.or(current.description);
  let price_cents = update.price_cents.unwrap_or(current.price_cents);
  let discount_value = update.discount_value.unwrap_or(current.discount_value);
  let discount_type = update.discount_type.unwrap_or(current.discount_type);
  let stock_quantity = update.stock_quantity.unwrap_or(current.stock_quantity);
  let is_available = update.is_available.unwrap_or(current.is_available);
  let images = update.images.unwrap_or(current.images);
  let certification = update.certification.or(current.certification);
  let origin = update.origin.or(current.origin);
  let audience_tags = update.audience_tags.unwrap_or(current.audience_tags);
  let benefit_tags = update.benefit_tags.unwrap_or(current.benefit_tags);

  validate_gem_fields(&name, price_cents, stock_quantity, discount_value, discount_type)?;

  let gem: Gem = sqlx::query_as(&format!(
    "UPDATE gems
     SET name = $2, category = $3, description = $4, price_cents = $5, discount_value = $6,
         discount_type = $7, stock_quantity = $8, is_available = $9, images = $10,
         certification = $11, origin = $12, audience_tags = $13, benefit_tags = $14, updated_at = NOW()
     WHERE id = $1
     RETURNING {GEM_COLUMNS}"
  ))
  .bind(gem_id)
  .bind(name.trim())
  .bind(&category)
  .bind(&description)
  .bind(price_cents)
  .bind(discount_value)
  .bind(discount_type)
  .bind(stock_quantity)
  .bind(is_available)
  .bind(&images)
  .bind(&certification)
  .bind(&origin)
  .bind(&audience_tags)
  .bind(&benefit_tags)
  .fetch_one(pool)
  .await?;

  info!("Gem {} updated.", gem_id);
  Ok(gem)
}

#[instrument(name = "catalog_service::delete_gem", skip(pool), fields(gem_id = %gem_id))]
pub async fn delete_gem(pool: &PgPool, gem_id: Uuid) -> Result<(), AppError> {
  // order_items.gem_id is ON DELETE SET NULL, so order history survives.
  let result = sqlx::query("DELETE FROM gems WHERE id = $1").bind(gem_id).execute(pool).await?;
  if result.rows_affected() == 0 {
    warn!("Delete requested for missing gem {}.", gem_id);
    return Err(AppError::NotFound(format!("Gem with ID {} not found.", gem_id)));
  }
  info!("Gem {} deleted.", gem_id);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gem_validation_rejects_blank_name_and_oversized_percentage() {
    let err = validate_gem_fields("  ", -1, -2, 150, DiscountType::Percentage).unwrap_err();
    match err {
      AppError::FieldValidation(errors) => {
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("Percentage discount")));
      }
      other => panic!("expected FieldValidation, got {other:?}"),
    }
  }

  #[test]
  fn gem_validation_accepts_a_sane_gem() {
    assert!(validate_gem_fields("Ruby", 10_000, 3, 10, DiscountType::Percentage).is_ok());
  }
}
