// gemstore/src/models/gem.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "discount_type_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
  Percentage,
  Fixed,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Gem {
  pub id: Uuid,
  pub name: String,
  pub category: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub discount_value: i64,
  pub discount_type: DiscountType,
  pub stock_quantity: i32,
  pub is_available: bool,
  pub images: Vec<String>,
  pub certification: Option<String>,
  pub origin: Option<String>,
  pub audience_tags: Vec<String>,
  pub benefit_tags: Vec<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Gem {
  /// Unit price after applying the gem's own discount, clamped at zero.
  ///
  /// This is the only price the order workflow trusts; client-supplied
  /// prices are ignored.
  pub fn effective_price_cents(&self) -> i64 {
    effective_price_cents(self.price_cents, self.discount_value, self.discount_type)
  }
}

pub fn effective_price_cents(price_cents: i64, discount_value: i64, discount_type: DiscountType) -> i64 {
  let discounted = match discount_type {
    DiscountType::Percentage => price_cents - price_cents * discount_value / 100,
    DiscountType::Fixed => price_cents - discount_value,
  };
  discounted.max(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percentage_discount_is_applied_to_the_list_price() {
    assert_eq!(effective_price_cents(10_000, 10, DiscountType::Percentage), 9_000);
    assert_eq!(effective_price_cents(10_000, 0, DiscountType::Percentage), 10_000);
  }

  #[test]
  fn fixed_discount_is_subtracted_in_cents() {
    assert_eq!(effective_price_cents(10_000, 2_500, DiscountType::Fixed), 7_500);
  }

  #[test]
  fn effective_price_never_goes_negative() {
    assert_eq!(effective_price_cents(1_000, 5_000, DiscountType::Fixed), 0);
    assert_eq!(effective_price_cents(1_000, 150, DiscountType::Percentage), 0);
  }
}
