// gemstore/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  /// Terminal states admit no further transitions.
  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
  }

  /// An order can be cancelled by its owner until it ships.
  pub fn can_cancel(&self) -> bool {
    matches!(self, OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing)
  }

  /// The closed transition table: a linear fulfilment progression, with
  /// cancellation reachable from any pre-shipping state.
  pub fn can_transition_to(&self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Pending, Confirmed)
        | (Confirmed, Processing)
        | (Processing, Shipped)
        | (Shipped, Delivered)
        | (Pending, Cancelled)
        | (Confirmed, Cancelled)
        | (Processing, Cancelled)
    )
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_method_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  Cod,
  Online,
  Card,
  Upi,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  /// Human-readable identifier, the only one exposed in URLs and payloads.
  pub order_number: String,
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub total_amount_cents: i64,
  pub payment_method: PaymentMethod,
  pub shipping_full_name: String,
  pub shipping_street: String,
  pub shipping_city: String,
  pub shipping_state: String,
  pub shipping_postal_code: String,
  pub shipping_country: String,
  pub shipping_phone: String,
  pub notes: Option<String>,
  pub tracking_number: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::OrderStatus::*;
  use super::*;

  const ALL: [OrderStatus; 6] = [Pending, Confirmed, Processing, Shipped, Delivered, Cancelled];

  #[test]
  fn fulfilment_progression_is_linear() {
    assert!(Pending.can_transition_to(Confirmed));
    assert!(Confirmed.can_transition_to(Processing));
    assert!(Processing.can_transition_to(Shipped));
    assert!(Shipped.can_transition_to(Delivered));

    // No skipping ahead, no moving backwards.
    assert!(!Pending.can_transition_to(Shipped));
    assert!(!Confirmed.can_transition_to(Delivered));
    assert!(!Shipped.can_transition_to(Processing));
    assert!(!Delivered.can_transition_to(Pending));
  }

  #[test]
  fn cancellation_is_only_reachable_before_shipping() {
    assert!(Pending.can_cancel());
    assert!(Confirmed.can_cancel());
    assert!(Processing.can_cancel());
    assert!(!Shipped.can_cancel());
    assert!(!Delivered.can_cancel());
    assert!(!Cancelled.can_cancel());
  }

  #[test]
  fn terminal_states_admit_no_transitions() {
    for from in [Delivered, Cancelled] {
      assert!(from.is_terminal());
      for to in ALL {
        assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
      }
    }
  }

  #[test]
  fn status_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Processing).unwrap(), "\"processing\"");
    assert_eq!(Cancelled.as_str(), "cancelled");
  }
}
