// kirana/src/model/order.rs

use super::Money;
use crate::geo::GeoPoint;
use crate::lifecycle::{FulfillmentMode, OrderStatus, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One purchased line. Prices are copied from the catalog at checkout and
/// never re-read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
  pub product_id: String,
  pub name: String,
  pub variant: Option<String>,
  pub quantity: u32,
  pub unit_price: Money,
  pub catalog_item_id: Option<String>,
}

impl LineItem {
  pub fn line_total(&self) -> Money {
    self.unit_price * self.quantity
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum DeliverySchedule {
  Instant,
  Scheduled {
    at: DateTime<Utc>,
    #[serde(rename = "payBy")]
    pay_by: DateTime<Utc>,
  },
}

impl DeliverySchedule {
  pub fn is_scheduled(&self) -> bool {
    matches!(self, DeliverySchedule::Scheduled { .. })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeePayee {
  Store,
  Platform,
  DeliveryPartner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFee {
  pub amount: Money,
  pub payee: FeePayee,
}

/// Who is owed what for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSplit {
  pub store_amount: Money,
  pub platform_fee: Option<Money>,
  pub delivery_fee: Option<DeliveryFee>,
}

impl PaymentSplit {
  /// What the customer pays on top of the item total.
  pub fn surcharge(&self) -> Money {
    self.platform_fee.unwrap_or(Money::ZERO) + self.delivery_fee.map(|f| f.amount).unwrap_or(Money::ZERO)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub created_at: DateTime<Utc>,
  pub items: Vec<LineItem>,
  pub total: Money,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub fulfillment: FulfillmentMode,
  pub delivery: DeliverySchedule,
  pub delivery_address: Option<String>,
  pub store_id: Uuid,
  pub customer_id: Uuid,
  pub store_location: Option<GeoPoint>,
  pub customer_location: Option<GeoPoint>,
  pub payment_split: Option<PaymentSplit>,
  /// Bumped on every status or payment write; writers compare-and-set on it.
  #[serde(default)]
  pub version: u64,
}

impl Order {
  pub fn items_total(&self) -> Money {
    self.items.iter().map(LineItem::line_total).sum()
  }

  pub fn is_awaiting_payment(&self) -> bool {
    self.payment_status == PaymentStatus::Pending
  }
}
