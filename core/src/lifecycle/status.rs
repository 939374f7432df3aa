// kirana/src/lifecycle/status.rs

//! The closed set of order, payment and fulfilment states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an order.
///
/// Remote rows spell these loosely (`"Pending"`, `"on_the_way"`,
/// `"Canceled"`); [`OrderStatus::from_remote`] normalises them. Anything
/// unknown becomes [`OrderStatus::Unrecognized`], which still renders (at the
/// first tracker step) but can never be transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum OrderStatus {
  Placed,
  Accepted,
  Preparing,
  OnTheWay,
  Ready,
  Delivered,
  PickedUp,
  Rejected,
  Cancelled,
  Unrecognized,
}

impl OrderStatus {
  pub fn from_remote(raw: &str) -> Self {
    let normalised: String = raw
      .trim()
      .chars()
      .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
      .collect();
    match normalised.as_str() {
      "pending" | "placed" => OrderStatus::Placed,
      "accepted" => OrderStatus::Accepted,
      "preparing" => OrderStatus::Preparing,
      "on the way" | "ontheway" => OrderStatus::OnTheWay,
      "ready" | "ready for pickup" => OrderStatus::Ready,
      "delivered" => OrderStatus::Delivered,
      "picked up" | "pickedup" => OrderStatus::PickedUp,
      "rejected" => OrderStatus::Rejected,
      "cancelled" | "canceled" => OrderStatus::Cancelled,
      _ => OrderStatus::Unrecognized,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Placed => "Placed",
      OrderStatus::Accepted => "Accepted",
      OrderStatus::Preparing => "Preparing",
      OrderStatus::OnTheWay => "On the way",
      OrderStatus::Ready => "Ready",
      OrderStatus::Delivered => "Delivered",
      OrderStatus::PickedUp => "Picked Up",
      OrderStatus::Rejected => "Rejected",
      OrderStatus::Cancelled => "Cancelled",
      OrderStatus::Unrecognized => "Unrecognized",
    }
  }

  /// No transition leaves a terminal state.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      OrderStatus::Delivered | OrderStatus::PickedUp | OrderStatus::Rejected | OrderStatus::Cancelled
    )
  }

  /// Customer-facing text for the tracking view.
  pub fn label(self) -> &'static str {
    match self {
      OrderStatus::Placed => "Order placed",
      OrderStatus::Accepted => "Accepted by the store",
      OrderStatus::Preparing => "Preparing your order",
      OrderStatus::OnTheWay => "On the way",
      OrderStatus::Ready => "Ready for pickup",
      OrderStatus::Delivered => "Delivered",
      OrderStatus::PickedUp => "Picked up",
      OrderStatus::Rejected => "Rejected by the store",
      OrderStatus::Cancelled => "Cancelled",
      OrderStatus::Unrecognized => "Status unavailable",
    }
  }

  pub fn icon(self) -> &'static str {
    match self {
      OrderStatus::Placed => "receipt",
      OrderStatus::Accepted => "check-circle",
      OrderStatus::Preparing => "package",
      OrderStatus::OnTheWay => "truck",
      OrderStatus::Ready => "shopping-bag",
      OrderStatus::Delivered => "home",
      OrderStatus::PickedUp => "hand",
      OrderStatus::Rejected => "x-circle",
      OrderStatus::Cancelled => "ban",
      OrderStatus::Unrecognized => "help-circle",
    }
  }
}

impl From<String> for OrderStatus {
  fn from(raw: String) -> Self {
    OrderStatus::from_remote(&raw)
  }
}

impl From<OrderStatus> for &'static str {
  fn from(status: OrderStatus) -> Self {
    status.as_str()
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
  #[serde(alias = "paid")]
  Paid,
  #[serde(alias = "pending")]
  Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FulfillmentMode {
  #[serde(alias = "delivery")]
  Delivery,
  #[serde(alias = "pickup")]
  Pickup,
}

impl fmt::Display for FulfillmentMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FulfillmentMode::Delivery => f.write_str("delivery"),
      FulfillmentMode::Pickup => f.write_str("pickup"),
    }
  }
}
