// kirana/src/lifecycle/progress.rs

//! Customer-facing progress rendering and the demo progression rule.

use super::status::{FulfillmentMode, OrderStatus, PaymentStatus};
use crate::model::Order;
use serde::Serialize;

const DELIVERY_STEPS: [OrderStatus; 4] = [
  OrderStatus::Placed,
  OrderStatus::Preparing,
  OrderStatus::OnTheWay,
  OrderStatus::Delivered,
];

const PICKUP_STEPS: [OrderStatus; 4] = [
  OrderStatus::Placed,
  OrderStatus::Preparing,
  OrderStatus::Ready,
  OrderStatus::PickedUp,
];

pub fn tracker_steps(mode: FulfillmentMode) -> &'static [OrderStatus] {
  match mode {
    FulfillmentMode::Delivery => &DELIVERY_STEPS,
    FulfillmentMode::Pickup => &PICKUP_STEPS,
  }
}

/// Position of `status` in the tracker. Anything not on the tracker renders at 0.
pub fn progress_index(mode: FulfillmentMode, status: OrderStatus) -> usize {
  tracker_steps(mode).iter().position(|s| *s == status).unwrap_or(0)
}

/// `index / (steps - 1)`, in `0.0..=1.0`.
pub fn progress_fraction(mode: FulfillmentMode, status: OrderStatus) -> f64 {
  let steps = tracker_steps(mode);
  if steps.len() < 2 {
    return 0.0;
  }
  progress_index(mode, status) as f64 / (steps.len() - 1) as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStep {
  pub status: OrderStatus,
  pub label: &'static str,
  pub icon: &'static str,
  pub reached: bool,
}

/// Everything the customer tracking screen renders for one order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
  pub status: OrderStatus,
  pub headline: &'static str,
  pub steps: Vec<TrackingStep>,
  pub index: usize,
  pub fraction: f64,
  pub awaiting_payment: bool,
  pub halted: bool,
}

pub fn track(order: &Order) -> Tracking {
  let index = progress_index(order.fulfillment, order.status);
  let steps = tracker_steps(order.fulfillment)
    .iter()
    .enumerate()
    .map(|(i, status)| TrackingStep {
      status: *status,
      label: status.label(),
      icon: status.icon(),
      reached: i <= index,
    })
    .collect();

  Tracking {
    status: order.status,
    headline: order.status.label(),
    steps,
    index,
    fraction: progress_fraction(order.fulfillment, order.status),
    awaiting_payment: order.payment_status == PaymentStatus::Pending,
    halted: matches!(order.status, OrderStatus::Rejected | OrderStatus::Cancelled),
  }
}

/// The status a demo tick moves `order` to, if any.
///
/// Orders advance one tracker step per tick. Accepted orders move straight
/// to preparation. Payment-pending, halted, finished and unrecognised orders
/// never move.
pub fn demo_next(order: &Order) -> Option<OrderStatus> {
  if order.payment_status == PaymentStatus::Pending {
    return None;
  }
  if order.status.is_terminal() || order.status == OrderStatus::Unrecognized {
    return None;
  }
  if order.status == OrderStatus::Accepted {
    return Some(OrderStatus::Preparing);
  }
  let steps = tracker_steps(order.fulfillment);
  let current = steps.iter().position(|s| *s == order.status)?;
  steps.get(current + 1).copied()
}
