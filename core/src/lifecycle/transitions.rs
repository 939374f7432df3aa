// kirana/src/lifecycle/transitions.rs

//! The permitted status transition table, per fulfilment mode.

use super::status::{FulfillmentMode, OrderStatus};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
  #[error("Order is already {from}; no further transitions are allowed")]
  Terminal { from: OrderStatus },

  #[error("Order status '{from}' is not recognised and cannot be changed")]
  UnknownState { from: OrderStatus },

  #[error("Cannot move a {mode} order from {from} to {to}")]
  NotPermitted {
    from: OrderStatus,
    to: OrderStatus,
    mode: FulfillmentMode,
  },
}

/// Every status reachable from `from` in one write.
pub fn allowed_transitions(mode: FulfillmentMode, from: OrderStatus) -> &'static [OrderStatus] {
  use FulfillmentMode::*;
  use OrderStatus::*;

  match (mode, from) {
    (_, Placed) => &[Accepted, Preparing, Rejected, Cancelled],
    (_, Accepted) => &[Preparing, Rejected, Cancelled],
    (Delivery, Preparing) => &[OnTheWay, Cancelled],
    (Pickup, Preparing) => &[Ready, Cancelled],
    (Delivery, OnTheWay) => &[Delivered, Cancelled],
    (Pickup, Ready) => &[PickedUp, Cancelled],
    _ => &[],
  }
}

pub fn check_transition(mode: FulfillmentMode, from: OrderStatus, to: OrderStatus) -> Result<(), TransitionError> {
  if from.is_terminal() {
    return Err(TransitionError::Terminal { from });
  }
  if from == OrderStatus::Unrecognized {
    return Err(TransitionError::UnknownState { from });
  }
  if allowed_transitions(mode, from).contains(&to) {
    Ok(())
  } else {
    Err(TransitionError::NotPermitted { from, to, mode })
  }
}

/// The next forward (non-terminal-exit) step an owner would normally take.
pub fn next_forward(mode: FulfillmentMode, from: OrderStatus) -> Option<OrderStatus> {
  allowed_transitions(mode, from)
    .iter()
    .copied()
    .find(|s| !matches!(s, OrderStatus::Rejected | OrderStatus::Cancelled))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pickup_orders_never_go_on_the_way() {
    let err = check_transition(FulfillmentMode::Pickup, OrderStatus::Preparing, OrderStatus::OnTheWay).unwrap_err();
    assert!(matches!(err, TransitionError::NotPermitted { .. }));
  }

  #[test]
  fn reject_only_before_preparation() {
    assert!(check_transition(FulfillmentMode::Delivery, OrderStatus::Accepted, OrderStatus::Rejected).is_ok());
    assert!(check_transition(FulfillmentMode::Delivery, OrderStatus::Preparing, OrderStatus::Rejected).is_err());
  }

  #[test]
  fn next_forward_prefers_acceptance() {
    assert_eq!(
      next_forward(FulfillmentMode::Delivery, OrderStatus::Placed),
      Some(OrderStatus::Accepted)
    );
    assert_eq!(next_forward(FulfillmentMode::Pickup, OrderStatus::PickedUp), None);
  }
}
