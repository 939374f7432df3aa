// tests/lifecycle_tests.rs
mod common;

use common::*;
use kirana::lifecycle::{
  check_transition, demo_next, progress_fraction, progress_index, track, tracker_steps, FulfillmentMode, OrderStatus,
  PaymentStatus, TransitionError,
};
use kirana::{KiranaError, MarketContext, MarketConfig, OrderScope};
use serial_test::serial;
use std::sync::Arc;
use uuid::Uuid;

#[test]
fn test_preparing_delivery_order_is_one_third_along() {
  assert_eq!(progress_index(FulfillmentMode::Delivery, OrderStatus::Preparing), 1);
  let fraction = progress_fraction(FulfillmentMode::Delivery, OrderStatus::Preparing);
  assert!((fraction - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_unknown_and_off_tracker_statuses_render_at_start() {
  for status in [OrderStatus::Unrecognized, OrderStatus::Accepted, OrderStatus::Rejected, OrderStatus::Cancelled] {
    assert_eq!(progress_index(FulfillmentMode::Pickup, status), 0, "{status}");
    assert_eq!(progress_fraction(FulfillmentMode::Pickup, status), 0.0);
  }
  assert_eq!(OrderStatus::from_remote("teleported"), OrderStatus::Unrecognized);
}

#[test]
fn test_tracker_steps_per_mode() {
  assert_eq!(
    tracker_steps(FulfillmentMode::Delivery),
    &[OrderStatus::Placed, OrderStatus::Preparing, OrderStatus::OnTheWay, OrderStatus::Delivered]
  );
  assert_eq!(
    tracker_steps(FulfillmentMode::Pickup),
    &[OrderStatus::Placed, OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::PickedUp]
  );
  assert_eq!(progress_fraction(FulfillmentMode::Pickup, OrderStatus::PickedUp), 1.0);
}

#[test]
fn test_remote_spellings_normalise() {
  assert_eq!(OrderStatus::from_remote("Pending"), OrderStatus::Placed);
  assert_eq!(OrderStatus::from_remote("on_the_way"), OrderStatus::OnTheWay);
  assert_eq!(OrderStatus::from_remote("Picked Up"), OrderStatus::PickedUp);
  assert_eq!(OrderStatus::from_remote("Canceled"), OrderStatus::Cancelled);
  let json = serde_json::to_string(&OrderStatus::OnTheWay).unwrap();
  assert_eq!(json, "\"On the way\"");
  let back: OrderStatus = serde_json::from_str("\"Pending\"").unwrap();
  assert_eq!(back, OrderStatus::Placed);
}

#[test]
fn test_terminal_states_accept_no_transitions() {
  for from in [OrderStatus::Delivered, OrderStatus::PickedUp, OrderStatus::Rejected, OrderStatus::Cancelled] {
    let err = check_transition(FulfillmentMode::Delivery, from, OrderStatus::Cancelled).unwrap_err();
    assert_eq!(err, TransitionError::Terminal { from });
  }
}

#[test]
fn test_no_backward_or_skipping_transitions() {
  let mode = FulfillmentMode::Delivery;
  assert!(check_transition(mode, OrderStatus::OnTheWay, OrderStatus::Preparing).is_err());
  assert!(check_transition(mode, OrderStatus::Placed, OrderStatus::OnTheWay).is_err());
  assert!(check_transition(mode, OrderStatus::Placed, OrderStatus::Delivered).is_err());
  assert!(check_transition(mode, OrderStatus::Unrecognized, OrderStatus::Preparing).is_err());
  assert!(check_transition(mode, OrderStatus::Preparing, OrderStatus::Cancelled).is_ok());
}

async fn placed_order(ctx: &MarketContext, pay_later: bool) -> (kirana::Order, kirana::Store) {
  let repo = ctx.repository(kirana::AccountMode::Live);
  let store = seed_store(repo.as_ref(), Uuid::new_v4()).await;
  let item = seed_item(repo.as_ref(), &store, "Sugar 1kg", 48, 20).await;
  let mut request = delivery_request(Uuid::new_v4(), cart_of(vec![line(&item, 1)]));
  if pay_later {
    request.schedule = kirana::ScheduleRequest::At {
      at: chrono::Utc::now() + chrono::Duration::hours(4),
    };
    request.payment = kirana::PaymentChoice::PayLater;
  }
  let order = ctx.checkout(kirana::AccountMode::Live).place(request).await.unwrap();
  (order, store)
}

#[tokio::test]
#[serial]
async fn test_owner_walks_delivery_order_to_delivered() {
  setup_tracing();
  let ctx = MarketContext::in_memory(MarketConfig::default(), Arc::new(ApprovingGateway::default()));
  let (order, store) = placed_order(&ctx, false).await;
  let desk = ctx.order_desk(kirana::AccountMode::Live);

  let accepted = desk.accept(store.id, order.id, Some(order.version)).await.unwrap();
  assert_eq!(accepted.status, OrderStatus::Accepted);
  assert_eq!(accepted.version, order.version + 1);

  let mut seen = vec![accepted.status];
  let mut current = accepted;
  while let Ok(next) = desk.advance(store.id, current.id, Some(current.version)).await {
    seen.push(next.status);
    current = next;
  }
  assert_eq!(
    seen,
    vec![OrderStatus::Accepted, OrderStatus::Preparing, OrderStatus::OnTheWay, OrderStatus::Delivered]
  );
  let tracking = desk.track(OrderScope::Customer(order.customer_id), order.id).await.unwrap();
  assert_eq!(tracking.index, 3);
  assert!(tracking.steps.iter().all(|s| s.reached));
}

#[tokio::test]
#[serial]
async fn test_stale_version_is_rejected_without_writing() {
  setup_tracing();
  let ctx = MarketContext::in_memory(MarketConfig::default(), Arc::new(ApprovingGateway::default()));
  let (order, store) = placed_order(&ctx, false).await;
  let desk = ctx.order_desk(kirana::AccountMode::Live);

  desk.accept(store.id, order.id, Some(order.version)).await.unwrap();
  let err = desk.reject(store.id, order.id, Some(order.version)).await.unwrap_err();

  assert!(matches!(err, KiranaError::VersionConflict { expected: 0, found: 1, .. }));
  let stored = desk.order(OrderScope::Store(store.id), order.id).await.unwrap();
  assert_eq!(stored.status, OrderStatus::Accepted);
}

#[tokio::test]
#[serial]
async fn test_payment_pending_order_cannot_progress_until_paid() {
  setup_tracing();
  let ctx = MarketContext::in_memory(MarketConfig::default(), Arc::new(ApprovingGateway::default()));
  let (order, store) = placed_order(&ctx, true).await;
  assert_eq!(order.payment_status, PaymentStatus::Pending);
  let desk = ctx.order_desk(kirana::AccountMode::Live);

  let err = desk.accept(store.id, order.id, None).await.unwrap_err();
  assert!(matches!(err, KiranaError::PaymentPending { .. }));
  assert!(track(&order).awaiting_payment);

  let paid = desk
    .confirm_payment(OrderScope::Customer(order.customer_id), order.id, Some("upi-123".into()))
    .await
    .unwrap();
  assert_eq!(paid.payment_status, PaymentStatus::Paid);
  let accepted = desk.accept(store.id, order.id, Some(paid.version)).await.unwrap();
  assert_eq!(accepted.status, OrderStatus::Accepted);
}

#[tokio::test]
#[serial]
async fn test_customer_may_only_cancel_a_placed_order() {
  setup_tracing();
  let ctx = MarketContext::in_memory(MarketConfig::default(), Arc::new(ApprovingGateway::default()));
  let (order, _store) = placed_order(&ctx, false).await;
  let desk = ctx.order_desk(kirana::AccountMode::Live);
  let customer = OrderScope::Customer(order.customer_id);

  let err = desk.transition(customer, order.id, None, OrderStatus::Accepted).await.unwrap_err();
  assert!(matches!(err, KiranaError::Transition(TransitionError::NotPermitted { .. })));

  let other_store = desk.reject(Uuid::new_v4(), order.id, None).await.unwrap_err();
  assert!(matches!(other_store, KiranaError::NotFound { .. }));

  let cancelled = desk.cancel(customer, order.id, None).await.unwrap();
  assert_eq!(cancelled.status, OrderStatus::Cancelled);
  assert!(track(&cancelled).halted);
  assert!(demo_next(&cancelled).is_none());
}
