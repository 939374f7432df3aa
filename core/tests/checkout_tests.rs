// tests/checkout_tests.rs
mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::*;
use kirana::checkout::CartLine;
use kirana::lifecycle::{OrderStatus, PaymentStatus};
use kirana::model::{DeliverySchedule, FeePayee, ListingUpdate};
use kirana::{
  AccountMode, Cart, Checkout, FeeSchedule, KiranaError, MarketConfig, MarketContext, MarketRepository, MemoryRepository,
  Money, PaymentChoice, Role, ScheduleRequest,
};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn market() -> MarketContext {
  MarketContext::in_memory(MarketConfig::default(), Arc::new(ApprovingGateway::default()))
}

#[tokio::test]
#[serial]
async fn test_total_is_sum_of_line_items() {
  setup_tracing();
  let ctx = market();
  let repo = ctx.repository(AccountMode::Live);
  let store = seed_store(repo.as_ref(), Uuid::new_v4()).await;
  let rice = seed_item(repo.as_ref(), &store, "Rice 1kg", 72, 10).await;
  let dal = seed_item(repo.as_ref(), &store, "Toor Dal", 135, 10).await;

  let request = delivery_request(Uuid::new_v4(), cart_of(vec![line(&rice, 2), line(&dal, 1)]));
  let order = ctx.checkout(AccountMode::Live).place(request).await.unwrap();

  assert_eq!(order.total, Money::from_rupees(72 * 2 + 135));
  assert_eq!(order.total, order.items_total());
  assert_eq!(order.status, OrderStatus::Placed);
  assert_eq!(order.payment_status, PaymentStatus::Paid);
  assert_eq!(order.store_location, store.location);
  assert_eq!(order.delivery_address.as_deref(), Some("Flat 4B, Indiranagar"));
}

#[tokio::test]
#[serial]
async fn test_line_prices_are_snapshotted() {
  setup_tracing();
  let ctx = market();
  let repo = ctx.repository(AccountMode::Live);
  let store = seed_store(repo.as_ref(), Uuid::new_v4()).await;
  let oil = seed_item(repo.as_ref(), &store, "Groundnut Oil", 190, 5).await;

  let order = ctx
    .checkout(AccountMode::Live)
    .place(delivery_request(Uuid::new_v4(), cart_of(vec![line(&oil, 1)])))
    .await
    .unwrap();

  let desk = ctx.inventory_desk(AccountMode::Live, store.id);
  desk.load().await.unwrap();
  desk
    .apply(
      oil.id,
      ListingUpdate {
        offered: true,
        sell_price: Money::from_rupees(210),
        reference_price: None,
        stock: 5,
      },
    )
    .await
    .unwrap();

  let stored = repo.order(order.id).await.unwrap().unwrap();
  assert_eq!(stored.items[0].unit_price, Money::from_rupees(190));
  assert_eq!(stored.total, Money::from_rupees(190));
}

#[tokio::test]
#[serial]
async fn test_empty_cart_is_rejected() {
  setup_tracing();
  let ctx = market();
  let mut request = delivery_request(Uuid::new_v4(), Cart::new());
  request.cart.store_id = Some(Uuid::new_v4());
  let err = ctx.checkout(AccountMode::Live).place(request).await.unwrap_err();
  assert!(matches!(err, KiranaError::EmptyCart));
}

#[tokio::test]
#[serial]
async fn test_missing_store_selection_is_rejected() {
  setup_tracing();
  let ctx = market();
  let cart = Cart {
    store_id: None,
    lines: vec![CartLine {
      store_id: Uuid::new_v4(),
      inventory_item_id: Uuid::new_v4(),
      variant: None,
      quantity: 1,
    }],
  };
  let err = ctx
    .checkout(AccountMode::Live)
    .place(delivery_request(Uuid::new_v4(), cart))
    .await
    .unwrap_err();
  assert!(matches!(err, KiranaError::MissingStore));
}

#[tokio::test]
#[serial]
async fn test_cart_spanning_two_stores_is_rejected() {
  setup_tracing();
  let ctx = market();
  let repo = ctx.repository(AccountMode::Live);
  let a = seed_store(repo.as_ref(), Uuid::new_v4()).await;
  let b = seed_store(repo.as_ref(), Uuid::new_v4()).await;
  let from_a = seed_item(repo.as_ref(), &a, "Bread", 40, 3).await;
  let from_b = seed_item(repo.as_ref(), &b, "Eggs", 84, 3).await;

  let cart = Cart {
    store_id: Some(a.id),
    lines: vec![line(&from_a, 1), line(&from_b, 1)],
  };
  let err = ctx
    .checkout(AccountMode::Live)
    .place(delivery_request(Uuid::new_v4(), cart))
    .await
    .unwrap_err();
  assert!(matches!(err, KiranaError::MixedStores { expected, found } if expected == a.id && found == b.id));
}

#[tokio::test]
#[serial]
async fn test_payment_failure_creates_no_order() {
  setup_tracing();
  let repo = Arc::new(MemoryRepository::new(kirana::ChangeHub::new()));
  let store = seed_store(repo.as_ref(), Uuid::new_v4()).await;
  let item = seed_item(repo.as_ref(), &store, "Paneer 200g", 90, 4).await;
  let checkout = Checkout::new(repo.clone(), Arc::new(DecliningGateway), &MarketConfig::default());
  let customer = Uuid::new_v4();

  let err = checkout
    .place(delivery_request(customer, cart_of(vec![line(&item, 1)])))
    .await
    .unwrap_err();

  assert!(matches!(err, KiranaError::PaymentFailed(ref msg) if msg.contains("declined")));
  assert!(repo.all_orders().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_failed_insert_after_payment_returns_error_and_stores_nothing() {
  setup_tracing();
  let memory = Arc::new(MemoryRepository::new(kirana::ChangeHub::new()));
  let store = seed_store(memory.as_ref(), Uuid::new_v4()).await;
  let item = seed_item(memory.as_ref(), &store, "Ghee 500ml", 320, 3).await;
  let flaky = Arc::new(FlakyRepository::new(memory.clone()));
  let gateway = Arc::new(ApprovingGateway::default());
  let checkout = Checkout::new(flaky.clone(), gateway.clone(), &MarketConfig::default());

  flaky.set_failing(true);
  let err = checkout
    .place(delivery_request(Uuid::new_v4(), cart_of(vec![line(&item, 1)])))
    .await
    .unwrap_err();

  assert!(matches!(err, KiranaError::Backend { .. }));
  assert_eq!(gateway.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
  assert!(memory.all_orders().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_delivery_requires_address_and_coordinates_but_pickup_does_not() {
  setup_tracing();
  let ctx = market();
  let repo = ctx.repository(AccountMode::Live);
  let store = seed_store(repo.as_ref(), Uuid::new_v4()).await;
  let item = seed_item(repo.as_ref(), &store, "Curd", 35, 8).await;
  let customer = Uuid::new_v4();

  let mut request = delivery_request(customer, cart_of(vec![line(&item, 1)]));
  request.delivery_address = Some("   ".into());
  let err = ctx.checkout(AccountMode::Live).place(request).await.unwrap_err();
  assert!(matches!(err, KiranaError::MissingDeliveryLocation));

  let pickup = ctx
    .checkout(AccountMode::Live)
    .place(pickup_request(customer, cart_of(vec![line(&item, 1)])))
    .await
    .unwrap();
  assert_eq!(pickup.fulfillment, kirana::FulfillmentMode::Pickup);
  assert!(pickup.delivery_address.is_none());
}

#[tokio::test]
#[serial]
async fn test_unoffered_item_cannot_be_bought() {
  setup_tracing();
  let ctx = market();
  let repo = ctx.repository(AccountMode::Live);
  let store = seed_store(repo.as_ref(), Uuid::new_v4()).await;
  let item = seed_item(repo.as_ref(), &store, "Ghee", 560, 2).await;
  let desk = ctx.inventory_desk(AccountMode::Live, store.id);
  desk.toggle(item.id).await.unwrap();

  let err = ctx
    .checkout(AccountMode::Live)
    .place(delivery_request(Uuid::new_v4(), cart_of(vec![line(&item, 1)])))
    .await
    .unwrap_err();
  assert!(matches!(err, KiranaError::InvalidLineItem { .. }));
}

#[tokio::test]
#[serial]
async fn test_fees_produce_payment_split_and_are_charged() {
  setup_tracing();
  let gateway = Arc::new(ApprovingGateway::default());
  let config = MarketConfig {
    fees: FeeSchedule {
      platform_fee: Some(Money::from_rupees(5)),
      delivery_fee: Some(Money::from_rupees(25)),
      delivery_fee_payee: FeePayee::DeliveryPartner,
    },
    ..MarketConfig::default()
  };
  let ctx = MarketContext::in_memory(config, gateway.clone());
  let repo = ctx.repository(AccountMode::Live);
  let store = seed_store(repo.as_ref(), Uuid::new_v4()).await;
  let item = seed_item(repo.as_ref(), &store, "Atta 5kg", 250, 3).await;

  let order = ctx
    .checkout(AccountMode::Live)
    .place(delivery_request(Uuid::new_v4(), cart_of(vec![line(&item, 1)])))
    .await
    .unwrap();

  let split = order.payment_split.unwrap();
  assert_eq!(split.store_amount, Money::from_rupees(250));
  assert_eq!(split.platform_fee, Some(Money::from_rupees(5)));
  assert_eq!(split.delivery_fee.map(|f| f.amount), Some(Money::from_rupees(25)));
  assert_eq!(order.total, Money::from_rupees(250));
  assert_eq!(*gateway.last_amount.lock(), Some(Money::from_rupees(280)));
}

#[tokio::test]
#[serial]
async fn test_scheduled_order_can_pay_later_with_deadline() {
  setup_tracing();
  let gateway = Arc::new(ApprovingGateway::default());
  let ctx = MarketContext::in_memory(MarketConfig::default(), gateway.clone());
  let repo = ctx.repository(AccountMode::Live);
  let store = seed_store(repo.as_ref(), Uuid::new_v4()).await;
  let item = seed_item(repo.as_ref(), &store, "Mangoes 1kg", 120, 6).await;
  let at = Utc::now() + ChronoDuration::hours(5);

  let mut request = delivery_request(Uuid::new_v4(), cart_of(vec![line(&item, 1)]));
  request.schedule = ScheduleRequest::At { at };
  request.payment = PaymentChoice::PayLater;
  let order = ctx.checkout(AccountMode::Live).place(request).await.unwrap();

  assert_eq!(order.payment_status, PaymentStatus::Pending);
  assert_eq!(
    order.delivery,
    DeliverySchedule::Scheduled {
      at,
      pay_by: at - ChronoDuration::minutes(60)
    }
  );
  assert_eq!(gateway.calls.load(std::sync::atomic::Ordering::SeqCst), 0);

  let mut instant = delivery_request(Uuid::new_v4(), cart_of(vec![line(&item, 1)]));
  instant.payment = PaymentChoice::PayLater;
  let err = ctx.checkout(AccountMode::Live).place(instant).await.unwrap_err();
  assert!(matches!(err, KiranaError::InvalidSchedule(_)));

  let mut past = delivery_request(Uuid::new_v4(), cart_of(vec![line(&item, 1)]));
  past.schedule = ScheduleRequest::At {
    at: Utc::now() - ChronoDuration::minutes(1),
  };
  let err = ctx.checkout(AccountMode::Live).place(past).await.unwrap_err();
  assert!(matches!(err, KiranaError::InvalidSchedule(_)));
}

#[tokio::test]
#[serial]
async fn test_checkout_of_120_rupees_reaches_store_owner_feed() {
  setup_tracing();
  let ctx = market();
  let repo = ctx.repository(AccountMode::Live);
  let owner = Uuid::new_v4();
  let store = seed_store(repo.as_ref(), owner).await;
  let milk = seed_item(repo.as_ref(), &store, "Milk 1L", 60, 10).await;

  let owner_session = ctx.open_session(owner, Role::StoreOwner, AccountMode::Live).await.unwrap();
  let mut feed = ctx.watch_orders(&owner_session).await.unwrap();
  assert!(feed.current().orders.is_empty());

  let customer = Uuid::new_v4();
  let order = ctx
    .checkout(AccountMode::Live)
    .place(delivery_request(customer, cart_of(vec![line(&milk, 2)])))
    .await
    .unwrap();
  assert_eq!(order.total, Money::from_rupees(120));
  assert_eq!(order.total.to_string(), "₹120.00");

  let snapshot = tokio::time::timeout(Duration::from_secs(2), feed.changed())
    .await
    .expect("no notification within one cycle")
    .expect("feed closed");
  assert_eq!(snapshot.orders.len(), 1);
  assert_eq!(snapshot.orders[0].id, order.id);
  assert_eq!(snapshot.orders[0].status, OrderStatus::Placed);
  assert_eq!(snapshot.orders[0].total, Money::from_rupees(120));
}
