// kirana/src/checkout/placement.rs

//! Order placement, expressed as a [`Flow`] over [`CheckoutData`].

use super::cart::Cart;
use super::payment::{PaymentGateway, PaymentRequest};
use crate::config::{FeeSchedule, MarketConfig};
use crate::error::{KiranaError, KiranaResult};
use crate::flow::{Flow, FlowData, FlowOutcome, SkipCondition, StepControl};
use crate::geo::GeoPoint;
use crate::lifecycle::{FulfillmentMode, OrderStatus, PaymentStatus};
use crate::model::{DeliveryFee, DeliverySchedule, LineItem, Money, Order, PaymentSplit, Store};
use crate::repository::MarketRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleRequest {
  #[default]
  Instant,
  At { at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentChoice {
  PayNow { reference: Option<String> },
  /// Only for scheduled orders; the order waits as payment-pending.
  PayLater,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  pub customer_id: Uuid,
  pub cart: Cart,
  pub fulfillment: FulfillmentMode,
  #[serde(default)]
  pub schedule: ScheduleRequest,
  pub delivery_address: Option<String>,
  pub customer_location: Option<GeoPoint>,
  pub payment: PaymentChoice,
}

/// State threaded through the placement steps.
#[derive(Debug)]
pub struct CheckoutData {
  pub request: CheckoutRequest,
  pub store: Option<Store>,
  pub items: Vec<LineItem>,
  pub total: Money,
  pub delivery_address: Option<String>,
  pub customer_location: Option<GeoPoint>,
  pub schedule: DeliverySchedule,
  pub payment_split: Option<PaymentSplit>,
  pub payment_status: PaymentStatus,
  pub payment_reference: Option<String>,
  pub order: Option<Order>,
}

impl CheckoutData {
  pub fn new(request: CheckoutRequest) -> Self {
    CheckoutData {
      request,
      store: None,
      items: Vec::new(),
      total: Money::ZERO,
      delivery_address: None,
      customer_location: None,
      schedule: DeliverySchedule::Instant,
      payment_split: None,
      payment_status: PaymentStatus::Pending,
      payment_reference: None,
      order: None,
    }
  }
}

pub const STEP_VALIDATE_CART: &str = "validate_cart";
pub const STEP_SNAPSHOT_ITEMS: &str = "snapshot_line_items";
pub const STEP_RESOLVE_FULFILLMENT: &str = "resolve_fulfillment";
pub const STEP_RESOLVE_SCHEDULE: &str = "resolve_schedule";
pub const STEP_PAYMENT_SPLIT: &str = "compute_payment_split";
pub const STEP_CONFIRM_PAYMENT: &str = "confirm_payment";
pub const STEP_PERSIST: &str = "persist_order";

/// Places orders against one repository and payment gateway.
pub struct Checkout {
  flow: Flow<CheckoutData, KiranaError>,
}

impl Checkout {
  pub fn new(repo: Arc<dyn MarketRepository>, payments: Arc<dyn PaymentGateway>, config: &MarketConfig) -> Self {
    let pickup_only: SkipCondition<CheckoutData> =
      Arc::new(|data: &FlowData<CheckoutData>| data.read().request.fulfillment == FulfillmentMode::Pickup);

    let mut flow: Flow<CheckoutData, KiranaError> = Flow::new(&[
      (STEP_VALIDATE_CART, false, None),
      (STEP_SNAPSHOT_ITEMS, false, None),
      (STEP_RESOLVE_FULFILLMENT, false, Some(pickup_only)),
      (STEP_RESOLVE_SCHEDULE, false, None),
      (STEP_PAYMENT_SPLIT, true, None),
      (STEP_CONFIRM_PAYMENT, false, None),
      (STEP_PERSIST, false, None),
    ]);

    let r = repo.clone();
    flow.on(STEP_VALIDATE_CART, move |data| validate_cart(r.clone(), data));
    let r = repo.clone();
    flow.on(STEP_SNAPSHOT_ITEMS, move |data| snapshot_line_items(r.clone(), data));
    flow.on(STEP_RESOLVE_FULFILLMENT, |data| async move { resolve_fulfillment(&data) });
    let lead = config.scheduled_payment_lead;
    flow.on(STEP_RESOLVE_SCHEDULE, move |data| async move { resolve_schedule(&data, lead) });
    let fees = config.fees;
    if !fees.is_empty() {
      flow.on(STEP_PAYMENT_SPLIT, move |data| async move { compute_payment_split(&data, fees) });
    }
    flow.on(STEP_CONFIRM_PAYMENT, move |data| confirm_payment(payments.clone(), data));
    flow.on(STEP_PERSIST, move |data| persist_order(repo.clone(), data));

    Checkout { flow }
  }

  /// Runs the placement steps. Nothing is stored unless every step succeeds.
  #[instrument(name = "Checkout::place", skip(self, request), fields(customer_id = %request.customer_id), err(Display))]
  pub async fn place(&self, request: CheckoutRequest) -> KiranaResult<Order> {
    let data = FlowData::new(CheckoutData::new(request));
    match self.flow.run(data.clone()).await? {
      FlowOutcome::Completed => {}
      FlowOutcome::Stopped => return Err(KiranaError::Configuration("checkout stopped before storing the order".into())),
    }
    let order = data.write().order.take();
    order.ok_or_else(|| KiranaError::Configuration("checkout completed without an order".into()))
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.flow.step_names()
  }
}

async fn validate_cart(repo: Arc<dyn MarketRepository>, data: FlowData<CheckoutData>) -> KiranaResult<StepControl> {
  let (store_id, lines) = {
    let d = data.read();
    (d.request.cart.store_id, d.request.cart.lines.clone())
  };
  if lines.is_empty() {
    return Err(KiranaError::EmptyCart);
  }
  let store_id = store_id.ok_or(KiranaError::MissingStore)?;
  if let Some(stray) = lines.iter().find(|l| l.store_id != store_id) {
    return Err(KiranaError::MixedStores {
      expected: store_id,
      found: stray.store_id,
    });
  }
  let store = repo
    .store(store_id)
    .await?
    .ok_or_else(|| KiranaError::not_found("store", store_id))?;
  data.write().store = Some(store);
  Ok(StepControl::Continue)
}

/// Copies current listing prices into the order. They are never re-read.
async fn snapshot_line_items(repo: Arc<dyn MarketRepository>, data: FlowData<CheckoutData>) -> KiranaResult<StepControl> {
  let (store_id, lines) = {
    let d = data.read();
    (d.store.as_ref().map(|s| s.id), d.request.cart.lines.clone())
  };
  let store_id = store_id.ok_or(KiranaError::MissingStore)?;

  let mut items = Vec::with_capacity(lines.len());
  for line in lines {
    let invalid = |reason: &str| KiranaError::InvalidLineItem {
      product_id: line.inventory_item_id.to_string(),
      reason: reason.to_string(),
    };
    if line.quantity == 0 {
      return Err(invalid("quantity must be at least 1"));
    }
    let item = match repo.inventory_item(line.inventory_item_id).await? {
      Some(item) if item.store_id == store_id => item,
      _ => return Err(invalid("not listed by this store")),
    };
    if !item.offered {
      return Err(invalid("not currently offered"));
    }
    let unit_price = item
      .price_for(line.variant.as_deref())
      .ok_or_else(|| invalid("variant not offered"))?;
    items.push(LineItem {
      product_id: item.product_id.clone(),
      name: item.name.clone(),
      variant: line.variant.clone(),
      quantity: line.quantity,
      unit_price,
      catalog_item_id: Some(item.id.to_string()),
    });
  }

  let total: Money = items.iter().map(LineItem::line_total).sum();
  debug!(lines = items.len(), %total, "Line items snapshotted.");
  let mut d = data.write();
  d.items = items;
  d.total = total;
  Ok(StepControl::Continue)
}

fn resolve_fulfillment(data: &FlowData<CheckoutData>) -> KiranaResult<StepControl> {
  let mut d = data.write();
  let address = d
    .request
    .delivery_address
    .as_deref()
    .map(str::trim)
    .filter(|a| !a.is_empty())
    .map(str::to_string);
  let location = d.request.customer_location.filter(GeoPoint::is_valid);
  match (address, location) {
    (Some(address), Some(location)) => {
      d.delivery_address = Some(address);
      d.customer_location = Some(location);
      Ok(StepControl::Continue)
    }
    _ => Err(KiranaError::MissingDeliveryLocation),
  }
}

fn resolve_schedule(data: &FlowData<CheckoutData>, lead: Duration) -> KiranaResult<StepControl> {
  let mut d = data.write();
  let now = Utc::now();
  let schedule = match d.request.schedule {
    ScheduleRequest::Instant => DeliverySchedule::Instant,
    ScheduleRequest::At { at } => {
      if at <= now {
        return Err(KiranaError::InvalidSchedule("scheduled time must be in the future".into()));
      }
      let lead = chrono::Duration::from_std(lead).map_err(|e| KiranaError::Configuration(e.to_string()))?;
      DeliverySchedule::Scheduled { at, pay_by: at - lead }
    }
  };
  if d.request.payment == PaymentChoice::PayLater {
    match schedule {
      DeliverySchedule::Instant => {
        return Err(KiranaError::InvalidSchedule(
          "pay later is only available for scheduled orders".into(),
        ))
      }
      DeliverySchedule::Scheduled { pay_by, .. } if pay_by <= now => {
        return Err(KiranaError::InvalidSchedule("slot is too close to pay later; pay now instead".into()))
      }
      DeliverySchedule::Scheduled { .. } => {}
    }
  }
  d.schedule = schedule;
  Ok(StepControl::Continue)
}

fn compute_payment_split(data: &FlowData<CheckoutData>, fees: FeeSchedule) -> KiranaResult<StepControl> {
  let mut d = data.write();
  let delivery_fee = match d.request.fulfillment {
    FulfillmentMode::Delivery => fees.delivery_fee.map(|amount| DeliveryFee {
      amount,
      payee: fees.delivery_fee_payee,
    }),
    FulfillmentMode::Pickup => None,
  };
  d.payment_split = Some(PaymentSplit {
    store_amount: d.total,
    platform_fee: fees.platform_fee,
    delivery_fee,
  });
  Ok(StepControl::Continue)
}

async fn confirm_payment(payments: Arc<dyn PaymentGateway>, data: FlowData<CheckoutData>) -> KiranaResult<StepControl> {
  let (choice, request) = {
    let d = data.read();
    let surcharge = d.payment_split.map(|s| s.surcharge()).unwrap_or(Money::ZERO);
    let store = d.store.as_ref().ok_or(KiranaError::MissingStore)?;
    let reference = match &d.request.payment {
      PaymentChoice::PayNow { reference } => reference.clone(),
      PaymentChoice::PayLater => None,
    };
    (
      d.request.payment.clone(),
      PaymentRequest {
        customer_id: d.request.customer_id,
        store_id: store.id,
        amount: d.total + surcharge,
        reference,
        payee_account: store.payment_id.clone(),
      },
    )
  };

  if choice == PaymentChoice::PayLater {
    data.write().payment_status = PaymentStatus::Pending;
    return Ok(StepControl::Continue);
  }

  let receipt = payments
    .confirm(&request)
    .await
    .map_err(|e| KiranaError::PaymentFailed(e.to_string()))?;
  info!(reference = %receipt.reference, amount = %request.amount, "Payment confirmed.");
  let mut d = data.write();
  d.payment_status = PaymentStatus::Paid;
  d.payment_reference = Some(receipt.reference);
  Ok(StepControl::Continue)
}

async fn persist_order(repo: Arc<dyn MarketRepository>, data: FlowData<CheckoutData>) -> KiranaResult<StepControl> {
  let order = {
    let d = data.read();
    let store = d.store.as_ref().ok_or(KiranaError::MissingStore)?;
    Order {
      id: Uuid::new_v4(),
      created_at: Utc::now(),
      items: d.items.clone(),
      total: d.total,
      status: OrderStatus::Placed,
      payment_status: d.payment_status,
      fulfillment: d.request.fulfillment,
      delivery: d.schedule,
      delivery_address: d.delivery_address.clone(),
      store_id: store.id,
      customer_id: d.request.customer_id,
      store_location: store.location,
      customer_location: d.customer_location.or(d.request.customer_location),
      payment_split: d.payment_split,
      version: 0,
    }
  };
  if let Err(e) = repo.insert_order(&order).await {
    if let Some(reference) = data.read().payment_reference.as_deref() {
      error!(
        error = %e,
        payment_reference = reference,
        amount = %order.total,
        customer_id = %order.customer_id,
        "Payment taken but the order was not stored; the receipt needs reconciliation."
      );
    }
    return Err(e);
  }
  info!(order_id = %order.id, store_id = %order.store_id, total = %order.total, "Order placed.");
  data.write().order = Some(order);
  Ok(StepControl::Continue)
}
