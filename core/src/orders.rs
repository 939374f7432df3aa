// kirana/src/orders.rs

//! Owner and customer actions on placed orders.

use crate::checkout::{PaymentGateway, PaymentRequest};
use crate::error::{KiranaError, KiranaResult};
use crate::lifecycle::{check_transition, next_forward, track, OrderStatus, PaymentStatus, Tracking, TransitionError};
use crate::model::{Money, Order};
use crate::repository::MarketRepository;
use crate::session::OrderScope;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Status writes are single compare-and-set writes keyed on the order's
/// version. Nothing is cached here: a failed write leaves the caller's last
/// fetched copy as the truth.
#[derive(Clone)]
pub struct OrderDesk {
  repo: Arc<dyn MarketRepository>,
  payments: Arc<dyn PaymentGateway>,
}

impl OrderDesk {
  pub fn new(repo: Arc<dyn MarketRepository>, payments: Arc<dyn PaymentGateway>) -> Self {
    OrderDesk { repo, payments }
  }

  pub async fn orders(&self, scope: OrderScope) -> KiranaResult<Vec<Order>> {
    self.repo.orders_for(scope).await
  }

  /// Orders outside `scope` are reported as missing.
  pub async fn order(&self, scope: OrderScope, id: Uuid) -> KiranaResult<Order> {
    match self.repo.order(id).await? {
      Some(order) if scope.matches(&order) => Ok(order),
      _ => Err(KiranaError::not_found("order", id)),
    }
  }

  /// Moves an order to `to`.
  ///
  /// `expected_version` is the version the caller last saw; a mismatch fails
  /// with `VersionConflict` before anything is written. Customers may only
  /// cancel an order that has not been picked up by the store yet.
  #[instrument(name = "OrderDesk::transition", skip(self), err(Display))]
  pub async fn transition(&self, scope: OrderScope, id: Uuid, expected_version: Option<u64>, to: OrderStatus) -> KiranaResult<Order> {
    let order = self.order(scope, id).await?;

    if let Some(expected) = expected_version {
      if expected != order.version {
        return Err(KiranaError::VersionConflict {
          order_id: id,
          expected,
          found: order.version,
        });
      }
    }

    if matches!(scope, OrderScope::Customer(_)) && !(to == OrderStatus::Cancelled && order.status == OrderStatus::Placed) {
      return Err(
        TransitionError::NotPermitted {
          from: order.status,
          to,
          mode: order.fulfillment,
        }
        .into(),
      );
    }

    check_transition(order.fulfillment, order.status, to)?;

    if order.is_awaiting_payment() && !matches!(to, OrderStatus::Rejected | OrderStatus::Cancelled) {
      return Err(KiranaError::PaymentPending { order_id: id });
    }

    let updated = self.repo.write_status(id, order.version, to).await.map_err(|e| {
      warn!(error = %e, "Status write failed; prior status stands.");
      e
    })?;
    info!(from = %order.status, to = %updated.status, version = updated.version, "Order status updated.");
    Ok(updated)
  }

  pub async fn accept(&self, store_id: Uuid, id: Uuid, expected_version: Option<u64>) -> KiranaResult<Order> {
    self.transition(OrderScope::Store(store_id), id, expected_version, OrderStatus::Accepted).await
  }

  /// Takes the next forward step for the order's fulfilment mode.
  pub async fn advance(&self, store_id: Uuid, id: Uuid, expected_version: Option<u64>) -> KiranaResult<Order> {
    let scope = OrderScope::Store(store_id);
    let order = self.order(scope, id).await?;
    let next = next_forward(order.fulfillment, order.status).ok_or(TransitionError::Terminal { from: order.status })?;
    self.transition(scope, id, expected_version, next).await
  }

  pub async fn reject(&self, store_id: Uuid, id: Uuid, expected_version: Option<u64>) -> KiranaResult<Order> {
    self.transition(OrderScope::Store(store_id), id, expected_version, OrderStatus::Rejected).await
  }

  pub async fn cancel(&self, scope: OrderScope, id: Uuid, expected_version: Option<u64>) -> KiranaResult<Order> {
    self.transition(scope, id, expected_version, OrderStatus::Cancelled).await
  }

  /// Collects payment for a payment-pending order, unlocking progression.
  /// Already-paid orders are returned unchanged.
  #[instrument(name = "OrderDesk::confirm_payment", skip(self, reference), err(Display))]
  pub async fn confirm_payment(&self, scope: OrderScope, id: Uuid, reference: Option<String>) -> KiranaResult<Order> {
    let order = self.order(scope, id).await?;
    if !order.is_awaiting_payment() {
      return Ok(order);
    }
    if order.status.is_terminal() {
      return Err(TransitionError::Terminal { from: order.status }.into());
    }

    let payee_account = self.repo.store(order.store_id).await?.and_then(|s| s.payment_id);
    let surcharge = order.payment_split.map(|s| s.surcharge()).unwrap_or(Money::ZERO);
    let request = PaymentRequest {
      customer_id: order.customer_id,
      store_id: order.store_id,
      amount: order.total + surcharge,
      reference,
      payee_account,
    };
    let receipt = self
      .payments
      .confirm(&request)
      .await
      .map_err(|e| KiranaError::PaymentFailed(e.to_string()))?;

    let updated = self.repo.write_payment_status(id, order.version, PaymentStatus::Paid).await?;
    info!(reference = %receipt.reference, "Pending order paid.");
    Ok(updated)
  }

  pub async fn track(&self, scope: OrderScope, id: Uuid) -> KiranaResult<Tracking> {
    Ok(track(&self.order(scope, id).await?))
  }
}
