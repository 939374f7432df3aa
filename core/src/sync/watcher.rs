// kirana/src/sync/watcher.rs

use super::feed::{ChangeFilter, ChangeHub, SubscriptionHandle};
use crate::error::KiranaResult;
use crate::model::Order;
use crate::repository::MarketRepository;
use crate::session::OrderScope;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn, Instrument};

/// The whole order set for one identity, replaced wholesale on every change.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OrderSnapshot {
  pub orders: Vec<Order>,
  /// Increments on every successful re-fetch.
  pub revision: u64,
}

/// Keeps an [`OrderSnapshot`] current for one scope.
///
/// Any change event matching the scope triggers a full re-fetch; there is no
/// incremental merge. A failed re-fetch keeps the previous snapshot. Dropping
/// the watcher removes its subscription.
pub struct OrderWatcher {
  scope: OrderScope,
  rx: watch::Receiver<OrderSnapshot>,
  task: JoinHandle<()>,
  _subscription: SubscriptionHandle,
}

impl OrderWatcher {
  #[instrument(name = "OrderWatcher::start", skip(repo, hub), err(Display))]
  pub async fn start(repo: Arc<dyn MarketRepository>, hub: &ChangeHub, scope: OrderScope) -> KiranaResult<Self> {
    // Subscribe before the first fetch so no write between the two is missed.
    let mut subscription = hub.subscribe(ChangeFilter::orders(scope));
    let handle = subscription.handle();
    let initial = OrderSnapshot {
      orders: repo.orders_for(scope).await?,
      revision: 0,
    };
    info!(orders = initial.orders.len(), "Order watcher started.");
    let (tx, rx) = watch::channel(initial);

    let task = tokio::spawn(
      async move {
        let mut revision = 0;
        while subscription.recv().await.is_some() {
          let coalesced = subscription.drain();
          match repo.orders_for(scope).await {
            Ok(orders) => {
              revision += 1;
              debug!(revision, coalesced, orders = orders.len(), "Order set re-fetched.");
              if tx.send(OrderSnapshot { orders, revision }).is_err() {
                break;
              }
            }
            Err(e) => warn!(error = %e, "Order re-fetch failed; keeping previous snapshot."),
          }
        }
      }
      .instrument(tracing::info_span!("order_watcher", ?scope)),
    );

    Ok(OrderWatcher {
      scope,
      rx,
      task,
      _subscription: handle,
    })
  }

  pub fn scope(&self) -> OrderScope {
    self.scope
  }

  pub fn current(&self) -> OrderSnapshot {
    self.rx.borrow().clone()
  }

  /// Waits for the next snapshot. `None` once the watcher has stopped.
  pub async fn changed(&mut self) -> Option<OrderSnapshot> {
    self.rx.changed().await.ok()?;
    Some(self.rx.borrow_and_update().clone())
  }

  pub fn receiver(&self) -> watch::Receiver<OrderSnapshot> {
    self.rx.clone()
  }
}

impl Drop for OrderWatcher {
  fn drop(&mut self) {
    self.task.abort();
  }
}
