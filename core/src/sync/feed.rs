// kirana/src/sync/feed.rs

//! In-process change notification hub.
//!
//! Repositories publish one [`ChangeEvent`] per row write. Subscribers
//! register a [`ChangeFilter`] and receive matching events until their
//! [`Subscription`] is dropped.

use crate::session::OrderScope;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
  Orders,
  Inventory,
  Stores,
  Profiles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
  Insert,
  Update,
  Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub table: Table,
  pub kind: ChangeKind,
  pub row_id: String,
  pub store_id: Option<Uuid>,
  pub customer_id: Option<Uuid>,
}

impl ChangeEvent {
  pub fn order(kind: ChangeKind, order_id: Uuid, store_id: Uuid, customer_id: Uuid) -> Self {
    ChangeEvent {
      table: Table::Orders,
      kind,
      row_id: order_id.to_string(),
      store_id: Some(store_id),
      customer_id: Some(customer_id),
    }
  }
}

/// A table plus optional equality constraints on the identity columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFilter {
  pub table: Table,
  pub store_id: Option<Uuid>,
  pub customer_id: Option<Uuid>,
}

impl ChangeFilter {
  pub fn table(table: Table) -> Self {
    ChangeFilter {
      table,
      store_id: None,
      customer_id: None,
    }
  }

  pub fn orders(scope: OrderScope) -> Self {
    match scope {
      OrderScope::Customer(id) => ChangeFilter {
        customer_id: Some(id),
        ..ChangeFilter::table(Table::Orders)
      },
      OrderScope::Store(id) => ChangeFilter {
        store_id: Some(id),
        ..ChangeFilter::table(Table::Orders)
      },
    }
  }

  pub fn matches(&self, event: &ChangeEvent) -> bool {
    self.table == event.table
      && self.store_id.map_or(true, |id| event.store_id == Some(id))
      && self.customer_id.map_or(true, |id| event.customer_id == Some(id))
  }
}

struct Subscriber {
  filter: ChangeFilter,
  tx: mpsc::UnboundedSender<ChangeEvent>,
}

#[derive(Default)]
struct HubInner {
  subscribers: Mutex<HashMap<u64, Subscriber>>,
  next_id: AtomicU64,
}

impl HubInner {
  fn unsubscribe(&self, id: u64) {
    if self.subscribers.lock().remove(&id).is_some() {
      debug!(subscription_id = id, "Change subscription removed.");
    }
  }
}

/// Cheap to clone; all clones share one subscriber table.
#[derive(Clone, Default)]
pub struct ChangeHub {
  inner: Arc<HubInner>,
}

impl ChangeHub {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe(&self, filter: ChangeFilter) -> Subscription {
    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
    let (tx, rx) = mpsc::unbounded_channel();
    self.inner.subscribers.lock().insert(id, Subscriber { filter, tx });
    debug!(subscription_id = id, ?filter, "Change subscription added.");
    Subscription {
      id,
      rx,
      hub: Arc::downgrade(&self.inner),
    }
  }

  /// Runs `callback` for every matching event until the returned handle is dropped.
  pub fn subscribe_with<F>(&self, filter: ChangeFilter, callback: F) -> CallbackSubscription
  where
    F: Fn(ChangeEvent) + Send + Sync + 'static,
  {
    let mut subscription = self.subscribe(filter);
    let handle = subscription.handle();
    let task = tokio::spawn(async move {
      while let Some(event) = subscription.recv().await {
        callback(event);
      }
    });
    CallbackSubscription { _handle: handle, task }
  }

  /// Delivers `event` to every matching subscriber. Returns how many got it.
  pub fn publish(&self, event: ChangeEvent) -> usize {
    let mut subscribers = self.inner.subscribers.lock();
    let mut delivered = 0;
    subscribers.retain(|id, sub| {
      if !sub.filter.matches(&event) {
        return true;
      }
      match sub.tx.send(event.clone()) {
        Ok(()) => {
          delivered += 1;
          true
        }
        Err(_) => {
          trace!(subscription_id = *id, "Dropping closed subscriber.");
          false
        }
      }
    });
    trace!(table = ?event.table, row_id = %event.row_id, delivered, "Change published.");
    delivered
  }

  pub fn subscriber_count(&self) -> usize {
    self.inner.subscribers.lock().len()
  }
}

pub struct Subscription {
  id: u64,
  rx: mpsc::UnboundedReceiver<ChangeEvent>,
  hub: Weak<HubInner>,
}

impl Subscription {
  pub async fn recv(&mut self) -> Option<ChangeEvent> {
    self.rx.recv().await
  }

  pub fn handle(&self) -> SubscriptionHandle {
    SubscriptionHandle {
      id: self.id,
      hub: self.hub.clone(),
    }
  }

  /// Drains events already queued without waiting.
  pub fn drain(&mut self) -> usize {
    let mut drained = 0;
    while self.rx.try_recv().is_ok() {
      drained += 1;
    }
    drained
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(hub) = self.hub.upgrade() {
      hub.unsubscribe(self.id);
    }
  }
}

/// Removes a subscription from its hub when dropped, even while the
/// [`Subscription`] itself is still owned by a task that is winding down.
pub struct SubscriptionHandle {
  id: u64,
  hub: Weak<HubInner>,
}

impl Drop for SubscriptionHandle {
  fn drop(&mut self) {
    if let Some(hub) = self.hub.upgrade() {
      hub.unsubscribe(self.id);
    }
  }
}

pub struct CallbackSubscription {
  _handle: SubscriptionHandle,
  task: JoinHandle<()>,
}

impl Drop for CallbackSubscription {
  fn drop(&mut self) {
    self.task.abort();
  }
}
