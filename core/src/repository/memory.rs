// kirana/src/repository/memory.rs

use super::MarketRepository;
use crate::error::{KiranaError, KiranaResult};
use crate::lifecycle::{OrderStatus, PaymentStatus};
use crate::model::{CatalogProduct, InventoryItem, Order, Profile, Store};
use crate::session::OrderScope;
use crate::sync::{ChangeEvent, ChangeHub, ChangeKind, Table};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  orders: HashMap<Uuid, Order>,
  inventory: HashMap<Uuid, InventoryItem>,
  catalog: Vec<CatalogProduct>,
  stores: HashMap<Uuid, Store>,
  profiles: HashMap<Uuid, Profile>,
}

/// In-process store backing demo accounts, and live accounts when no
/// database is configured.
pub struct MemoryRepository {
  tables: RwLock<Tables>,
  hub: ChangeHub,
}

impl MemoryRepository {
  pub fn new(hub: ChangeHub) -> Self {
    MemoryRepository {
      tables: RwLock::new(Tables::default()),
      hub,
    }
  }

  pub fn with_catalog(self, catalog: Vec<CatalogProduct>) -> Self {
    self.tables.write().catalog = catalog;
    self
  }

  pub fn hub(&self) -> &ChangeHub {
    &self.hub
  }

  fn publish_order(&self, kind: ChangeKind, order: &Order) {
    self.hub.publish(ChangeEvent::order(kind, order.id, order.store_id, order.customer_id));
  }

  fn update_order(&self, id: Uuid, expected_version: u64, apply: impl FnOnce(&mut Order)) -> KiranaResult<Order> {
    let updated = {
      let mut tables = self.tables.write();
      let order = tables.orders.get_mut(&id).ok_or_else(|| KiranaError::not_found("order", id))?;
      if order.version != expected_version {
        return Err(KiranaError::VersionConflict {
          order_id: id,
          expected: expected_version,
          found: order.version,
        });
      }
      apply(order);
      order.version += 1;
      order.clone()
    };
    self.publish_order(ChangeKind::Update, &updated);
    Ok(updated)
  }
}

#[async_trait]
impl MarketRepository for MemoryRepository {
  async fn insert_order(&self, order: &Order) -> KiranaResult<()> {
    self.tables.write().orders.insert(order.id, order.clone());
    debug!(order_id = %order.id, "Order stored in memory.");
    self.publish_order(ChangeKind::Insert, order);
    Ok(())
  }

  async fn order(&self, id: Uuid) -> KiranaResult<Option<Order>> {
    Ok(self.tables.read().orders.get(&id).cloned())
  }

  async fn orders_for(&self, scope: OrderScope) -> KiranaResult<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables
      .read()
      .orders
      .values()
      .filter(|o| scope.matches(o))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(orders)
  }

  async fn all_orders(&self) -> KiranaResult<Vec<Order>> {
    let mut orders: Vec<Order> = self.tables.read().orders.values().cloned().collect();
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(orders)
  }

  async fn write_status(&self, id: Uuid, expected_version: u64, status: OrderStatus) -> KiranaResult<Order> {
    self.update_order(id, expected_version, |o| o.status = status)
  }

  async fn write_payment_status(&self, id: Uuid, expected_version: u64, status: PaymentStatus) -> KiranaResult<Order> {
    self.update_order(id, expected_version, |o| o.payment_status = status)
  }

  async fn inventory_for(&self, store_id: Uuid) -> KiranaResult<Vec<InventoryItem>> {
    let mut items: Vec<InventoryItem> = self
      .tables
      .read()
      .inventory
      .values()
      .filter(|i| i.store_id == store_id)
      .cloned()
      .collect();
    items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    Ok(items)
  }

  async fn inventory_item(&self, id: Uuid) -> KiranaResult<Option<InventoryItem>> {
    Ok(self.tables.read().inventory.get(&id).cloned())
  }

  async fn save_inventory_item(&self, item: &InventoryItem) -> KiranaResult<()> {
    let kind = match self.tables.write().inventory.insert(item.id, item.clone()) {
      Some(_) => ChangeKind::Update,
      None => ChangeKind::Insert,
    };
    self.hub.publish(ChangeEvent {
      table: Table::Inventory,
      kind,
      row_id: item.id.to_string(),
      store_id: Some(item.store_id),
      customer_id: None,
    });
    Ok(())
  }

  async fn catalog(&self) -> KiranaResult<Vec<CatalogProduct>> {
    Ok(self.tables.read().catalog.clone())
  }

  async fn catalog_product(&self, product_id: &str) -> KiranaResult<Option<CatalogProduct>> {
    Ok(self.tables.read().catalog.iter().find(|p| p.id == product_id).cloned())
  }

  async fn store(&self, id: Uuid) -> KiranaResult<Option<Store>> {
    Ok(self.tables.read().stores.get(&id).cloned())
  }

  async fn store_for_owner(&self, owner_id: Uuid) -> KiranaResult<Option<Store>> {
    Ok(self.tables.read().stores.values().find(|s| s.owner_id == owner_id).cloned())
  }

  async fn stores(&self) -> KiranaResult<Vec<Store>> {
    Ok(self.tables.read().stores.values().cloned().collect())
  }

  async fn save_store(&self, store: &Store) -> KiranaResult<()> {
    let kind = match self.tables.write().stores.insert(store.id, store.clone()) {
      Some(_) => ChangeKind::Update,
      None => ChangeKind::Insert,
    };
    self.hub.publish(ChangeEvent {
      table: Table::Stores,
      kind,
      row_id: store.id.to_string(),
      store_id: Some(store.id),
      customer_id: None,
    });
    Ok(())
  }

  async fn profile(&self, user_id: Uuid) -> KiranaResult<Option<Profile>> {
    Ok(self.tables.read().profiles.get(&user_id).cloned())
  }

  async fn save_profile(&self, profile: &Profile) -> KiranaResult<()> {
    let kind = match self.tables.write().profiles.insert(profile.user_id, profile.clone()) {
      Some(_) => ChangeKind::Update,
      None => ChangeKind::Insert,
    };
    self.hub.publish(ChangeEvent {
      table: Table::Profiles,
      kind,
      row_id: profile.user_id.to_string(),
      store_id: None,
      customer_id: None,
    });
    Ok(())
  }
}
