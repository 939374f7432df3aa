// kirana/src/repository/mod.rs

//! The authoritative-store seam.
//!
//! Every implementation publishes a [`ChangeEvent`](crate::sync::ChangeEvent)
//! for each row it writes so subscribers can re-fetch.

mod memory;

pub use memory::MemoryRepository;

use crate::error::KiranaResult;
use crate::lifecycle::{OrderStatus, PaymentStatus};
use crate::model::{CatalogProduct, InventoryItem, Order, Profile, Store};
use crate::session::OrderScope;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait MarketRepository: Send + Sync {
  async fn insert_order(&self, order: &Order) -> KiranaResult<()>;

  async fn order(&self, id: Uuid) -> KiranaResult<Option<Order>>;

  /// Orders visible to `scope`, newest first.
  async fn orders_for(&self, scope: OrderScope) -> KiranaResult<Vec<Order>>;

  /// Every order, used by the demo simulator.
  async fn all_orders(&self) -> KiranaResult<Vec<Order>>;

  /// Compare-and-set on `expected_version`. Returns the stored order with its
  /// bumped version, or `VersionConflict` if someone else wrote first.
  async fn write_status(&self, id: Uuid, expected_version: u64, status: OrderStatus) -> KiranaResult<Order>;

  async fn write_payment_status(&self, id: Uuid, expected_version: u64, status: PaymentStatus) -> KiranaResult<Order>;

  async fn inventory_for(&self, store_id: Uuid) -> KiranaResult<Vec<InventoryItem>>;

  async fn inventory_item(&self, id: Uuid) -> KiranaResult<Option<InventoryItem>>;

  async fn save_inventory_item(&self, item: &InventoryItem) -> KiranaResult<()>;

  async fn catalog(&self) -> KiranaResult<Vec<CatalogProduct>>;

  async fn catalog_product(&self, product_id: &str) -> KiranaResult<Option<CatalogProduct>>;

  async fn store(&self, id: Uuid) -> KiranaResult<Option<Store>>;

  async fn store_for_owner(&self, owner_id: Uuid) -> KiranaResult<Option<Store>>;

  async fn stores(&self) -> KiranaResult<Vec<Store>>;

  async fn save_store(&self, store: &Store) -> KiranaResult<()>;

  async fn profile(&self, user_id: Uuid) -> KiranaResult<Option<Profile>>;

  async fn save_profile(&self, profile: &Profile) -> KiranaResult<()>;
}
