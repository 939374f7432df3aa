// kirana/src/inventory.rs

//! The store owner's inventory desk.
//!
//! Edits are applied to the local view first and then persisted. When the
//! write fails the view is restored to the item as it was before the edit
//! and the error is returned.

use crate::error::{KiranaError, KiranaResult};
use crate::model::{InventoryItem, ListingUpdate, Money, VariantListing, VariantUpdate};
use crate::repository::MarketRepository;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomProduct {
  pub name: String,
  pub sell_price: Money,
  pub reference_price: Option<Money>,
  pub stock: u32,
  #[serde(default = "offered_by_default")]
  pub offered: bool,
}

fn offered_by_default() -> bool {
  true
}

fn ensure_price(field: &str, price: Option<Money>) -> KiranaResult<()> {
  match price {
    Some(p) if p.is_negative() => Err(KiranaError::InvalidInput(format!("{field} cannot be negative"))),
    _ => Ok(()),
  }
}

fn check_listing(update: &ListingUpdate) -> KiranaResult<()> {
  ensure_price("sell price", Some(update.sell_price))?;
  ensure_price("reference price", update.reference_price)
}

pub struct InventoryDesk {
  repo: Arc<dyn MarketRepository>,
  store_id: Uuid,
  view: RwLock<Vec<InventoryItem>>,
}

impl InventoryDesk {
  pub fn new(repo: Arc<dyn MarketRepository>, store_id: Uuid) -> Self {
    InventoryDesk {
      repo,
      store_id,
      view: RwLock::new(Vec::new()),
    }
  }

  pub fn store_id(&self) -> Uuid {
    self.store_id
  }

  /// Replaces the local view with the store's current listing.
  pub async fn load(&self) -> KiranaResult<Vec<InventoryItem>> {
    let items = self.repo.inventory_for(self.store_id).await?;
    *self.view.write() = items.clone();
    debug!(store_id = %self.store_id, items = items.len(), "Inventory loaded.");
    Ok(items)
  }

  pub fn items(&self) -> Vec<InventoryItem> {
    self.view.read().clone()
  }

  pub fn item(&self, id: Uuid) -> Option<InventoryItem> {
    self.view.read().iter().find(|i| i.id == id).cloned()
  }

  /// Sets the offered flag, prices and stock in one write.
  #[instrument(name = "InventoryDesk::apply", skip(self), err(Display))]
  pub async fn apply(&self, id: Uuid, update: ListingUpdate) -> KiranaResult<InventoryItem> {
    check_listing(&update)?;
    self
      .commit(id, |item| {
        item.apply_listing(update);
        Ok(())
      })
      .await
  }

  /// Flips the offered flag, leaving stock and variants as they are.
  #[instrument(name = "InventoryDesk::toggle", skip(self), err(Display))]
  pub async fn toggle(&self, id: Uuid) -> KiranaResult<InventoryItem> {
    self
      .commit(id, |item| {
        item.toggle_offered();
        Ok(())
      })
      .await
  }

  #[instrument(name = "InventoryDesk::set_variant", skip(self, update), err(Display))]
  pub async fn set_variant(&self, id: Uuid, brand: &str, update: VariantUpdate) -> KiranaResult<InventoryItem> {
    ensure_price("variant price", update.price)?;
    ensure_price("variant reference price", update.reference_price)?;
    self
      .commit(id, |item| {
        if item.apply_variant(brand, &update) {
          Ok(())
        } else {
          Err(KiranaError::not_found("variant", brand))
        }
      })
      .await
  }

  /// Lists a catalog product in this store, or updates the existing listing.
  /// The stored listing is consulted, so a desk that was never loaded still
  /// finds it.
  ///
  /// Catalog brands become variants that start unoffered with no stock.
  #[instrument(name = "InventoryDesk::list_catalog_product", skip(self), err(Display))]
  pub async fn list_catalog_product(&self, product_id: &str, update: ListingUpdate) -> KiranaResult<InventoryItem> {
    check_listing(&update)?;
    let in_view = self.view.read().iter().find(|i| i.product_id == product_id).map(|i| i.id);
    let existing = match in_view {
      Some(id) => Some(id),
      None => self
        .repo
        .inventory_for(self.store_id)
        .await?
        .into_iter()
        .find(|i| i.product_id == product_id)
        .map(|i| i.id),
    };
    if let Some(id) = existing {
      return self.apply(id, update).await;
    }

    let product = self
      .repo
      .catalog_product(product_id)
      .await?
      .ok_or_else(|| KiranaError::not_found("catalog product", product_id))?;

    let mut item = InventoryItem {
      id: Uuid::new_v4(),
      store_id: self.store_id,
      product_id: product.id.clone(),
      name: product.name.clone(),
      custom: false,
      offered: false,
      stock: 0,
      sell_price: product.price,
      reference_price: product.reference_price,
      variants: product
        .brands
        .iter()
        .map(|b| VariantListing {
          brand: b.brand.clone(),
          price: b.price,
          reference_price: b.reference_price,
          stock: 0,
          offered: false,
        })
        .collect(),
    };
    item.apply_listing(update);
    self.insert(item).await
  }

  #[instrument(name = "InventoryDesk::add_custom_product", skip(self), err(Display))]
  pub async fn add_custom_product(&self, product: CustomProduct) -> KiranaResult<InventoryItem> {
    if product.name.trim().is_empty() {
      return Err(KiranaError::InvalidInput("custom product needs a name".into()));
    }
    ensure_price("sell price", Some(product.sell_price))?;
    ensure_price("reference price", product.reference_price)?;
    let item = InventoryItem {
      id: Uuid::new_v4(),
      store_id: self.store_id,
      product_id: format!("custom-{}", Uuid::new_v4().simple()),
      name: product.name.trim().to_string(),
      custom: true,
      offered: product.offered,
      stock: product.stock,
      sell_price: product.sell_price,
      reference_price: product.reference_price,
      variants: Vec::new(),
    };
    self.insert(item).await
  }

  async fn insert(&self, item: InventoryItem) -> KiranaResult<InventoryItem> {
    self.view.write().push(item.clone());
    if let Err(e) = self.repo.save_inventory_item(&item).await {
      error!(error = %e, item_id = %item.id, "Listing not saved; removing it from the view.");
      self.view.write().retain(|i| i.id != item.id);
      return Err(e);
    }
    info!(item_id = %item.id, product_id = %item.product_id, "Product listed.");
    Ok(item)
  }

  async fn ensure_in_view(&self, id: Uuid) -> KiranaResult<()> {
    if self.view.read().iter().any(|i| i.id == id) {
      return Ok(());
    }
    match self.repo.inventory_item(id).await? {
      Some(item) if item.store_id == self.store_id => {
        self.view.write().push(item);
        Ok(())
      }
      _ => Err(KiranaError::not_found("inventory item", id)),
    }
  }

  async fn commit(&self, id: Uuid, edit: impl FnOnce(&mut InventoryItem) -> KiranaResult<()>) -> KiranaResult<InventoryItem> {
    self.ensure_in_view(id).await?;

    let (previous, updated) = {
      let mut view = self.view.write();
      let slot = view
        .iter_mut()
        .find(|i| i.id == id)
        .ok_or_else(|| KiranaError::not_found("inventory item", id))?;
      let previous = slot.clone();
      edit(slot)?;
      (previous, slot.clone())
    };

    match self.repo.save_inventory_item(&updated).await {
      Ok(()) => {
        debug!(item_id = %id, offered = updated.offered, stock = updated.stock, "Listing saved.");
        Ok(updated)
      }
      Err(e) => {
        error!(error = %e, item_id = %id, "Listing not saved; restoring previous state.");
        let mut view = self.view.write();
        if let Some(slot) = view.iter_mut().find(|i| i.id == id) {
          if *slot == updated {
            *slot = previous;
          }
        }
        Err(e)
      }
    }
  }
}
