// kirana/src/model/inventory.rs

use super::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A brand-level override of an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantListing {
  pub brand: String,
  pub price: Money,
  pub reference_price: Option<Money>,
  pub stock: u32,
  pub offered: bool,
}

/// A store's listing of a catalog (or custom) product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
  pub id: Uuid,
  pub store_id: Uuid,
  pub product_id: String,
  pub name: String,
  #[serde(default)]
  pub custom: bool,
  pub offered: bool,
  pub stock: u32,
  pub sell_price: Money,
  pub reference_price: Option<Money>,
  #[serde(default)]
  pub variants: Vec<VariantListing>,
}

/// The combined owner edit: flag, prices and stock in one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingUpdate {
  pub offered: bool,
  pub sell_price: Money,
  pub reference_price: Option<Money>,
  pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantUpdate {
  pub price: Option<Money>,
  pub reference_price: Option<Money>,
  pub stock: Option<u32>,
  pub offered: Option<bool>,
}

impl InventoryItem {
  pub fn has_variants(&self) -> bool {
    !self.variants.is_empty()
  }

  /// Applies a combined edit. With variants present the aggregate stock is
  /// derived from them and the requested stock is ignored.
  pub fn apply_listing(&mut self, update: ListingUpdate) {
    self.offered = update.offered;
    self.sell_price = update.sell_price;
    self.reference_price = update.reference_price;
    if self.has_variants() {
      self.recompute_stock();
    } else {
      self.stock = update.stock;
    }
  }

  /// Flips the offered flag only. Stock and variant data are untouched.
  pub fn toggle_offered(&mut self) {
    self.offered = !self.offered;
  }

  /// Returns false when no variant carries `brand`.
  pub fn apply_variant(&mut self, brand: &str, update: &VariantUpdate) -> bool {
    let Some(variant) = self.variants.iter_mut().find(|v| v.brand == brand) else {
      return false;
    };
    if let Some(price) = update.price {
      variant.price = price;
    }
    if update.reference_price.is_some() {
      variant.reference_price = update.reference_price;
    }
    if let Some(stock) = update.stock {
      variant.stock = stock;
    }
    if let Some(offered) = update.offered {
      variant.offered = offered;
    }
    self.recompute_stock();
    true
  }

  /// Aggregate stock is the sum over offered variants.
  pub fn recompute_stock(&mut self) {
    if self.has_variants() {
      self.stock = self.variants.iter().filter(|v| v.offered).map(|v| v.stock).sum();
    }
  }

  /// Price a customer pays for `variant`, or the item price.
  pub fn price_for(&self, variant: Option<&str>) -> Option<Money> {
    match variant {
      None => Some(self.sell_price),
      Some(brand) => self.variants.iter().find(|v| v.brand == brand && v.offered).map(|v| v.price),
    }
  }
}
