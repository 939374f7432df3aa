// kirana/src/model/catalog.rs

use super::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogBrand {
  pub brand: String,
  pub price: Money,
  pub reference_price: Option<Money>,
}

/// A platform-wide product that stores can list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
  pub id: String,
  pub name: String,
  pub unit: Option<String>,
  pub price: Money,
  pub reference_price: Option<Money>,
  #[serde(default)]
  pub brands: Vec<CatalogBrand>,
}
