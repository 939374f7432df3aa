// kirana/src/model/store.rs

use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Only used to pick a colour and an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreCategory {
  #[default]
  #[serde(alias = "grocery", alias = "kirana")]
  General,
  #[serde(alias = "vegetables", alias = "fruits")]
  FreshProduce,
  Dairy,
  Bakery,
  Pharmacy,
  #[serde(alias = "meat_fish")]
  Meat,
}

impl StoreCategory {
  pub fn from_tag(tag: &str) -> Self {
    match tag.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
      "fresh_produce" | "vegetables" | "fruits" => StoreCategory::FreshProduce,
      "dairy" => StoreCategory::Dairy,
      "bakery" => StoreCategory::Bakery,
      "pharmacy" | "medical" => StoreCategory::Pharmacy,
      "meat" | "meat_fish" => StoreCategory::Meat,
      _ => StoreCategory::General,
    }
  }

  pub fn colour(self) -> &'static str {
    match self {
      StoreCategory::General => "#F59E0B",
      StoreCategory::FreshProduce => "#10B981",
      StoreCategory::Dairy => "#3B82F6",
      StoreCategory::Bakery => "#D97706",
      StoreCategory::Pharmacy => "#EF4444",
      StoreCategory::Meat => "#B91C1C",
    }
  }

  pub fn icon(self) -> &'static str {
    match self {
      StoreCategory::General => "store",
      StoreCategory::FreshProduce => "carrot",
      StoreCategory::Dairy => "milk",
      StoreCategory::Bakery => "croissant",
      StoreCategory::Pharmacy => "pill",
      StoreCategory::Meat => "drumstick",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
  pub id: Uuid,
  pub owner_id: Uuid,
  pub name: String,
  pub address: String,
  pub location: Option<GeoPoint>,
  pub is_open: bool,
  #[serde(default)]
  pub category: StoreCategory,
  pub payment_id: Option<String>,
}

/// Owner edits to the store profile. Absent fields are left alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpdate {
  pub name: Option<String>,
  pub address: Option<String>,
  pub location: Option<GeoPoint>,
  pub is_open: Option<bool>,
  pub category: Option<StoreCategory>,
  pub payment_id: Option<String>,
}

impl Store {
  pub fn apply(&mut self, update: StoreUpdate) {
    if let Some(name) = update.name {
      self.name = name;
    }
    if let Some(address) = update.address {
      self.address = address;
    }
    if update.location.is_some() {
      self.location = update.location;
    }
    if let Some(is_open) = update.is_open {
      self.is_open = is_open;
    }
    if let Some(category) = update.category {
      self.category = category;
    }
    if update.payment_id.is_some() {
      self.payment_id = update.payment_id;
    }
  }
}
