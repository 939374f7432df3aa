// kirana/src/model/mod.rs

//! Typed records shared by every role.

mod catalog;
mod inventory;
mod money;
mod order;
mod profile;
mod store;

pub use catalog::{CatalogBrand, CatalogProduct};
pub use inventory::{InventoryItem, ListingUpdate, VariantListing, VariantUpdate};
pub use money::Money;
pub use order::{DeliveryFee, DeliverySchedule, FeePayee, LineItem, Order, PaymentSplit};
pub use profile::Profile;
pub use store::{Store, StoreCategory, StoreUpdate};
