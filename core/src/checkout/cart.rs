// kirana/src/checkout/cart.rs

use crate::error::{KiranaError, KiranaResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub store_id: Uuid,
  pub inventory_item_id: Uuid,
  pub variant: Option<String>,
  pub quantity: u32,
}

/// A customer's cart. Lines from a second store are refused.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  pub store_id: Option<Uuid>,
  #[serde(default)]
  pub lines: Vec<CartLine>,
}

impl Cart {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn for_store(store_id: Uuid) -> Self {
    Cart {
      store_id: Some(store_id),
      lines: Vec::new(),
    }
  }

  /// Adds `line`, merging quantities with an existing line for the same item
  /// and variant. The first line fixes the cart's store.
  pub fn add(&mut self, line: CartLine) -> KiranaResult<()> {
    match self.store_id {
      Some(expected) if expected != line.store_id => {
        return Err(KiranaError::MixedStores {
          expected,
          found: line.store_id,
        })
      }
      Some(_) => {}
      None => self.store_id = Some(line.store_id),
    }

    match self
      .lines
      .iter_mut()
      .find(|l| l.inventory_item_id == line.inventory_item_id && l.variant == line.variant)
    {
      Some(existing) => existing.quantity += line.quantity,
      None => self.lines.push(line),
    }
    Ok(())
  }

  pub fn remove(&mut self, inventory_item_id: Uuid, variant: Option<&str>) {
    self
      .lines
      .retain(|l| !(l.inventory_item_id == inventory_item_id && l.variant.as_deref() == variant));
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn second_store_is_refused() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut cart = Cart::new();
    cart
      .add(CartLine { store_id: a, inventory_item_id: Uuid::new_v4(), variant: None, quantity: 1 })
      .unwrap();
    let err = cart
      .add(CartLine { store_id: b, inventory_item_id: Uuid::new_v4(), variant: None, quantity: 1 })
      .unwrap_err();
    assert!(matches!(err, KiranaError::MixedStores { expected, found } if expected == a && found == b));
  }

  #[test]
  fn same_item_merges_quantity() {
    let store = Uuid::new_v4();
    let item = Uuid::new_v4();
    let mut cart = Cart::for_store(store);
    for _ in 0..2 {
      cart
        .add(CartLine { store_id: store, inventory_item_id: item, variant: Some("Amul".into()), quantity: 2 })
        .unwrap();
    }
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity, 4);
  }
}
