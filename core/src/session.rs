// kirana/src/session.rs

//! Who is signed in, and which slice of the data they see.

use crate::error::{KiranaError, KiranaResult};
use crate::model::{Order, Profile, Store};
use crate::repository::MarketRepository;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Customer,
  #[serde(alias = "owner", alias = "store")]
  StoreOwner,
}

impl Role {
  pub fn from_tag(tag: &str) -> Option<Self> {
    match tag.trim().to_ascii_lowercase().as_str() {
      "customer" => Some(Role::Customer),
      "store_owner" | "storeowner" | "owner" | "store" => Some(Role::StoreOwner),
      _ => None,
    }
  }
}

/// Live accounts talk to the authoritative backend; demo accounts stay in
/// memory and are driven by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountMode {
  #[default]
  Live,
  Demo,
}

/// The identity an order query or change subscription is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OrderScope {
  Customer(Uuid),
  Store(Uuid),
}

impl OrderScope {
  pub fn matches(&self, order: &Order) -> bool {
    match self {
      OrderScope::Customer(id) => order.customer_id == *id,
      OrderScope::Store(id) => order.store_id == *id,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Session {
  Customer { profile: Profile },
  StoreOwner { profile: Profile, store: Store },
}

impl Session {
  pub fn profile(&self) -> &Profile {
    match self {
      Session::Customer { profile } | Session::StoreOwner { profile, .. } => profile,
    }
  }

  pub fn user_id(&self) -> Uuid {
    self.profile().user_id
  }

  pub fn mode(&self) -> AccountMode {
    self.profile().mode
  }

  pub fn store(&self) -> Option<&Store> {
    match self {
      Session::Customer { .. } => None,
      Session::StoreOwner { store, .. } => Some(store),
    }
  }

  pub fn order_scope(&self) -> OrderScope {
    match self {
      Session::Customer { profile } => OrderScope::Customer(profile.user_id),
      Session::StoreOwner { store, .. } => OrderScope::Store(store.id),
    }
  }
}

/// Loads the profile for `user_id` and resolves the role-specific session.
///
/// A missing profile row is synthesised from `role` and saved. A store owner
/// whose store row is missing cannot be repaired here and gets
/// [`KiranaError::StoreNotLinked`].
#[instrument(skip(repo), err(Display))]
pub async fn open_session(repo: &dyn MarketRepository, user_id: Uuid, role: Role, mode: AccountMode) -> KiranaResult<Session> {
  let profile = match repo.profile(user_id).await? {
    Some(profile) => profile,
    None => {
      warn!(%user_id, "No profile row; creating a minimal one.");
      let profile = Profile::minimal(user_id, role, mode);
      repo.save_profile(&profile).await?;
      profile
    }
  };

  match profile.role {
    Role::Customer => {
      info!(%user_id, "Customer session opened.");
      Ok(Session::Customer { profile })
    }
    Role::StoreOwner => match repo.store_for_owner(user_id).await? {
      Some(store) => {
        info!(%user_id, store_id = %store.id, "Store owner session opened.");
        Ok(Session::StoreOwner { profile, store })
      }
      None => Err(KiranaError::StoreNotLinked { owner_id: user_id }),
    },
  }
}
