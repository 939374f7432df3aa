// kirana/src/context.rs

//! The explicitly constructed client object every surface is handed.

use crate::checkout::{Checkout, PaymentGateway};
use crate::config::MarketConfig;
use crate::error::{KiranaError, KiranaResult};
use crate::geo::{nearby_stores, GeoPoint, NearbyStore};
use crate::inventory::InventoryDesk;
use crate::model::{Profile, Store, StoreUpdate};
use crate::orders::OrderDesk;
use crate::repository::{MarketRepository, MemoryRepository};
use crate::session::{open_session, AccountMode, Role, Session};
use crate::sync::{ChangeHub, DemoSimulator, OrderWatcher, SimulatorHandle};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// One backend plus the hub its writes are announced on.
#[derive(Clone)]
pub struct Backend {
  pub repo: Arc<dyn MarketRepository>,
  pub hub: ChangeHub,
}

/// Created once per process and torn down with [`MarketContext::shutdown`].
///
/// Live accounts use the backend passed in. Demo accounts use a private
/// in-memory backend whose orders are moved along by the demo simulator.
pub struct MarketContext {
  config: MarketConfig,
  live: Backend,
  demo: Backend,
  live_checkout: Checkout,
  demo_checkout: Checkout,
  payments: Arc<dyn PaymentGateway>,
  simulator: Mutex<Option<SimulatorHandle>>,
}

impl MarketContext {
  pub fn new(config: MarketConfig, live: Backend, demo_repo: Arc<MemoryRepository>, payments: Arc<dyn PaymentGateway>) -> Self {
    let demo = Backend {
      hub: demo_repo.hub().clone(),
      repo: demo_repo,
    };
    let live_checkout = Checkout::new(live.repo.clone(), payments.clone(), &config);
    let demo_checkout = Checkout::new(demo.repo.clone(), payments.clone(), &config);
    MarketContext {
      config,
      live,
      demo,
      live_checkout,
      demo_checkout,
      payments,
      simulator: Mutex::new(None),
    }
  }

  /// A context whose live backend is also in memory.
  pub fn in_memory(config: MarketConfig, payments: Arc<dyn PaymentGateway>) -> Self {
    let live_repo = Arc::new(MemoryRepository::new(ChangeHub::new()));
    let live = Backend {
      hub: live_repo.hub().clone(),
      repo: live_repo,
    };
    let demo = Arc::new(MemoryRepository::new(ChangeHub::new()));
    Self::new(config, live, demo, payments)
  }

  pub fn config(&self) -> &MarketConfig {
    &self.config
  }

  pub fn backend(&self, mode: AccountMode) -> &Backend {
    match mode {
      AccountMode::Live => &self.live,
      AccountMode::Demo => &self.demo,
    }
  }

  pub fn repository(&self, mode: AccountMode) -> Arc<dyn MarketRepository> {
    self.backend(mode).repo.clone()
  }

  pub async fn open_session(&self, user_id: Uuid, role: Role, mode: AccountMode) -> KiranaResult<Session> {
    open_session(self.backend(mode).repo.as_ref(), user_id, role, mode).await
  }

  pub fn checkout(&self, mode: AccountMode) -> &Checkout {
    match mode {
      AccountMode::Live => &self.live_checkout,
      AccountMode::Demo => &self.demo_checkout,
    }
  }

  pub fn order_desk(&self, mode: AccountMode) -> OrderDesk {
    OrderDesk::new(self.repository(mode), self.payments.clone())
  }

  pub fn inventory_desk(&self, mode: AccountMode, store_id: Uuid) -> InventoryDesk {
    InventoryDesk::new(self.repository(mode), store_id)
  }

  /// Starts watching the session's orders. Drop the watcher to unsubscribe.
  pub async fn watch_orders(&self, session: &Session) -> KiranaResult<OrderWatcher> {
    let backend = self.backend(session.mode());
    OrderWatcher::start(backend.repo.clone(), &backend.hub, session.order_scope()).await
  }

  /// Open stores near `origin` within the configured radius, nearest first.
  pub async fn discover_stores(&self, mode: AccountMode, origin: GeoPoint) -> KiranaResult<Vec<NearbyStore>> {
    let stores = self.repository(mode).stores().await?;
    Ok(nearby_stores(stores, origin, self.config.discovery_radius_km))
  }

  /// Applies an owner's store profile edit and saves it.
  #[instrument(skip(self, session, update), fields(user_id = %session.user_id()), err(Display))]
  pub async fn update_store(&self, session: &Session, update: StoreUpdate) -> KiranaResult<Store> {
    let Some(store) = session.store() else {
      return Err(KiranaError::StoreNotLinked { owner_id: session.user_id() });
    };
    if let Some(location) = update.location {
      if !location.is_valid() {
        return Err(KiranaError::InvalidInput("store coordinates out of range".into()));
      }
    }
    let repo = self.repository(session.mode());
    // Re-read so edits from another session are not overwritten wholesale.
    let mut current = repo
      .store(store.id)
      .await?
      .ok_or_else(|| KiranaError::not_found("store", store.id))?;
    current.apply(update);
    repo.save_store(&current).await?;
    info!(store_id = %current.id, "Store profile saved.");
    Ok(current)
  }

  #[instrument(skip(self, session), fields(user_id = %session.user_id()), err(Display))]
  pub async fn update_profile(&self, session: &Session, display_name: Option<String>, phone: Option<String>) -> KiranaResult<Profile> {
    let mut profile = session.profile().clone();
    if let Some(name) = display_name {
      profile.display_name = name.trim().to_string();
    }
    if phone.is_some() {
      profile.phone = phone;
    }
    self.repository(session.mode()).save_profile(&profile).await?;
    Ok(profile)
  }

  /// Starts the demo simulator if it is not already running.
  pub fn start_demo_simulator(&self) {
    let mut slot = self.simulator.lock();
    if slot.is_none() {
      let simulator = DemoSimulator::new(self.demo.repo.clone(), self.config.demo_tick);
      *slot = Some(simulator.spawn());
    }
  }

  pub fn shutdown(&self) {
    if let Some(handle) = self.simulator.lock().take() {
      handle.stop();
    }
    info!("Market context shut down.");
  }
}
