// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use kirana::checkout::{CartLine, PaymentReceipt, PaymentRequest};
use kirana::geo::GeoPoint;
use kirana::lifecycle::{OrderStatus, PaymentStatus};
use kirana::model::{CatalogProduct, InventoryItem, Profile, StoreCategory, VariantListing};
use kirana::{
  Cart, CheckoutRequest, FulfillmentMode, KiranaError, KiranaResult, MarketRepository, MemoryRepository, Money, Order,
  OrderScope, PaymentChoice, PaymentGateway, ScheduleRequest, Store,
};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Flow test context ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub steps_executed: Vec<String>,
  pub stop_at: Option<String>,
  pub skip_optional: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Kirana error: {0}")]
  Kirana(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<KiranaError> for TestError {
  fn from(e: KiranaError) -> Self {
    TestError::Kirana(format!("{:?}", e))
  }
}

// --- Payment gateways ---
#[derive(Default)]
pub struct ApprovingGateway {
  pub calls: AtomicUsize,
  pub last_amount: parking_lot::Mutex<Option<Money>>,
}

#[async_trait]
impl PaymentGateway for ApprovingGateway {
  async fn confirm(&self, request: &PaymentRequest) -> anyhow::Result<PaymentReceipt> {
    let n = self.calls.fetch_add(1, Ordering::SeqCst);
    *self.last_amount.lock() = Some(request.amount);
    Ok(PaymentReceipt {
      reference: format!("test-pay-{n}"),
    })
  }
}

pub struct DecliningGateway;

#[async_trait]
impl PaymentGateway for DecliningGateway {
  async fn confirm(&self, _request: &PaymentRequest) -> anyhow::Result<PaymentReceipt> {
    anyhow::bail!("card declined")
  }
}

// --- Repository wrapper whose writes can be made to fail ---
pub struct FlakyRepository {
  pub inner: Arc<MemoryRepository>,
  pub fail_writes: AtomicBool,
}

impl FlakyRepository {
  pub fn new(inner: Arc<MemoryRepository>) -> Self {
    FlakyRepository {
      inner,
      fail_writes: AtomicBool::new(false),
    }
  }

  pub fn set_failing(&self, failing: bool) {
    self.fail_writes.store(failing, Ordering::SeqCst);
  }

  fn check(&self, operation: &'static str) -> KiranaResult<()> {
    if self.fail_writes.load(Ordering::SeqCst) {
      Err(KiranaError::backend(operation, "connection reset"))
    } else {
      Ok(())
    }
  }
}

#[async_trait]
impl MarketRepository for FlakyRepository {
  async fn insert_order(&self, order: &Order) -> KiranaResult<()> {
    self.check("insert_order")?;
    self.inner.insert_order(order).await
  }
  async fn order(&self, id: Uuid) -> KiranaResult<Option<Order>> {
    self.inner.order(id).await
  }
  async fn orders_for(&self, scope: OrderScope) -> KiranaResult<Vec<Order>> {
    self.inner.orders_for(scope).await
  }
  async fn all_orders(&self) -> KiranaResult<Vec<Order>> {
    self.inner.all_orders().await
  }
  async fn write_status(&self, id: Uuid, expected_version: u64, status: OrderStatus) -> KiranaResult<Order> {
    self.check("write_status")?;
    self.inner.write_status(id, expected_version, status).await
  }
  async fn write_payment_status(&self, id: Uuid, expected_version: u64, status: PaymentStatus) -> KiranaResult<Order> {
    self.check("write_payment_status")?;
    self.inner.write_payment_status(id, expected_version, status).await
  }
  async fn inventory_for(&self, store_id: Uuid) -> KiranaResult<Vec<InventoryItem>> {
    self.inner.inventory_for(store_id).await
  }
  async fn inventory_item(&self, id: Uuid) -> KiranaResult<Option<InventoryItem>> {
    self.inner.inventory_item(id).await
  }
  async fn save_inventory_item(&self, item: &InventoryItem) -> KiranaResult<()> {
    self.check("save_inventory_item")?;
    self.inner.save_inventory_item(item).await
  }
  async fn catalog(&self) -> KiranaResult<Vec<CatalogProduct>> {
    self.inner.catalog().await
  }
  async fn catalog_product(&self, product_id: &str) -> KiranaResult<Option<CatalogProduct>> {
    self.inner.catalog_product(product_id).await
  }
  async fn store(&self, id: Uuid) -> KiranaResult<Option<Store>> {
    self.inner.store(id).await
  }
  async fn store_for_owner(&self, owner_id: Uuid) -> KiranaResult<Option<Store>> {
    self.inner.store_for_owner(owner_id).await
  }
  async fn stores(&self) -> KiranaResult<Vec<Store>> {
    self.inner.stores().await
  }
  async fn save_store(&self, store: &Store) -> KiranaResult<()> {
    self.check("save_store")?;
    self.inner.save_store(store).await
  }
  async fn profile(&self, user_id: Uuid) -> KiranaResult<Option<Profile>> {
    self.inner.profile(user_id).await
  }
  async fn save_profile(&self, profile: &Profile) -> KiranaResult<()> {
    self.check("save_profile")?;
    self.inner.save_profile(profile).await
  }
}

// --- Fixtures ---
pub fn store_location() -> GeoPoint {
  GeoPoint::new(12.9716, 77.5946)
}

pub fn customer_location() -> GeoPoint {
  GeoPoint::new(12.9750, 77.6000)
}

pub async fn seed_store(repo: &dyn MarketRepository, owner_id: Uuid) -> Store {
  let store = Store {
    id: Uuid::new_v4(),
    owner_id,
    name: "Sharma General Store".into(),
    address: "12 MG Road".into(),
    location: Some(store_location()),
    is_open: true,
    category: StoreCategory::General,
    payment_id: Some("sharma@upi".into()),
  };
  repo.save_store(&store).await.unwrap();
  store
}

pub async fn seed_item(repo: &dyn MarketRepository, store: &Store, name: &str, price_rupees: i64, stock: u32) -> InventoryItem {
  let item = InventoryItem {
    id: Uuid::new_v4(),
    store_id: store.id,
    product_id: name.to_lowercase().replace(' ', "-"),
    name: name.into(),
    custom: false,
    offered: true,
    stock,
    sell_price: Money::from_rupees(price_rupees),
    reference_price: None,
    variants: Vec::new(),
  };
  repo.save_inventory_item(&item).await.unwrap();
  item
}

pub async fn seed_item_with_variants(repo: &dyn MarketRepository, store: &Store) -> InventoryItem {
  let mut item = InventoryItem {
    id: Uuid::new_v4(),
    store_id: store.id,
    product_id: "toned-milk-1l".into(),
    name: "Toned Milk 1L".into(),
    custom: false,
    offered: true,
    stock: 0,
    sell_price: Money::from_rupees(54),
    reference_price: Some(Money::from_rupees(56)),
    variants: vec![
      VariantListing {
        brand: "Amul".into(),
        price: Money::from_rupees(54),
        reference_price: Some(Money::from_rupees(56)),
        stock: 10,
        offered: true,
      },
      VariantListing {
        brand: "Nandini".into(),
        price: Money::from_rupees(50),
        reference_price: None,
        stock: 7,
        offered: true,
      },
    ],
  };
  item.recompute_stock();
  repo.save_inventory_item(&item).await.unwrap();
  item
}

pub fn line(item: &InventoryItem, quantity: u32) -> CartLine {
  CartLine {
    store_id: item.store_id,
    inventory_item_id: item.id,
    variant: None,
    quantity,
  }
}

pub fn cart_of(lines: Vec<CartLine>) -> Cart {
  let mut cart = Cart::new();
  for l in lines {
    cart.add(l).unwrap();
  }
  cart
}

pub fn delivery_request(customer_id: Uuid, cart: Cart) -> CheckoutRequest {
  CheckoutRequest {
    customer_id,
    cart,
    fulfillment: FulfillmentMode::Delivery,
    schedule: ScheduleRequest::Instant,
    delivery_address: Some("Flat 4B, Indiranagar".into()),
    customer_location: Some(customer_location()),
    payment: PaymentChoice::PayNow { reference: None },
  }
}

pub fn pickup_request(customer_id: Uuid, cart: Cart) -> CheckoutRequest {
  CheckoutRequest {
    fulfillment: FulfillmentMode::Pickup,
    delivery_address: None,
    customer_location: None,
    ..delivery_request(customer_id, cart)
  }
}
