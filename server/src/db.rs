// kirana_server/src/db.rs

//! PostgreSQL backend for live accounts.
//!
//! Each table keeps its identity columns next to a JSONB `body` in the remote
//! row shape, read and written through `kirana::parse`. Every write sends a
//! `pg_notify` on [`CHANGE_CHANNEL`] inside the same transaction, and
//! [`spawn_change_bridge`] republishes those notifications into the
//! in-process change hub.

use async_trait::async_trait;
use kirana::lifecycle::{OrderStatus, PaymentStatus};
use kirana::model::{CatalogProduct, InventoryItem, Order, Profile, Store};
use kirana::parse::{self, ParseError};
use kirana::sync::{ChangeEvent, ChangeKind, Table};
use kirana::{ChangeHub, KiranaError, KiranaResult, MarketRepository, OrderScope};
use serde_json::Value;
use sqlx::postgres::{PgListener, PgPool, PgRow};
use sqlx::{Executor, Postgres, Row};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub const CHANGE_CHANNEL: &str = "market_changes";

const SCHEMA: &[&str] = &[
  "CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    store_id UUID NOT NULL,
    customer_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    version BIGINT NOT NULL DEFAULT 0,
    body JSONB NOT NULL
  )",
  "CREATE INDEX IF NOT EXISTS orders_store_idx ON orders (store_id, created_at DESC)",
  "CREATE INDEX IF NOT EXISTS orders_customer_idx ON orders (customer_id, created_at DESC)",
  "CREATE TABLE IF NOT EXISTS inventory_items (
    id UUID PRIMARY KEY,
    store_id UUID NOT NULL,
    body JSONB NOT NULL
  )",
  "CREATE INDEX IF NOT EXISTS inventory_store_idx ON inventory_items (store_id)",
  "CREATE TABLE IF NOT EXISTS stores (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL,
    body JSONB NOT NULL
  )",
  "CREATE INDEX IF NOT EXISTS stores_owner_idx ON stores (owner_id)",
  "CREATE TABLE IF NOT EXISTS profiles (
    id UUID PRIMARY KEY,
    body JSONB NOT NULL
  )",
  "CREATE TABLE IF NOT EXISTS catalog_products (
    id TEXT PRIMARY KEY,
    body JSONB NOT NULL
  )",
];

fn db_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> KiranaError {
  move |e| KiranaError::backend(operation, e.to_string())
}

fn body(row: &PgRow) -> KiranaResult<Value> {
  row.try_get::<Value, _>("body").map_err(db_err("decode_row"))
}

fn decode<T>(rows: &[PgRow], parse_row: fn(&Value) -> Result<T, ParseError>) -> KiranaResult<Vec<T>> {
  rows.iter().map(|row| Ok(parse_row(&body(row)?)?)).collect()
}

fn decode_one<T>(row: Option<PgRow>, parse_row: fn(&Value) -> Result<T, ParseError>) -> KiranaResult<Option<T>> {
  row.map(|row| Ok(parse_row(&body(&row)?)?)).transpose()
}

fn upsert_kind(row: &PgRow) -> ChangeKind {
  match row.try_get::<bool, _>("inserted") {
    Ok(true) => ChangeKind::Insert,
    _ => ChangeKind::Update,
  }
}

async fn notify<'e, E>(executor: E, event: &ChangeEvent) -> KiranaResult<()>
where
  E: Executor<'e, Database = Postgres>,
{
  let payload = serde_json::to_string(event).map_err(|e| KiranaError::backend("notify", e.to_string()))?;
  sqlx::query("SELECT pg_notify($1, $2)")
    .bind(CHANGE_CHANNEL)
    .bind(payload)
    .execute(executor)
    .await
    .map_err(db_err("notify"))?;
  Ok(())
}

#[derive(Clone)]
pub struct PgRepository {
  pool: PgPool,
}

impl PgRepository {
  pub fn new(pool: PgPool) -> Self {
    PgRepository { pool }
  }

  pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
      sqlx::query(statement).execute(&self.pool).await?;
    }
    info!("Database schema ensured.");
    Ok(())
  }

  async fn update_order(
    &self,
    operation: &'static str,
    id: Uuid,
    expected_version: u64,
    apply: impl FnOnce(&mut Order) + Send,
  ) -> KiranaResult<Order> {
    let mut tx = self.pool.begin().await.map_err(db_err(operation))?;

    let row = sqlx::query("SELECT body FROM orders WHERE id = $1 FOR UPDATE")
      .bind(id)
      .fetch_optional(&mut *tx)
      .await
      .map_err(db_err(operation))?;
    let mut order = match decode_one(row, parse::order_from_value)? {
      Some(order) => order,
      None => return Err(KiranaError::not_found("order", id)),
    };
    if order.version != expected_version {
      return Err(KiranaError::VersionConflict {
        order_id: id,
        expected: expected_version,
        found: order.version,
      });
    }

    apply(&mut order);
    order.version += 1;

    sqlx::query("UPDATE orders SET version = $2, body = $3 WHERE id = $1")
      .bind(id)
      .bind(order.version as i64)
      .bind(parse::order_to_value(&order))
      .execute(&mut *tx)
      .await
      .map_err(db_err(operation))?;
    notify(
      &mut *tx,
      &ChangeEvent::order(ChangeKind::Update, order.id, order.store_id, order.customer_id),
    )
    .await?;
    tx.commit().await.map_err(db_err(operation))?;

    debug!(order_id = %order.id, version = order.version, "Order row updated.");
    Ok(order)
  }
}

#[async_trait]
impl MarketRepository for PgRepository {
  #[instrument(name = "PgRepository::insert_order", skip(self, order), fields(order_id = %order.id))]
  async fn insert_order(&self, order: &Order) -> KiranaResult<()> {
    let mut tx = self.pool.begin().await.map_err(db_err("insert_order"))?;
    sqlx::query(
      "INSERT INTO orders (id, store_id, customer_id, created_at, version, body) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(order.id)
    .bind(order.store_id)
    .bind(order.customer_id)
    .bind(order.created_at)
    .bind(order.version as i64)
    .bind(parse::order_to_value(order))
    .execute(&mut *tx)
    .await
    .map_err(db_err("insert_order"))?;
    notify(
      &mut *tx,
      &ChangeEvent::order(ChangeKind::Insert, order.id, order.store_id, order.customer_id),
    )
    .await?;
    tx.commit().await.map_err(db_err("insert_order"))
  }

  async fn order(&self, id: Uuid) -> KiranaResult<Option<Order>> {
    let row = sqlx::query("SELECT body FROM orders WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err("order"))?;
    decode_one(row, parse::order_from_value)
  }

  async fn orders_for(&self, scope: OrderScope) -> KiranaResult<Vec<Order>> {
    let (sql, id) = match scope {
      OrderScope::Customer(id) => ("SELECT body FROM orders WHERE customer_id = $1 ORDER BY created_at DESC", id),
      OrderScope::Store(id) => ("SELECT body FROM orders WHERE store_id = $1 ORDER BY created_at DESC", id),
    };
    let rows = sqlx::query(sql)
      .bind(id)
      .fetch_all(&self.pool)
      .await
      .map_err(db_err("orders_for"))?;
    decode(&rows, parse::order_from_value)
  }

  async fn all_orders(&self) -> KiranaResult<Vec<Order>> {
    let rows = sqlx::query("SELECT body FROM orders ORDER BY created_at DESC")
      .fetch_all(&self.pool)
      .await
      .map_err(db_err("all_orders"))?;
    decode(&rows, parse::order_from_value)
  }

  async fn write_status(&self, id: Uuid, expected_version: u64, status: OrderStatus) -> KiranaResult<Order> {
    self
      .update_order("write_status", id, expected_version, |order| order.status = status)
      .await
  }

  async fn write_payment_status(&self, id: Uuid, expected_version: u64, status: PaymentStatus) -> KiranaResult<Order> {
    self
      .update_order("write_payment_status", id, expected_version, |order| order.payment_status = status)
      .await
  }

  async fn inventory_for(&self, store_id: Uuid) -> KiranaResult<Vec<InventoryItem>> {
    let rows = sqlx::query("SELECT body FROM inventory_items WHERE store_id = $1 ORDER BY body->>'name'")
      .bind(store_id)
      .fetch_all(&self.pool)
      .await
      .map_err(db_err("inventory_for"))?;
    decode(&rows, parse::inventory_from_value)
  }

  async fn inventory_item(&self, id: Uuid) -> KiranaResult<Option<InventoryItem>> {
    let row = sqlx::query("SELECT body FROM inventory_items WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err("inventory_item"))?;
    decode_one(row, parse::inventory_from_value)
  }

  #[instrument(name = "PgRepository::save_inventory_item", skip(self, item), fields(item_id = %item.id))]
  async fn save_inventory_item(&self, item: &InventoryItem) -> KiranaResult<()> {
    let mut tx = self.pool.begin().await.map_err(db_err("save_inventory_item"))?;
    let row = sqlx::query(
      "INSERT INTO inventory_items (id, store_id, body) VALUES ($1, $2, $3)
       ON CONFLICT (id) DO UPDATE SET store_id = EXCLUDED.store_id, body = EXCLUDED.body
       RETURNING (xmax = 0) AS inserted",
    )
    .bind(item.id)
    .bind(item.store_id)
    .bind(parse::inventory_to_value(item))
    .fetch_one(&mut *tx)
    .await
    .map_err(db_err("save_inventory_item"))?;
    let event = ChangeEvent {
      table: Table::Inventory,
      kind: upsert_kind(&row),
      row_id: item.id.to_string(),
      store_id: Some(item.store_id),
      customer_id: None,
    };
    notify(&mut *tx, &event).await?;
    tx.commit().await.map_err(db_err("save_inventory_item"))
  }

  async fn catalog(&self) -> KiranaResult<Vec<CatalogProduct>> {
    let rows = sqlx::query("SELECT body FROM catalog_products ORDER BY id")
      .fetch_all(&self.pool)
      .await
      .map_err(db_err("catalog"))?;
    decode(&rows, parse::catalog_from_value)
  }

  async fn catalog_product(&self, product_id: &str) -> KiranaResult<Option<CatalogProduct>> {
    let row = sqlx::query("SELECT body FROM catalog_products WHERE id = $1")
      .bind(product_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err("catalog_product"))?;
    decode_one(row, parse::catalog_from_value)
  }

  async fn store(&self, id: Uuid) -> KiranaResult<Option<Store>> {
    let row = sqlx::query("SELECT body FROM stores WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err("store"))?;
    decode_one(row, parse::store_from_value)
  }

  async fn store_for_owner(&self, owner_id: Uuid) -> KiranaResult<Option<Store>> {
    let row = sqlx::query("SELECT body FROM stores WHERE owner_id = $1 LIMIT 1")
      .bind(owner_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err("store_for_owner"))?;
    decode_one(row, parse::store_from_value)
  }

  async fn stores(&self) -> KiranaResult<Vec<Store>> {
    let rows = sqlx::query("SELECT body FROM stores")
      .fetch_all(&self.pool)
      .await
      .map_err(db_err("stores"))?;
    decode(&rows, parse::store_from_value)
  }

  #[instrument(name = "PgRepository::save_store", skip(self, store), fields(store_id = %store.id))]
  async fn save_store(&self, store: &Store) -> KiranaResult<()> {
    let mut tx = self.pool.begin().await.map_err(db_err("save_store"))?;
    let row = sqlx::query(
      "INSERT INTO stores (id, owner_id, body) VALUES ($1, $2, $3)
       ON CONFLICT (id) DO UPDATE SET owner_id = EXCLUDED.owner_id, body = EXCLUDED.body
       RETURNING (xmax = 0) AS inserted",
    )
    .bind(store.id)
    .bind(store.owner_id)
    .bind(parse::store_to_value(store))
    .fetch_one(&mut *tx)
    .await
    .map_err(db_err("save_store"))?;
    let event = ChangeEvent {
      table: Table::Stores,
      kind: upsert_kind(&row),
      row_id: store.id.to_string(),
      store_id: Some(store.id),
      customer_id: None,
    };
    notify(&mut *tx, &event).await?;
    tx.commit().await.map_err(db_err("save_store"))
  }

  async fn profile(&self, user_id: Uuid) -> KiranaResult<Option<Profile>> {
    let row = sqlx::query("SELECT body FROM profiles WHERE id = $1")
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err("profile"))?;
    decode_one(row, parse::profile_from_value)
  }

  async fn save_profile(&self, profile: &Profile) -> KiranaResult<()> {
    let mut tx = self.pool.begin().await.map_err(db_err("save_profile"))?;
    let row = sqlx::query(
      "INSERT INTO profiles (id, body) VALUES ($1, $2)
       ON CONFLICT (id) DO UPDATE SET body = EXCLUDED.body
       RETURNING (xmax = 0) AS inserted",
    )
    .bind(profile.user_id)
    .bind(parse::profile_to_value(profile))
    .fetch_one(&mut *tx)
    .await
    .map_err(db_err("save_profile"))?;
    let event = ChangeEvent {
      table: Table::Profiles,
      kind: upsert_kind(&row),
      row_id: profile.user_id.to_string(),
      store_id: None,
      customer_id: None,
    };
    notify(&mut *tx, &event).await?;
    tx.commit().await.map_err(db_err("save_profile"))
  }
}

/// Listens on [`CHANGE_CHANNEL`] and republishes each notification into
/// `hub`. The listener reconnects on its own after a dropped connection.
pub async fn spawn_change_bridge(pool: &PgPool, hub: ChangeHub) -> Result<JoinHandle<()>, sqlx::Error> {
  let mut listener = PgListener::connect_with(pool).await?;
  listener.listen(CHANGE_CHANNEL).await?;
  info!(channel = CHANGE_CHANNEL, "Listening for market changes.");

  Ok(tokio::spawn(async move {
    loop {
      match listener.recv().await {
        Ok(notification) => match serde_json::from_str::<ChangeEvent>(notification.payload()) {
          Ok(event) => {
            let delivered = hub.publish(event);
            debug!(delivered, "Change notification republished.");
          }
          Err(e) => warn!(error = %e, payload = notification.payload(), "Ignoring malformed change notification."),
        },
        Err(e) => {
          warn!(error = %e, "Change listener lost its connection; retrying.");
          tokio::time::sleep(Duration::from_secs(1)).await;
        }
      }
    }
  }))
}
