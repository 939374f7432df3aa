// kirana/src/parse.rs

//! Conversion between untyped remote rows and the typed records.
//!
//! Remote rows are snake_case JSON with prices in rupees. Older rows also use
//! camelCase keys, numeric strings, and line items stored as a JSON string,
//! so the readers accept every spelling seen in the wild and fail with a
//! [`ParseError`] naming the record and field when something required is
//! absent or unusable.

use crate::geo::GeoPoint;
use crate::lifecycle::{FulfillmentMode, OrderStatus, PaymentStatus};
use crate::model::{
  CatalogBrand, CatalogProduct, DeliveryFee, DeliverySchedule, FeePayee, InventoryItem, LineItem, Money, Order,
  PaymentSplit, Profile, Store, StoreCategory, VariantListing,
};
use crate::session::{AccountMode, Role};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ParseError {
  #[error("{record} payload is not a JSON object")]
  NotAnObject { record: &'static str },

  #[error("{record} is missing required field '{field}'")]
  MissingField { record: &'static str, field: &'static str },

  #[error("{record} field '{field}' is invalid: {reason}")]
  InvalidField {
    record: &'static str,
    field: &'static str,
    reason: String,
  },

  #[error("{record} payload is malformed: {source}")]
  Malformed {
    record: &'static str,
    #[source]
    source: serde_json::Error,
  },
}

type ParseResult<T> = Result<T, ParseError>;

fn key(keys: &[&'static str]) -> &'static str {
  keys.first().copied().unwrap_or("")
}

fn money_value(v: &Value) -> Option<Money> {
  match v {
    Value::Number(n) => n.as_f64().and_then(Money::from_rupees_f64),
    Value::String(s) => s.trim().trim_start_matches('₹').trim().parse::<f64>().ok().and_then(Money::from_rupees_f64),
    _ => None,
  }
}

fn rupees(m: Money) -> Value {
  json!(m.as_rupees_f64())
}

/// Key lookup over one remote object.
struct Fields<'a> {
  record: &'static str,
  obj: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
  fn of(record: &'static str, value: &'a Value) -> ParseResult<Self> {
    match value {
      Value::Object(obj) => Ok(Fields { record, obj }),
      _ => Err(ParseError::NotAnObject { record }),
    }
  }

  fn get(&self, keys: &[&'static str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| self.obj.get(*k).filter(|v| !v.is_null()))
  }

  fn require(&self, keys: &[&'static str]) -> ParseResult<&'a Value> {
    self.get(keys).ok_or(ParseError::MissingField {
      record: self.record,
      field: key(keys),
    })
  }

  fn invalid(&self, keys: &[&'static str], reason: impl Into<String>) -> ParseError {
    ParseError::InvalidField {
      record: self.record,
      field: key(keys),
      reason: reason.into(),
    }
  }

  fn as_text(&self, keys: &[&'static str], v: &Value) -> ParseResult<String> {
    match v {
      Value::String(s) => Ok(s.clone()),
      Value::Number(n) => Ok(n.to_string()),
      other => Err(self.invalid(keys, format!("expected text, got {other}"))),
    }
  }

  fn string(&self, keys: &[&'static str]) -> ParseResult<String> {
    let v = self.require(keys)?;
    self.as_text(keys, v)
  }

  fn opt_string(&self, keys: &[&'static str]) -> ParseResult<Option<String>> {
    self.get(keys).map(|v| self.as_text(keys, v)).transpose()
  }

  fn uuid(&self, keys: &[&'static str]) -> ParseResult<Uuid> {
    let raw = self.string(keys)?;
    Uuid::parse_str(raw.trim()).map_err(|e| self.invalid(keys, e.to_string()))
  }

  fn money(&self, keys: &[&'static str]) -> ParseResult<Money> {
    let v = self.require(keys)?;
    self.as_money(keys, v)
  }

  fn opt_money(&self, keys: &[&'static str]) -> ParseResult<Option<Money>> {
    self.get(keys).map(|v| self.as_money(keys, v)).transpose()
  }

  fn as_money(&self, keys: &[&'static str], v: &Value) -> ParseResult<Money> {
    match money_value(v) {
      Some(m) if !m.is_negative() => Ok(m),
      Some(_) => Err(self.invalid(keys, "negative amount")),
      None => Err(self.invalid(keys, format!("not an amount: {v}"))),
    }
  }

  fn bool_or(&self, keys: &[&'static str], default: bool) -> ParseResult<bool> {
    match self.get(keys) {
      None => Ok(default),
      Some(Value::Bool(b)) => Ok(*b),
      Some(Value::Number(n)) => Ok(n.as_i64().unwrap_or(0) != 0),
      Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(self.invalid(keys, format!("not a flag: {s}"))),
      },
      Some(other) => Err(self.invalid(keys, format!("not a flag: {other}"))),
    }
  }

  fn count_or(&self, keys: &[&'static str], default: u32) -> ParseResult<u32> {
    let Some(v) = self.get(keys) else {
      return Ok(default);
    };
    let parsed = match v {
      Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
      Value::String(s) => s.trim().parse::<u64>().ok(),
      _ => None,
    };
    parsed
      .and_then(|n| u32::try_from(n).ok())
      .ok_or_else(|| self.invalid(keys, format!("not a non-negative count: {v}")))
  }

  fn timestamp(&self, keys: &[&'static str]) -> ParseResult<DateTime<Utc>> {
    let raw = self.string(keys)?;
    DateTime::parse_from_rfc3339(raw.trim())
      .map(|t| t.with_timezone(&Utc))
      .map_err(|e| self.invalid(keys, e.to_string()))
  }

  fn opt_timestamp(&self, keys: &[&'static str]) -> ParseResult<Option<DateTime<Utc>>> {
    match self.get(keys) {
      None => Ok(None),
      Some(_) => self.timestamp(keys).map(Some),
    }
  }

  fn coordinate(&self, keys: &[&'static str]) -> ParseResult<Option<f64>> {
    match self.get(keys) {
      None => Ok(None),
      Some(Value::Number(n)) => Ok(n.as_f64()),
      Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|e| self.invalid(keys, e.to_string())),
      Some(other) => Err(self.invalid(keys, format!("not a coordinate: {other}"))),
    }
  }

  /// A point from flat lat/lng columns, or from a nested `{lat, lng}` object.
  fn point(&self, nested: &[&'static str], lat: &[&'static str], lng: &[&'static str]) -> ParseResult<Option<GeoPoint>> {
    if let Some(v) = self.get(nested) {
      let point: GeoPoint = serde_json::from_value(v.clone()).map_err(|e| self.invalid(nested, e.to_string()))?;
      return self.checked_point(nested, point).map(Some);
    }
    match (self.coordinate(lat)?, self.coordinate(lng)?) {
      (Some(lat_v), Some(lng_v)) => self.checked_point(lat, GeoPoint::new(lat_v, lng_v)).map(Some),
      _ => Ok(None),
    }
  }

  fn checked_point(&self, keys: &[&'static str], point: GeoPoint) -> ParseResult<GeoPoint> {
    if point.is_valid() {
      Ok(point)
    } else {
      Err(self.invalid(keys, "coordinates out of range"))
    }
  }

  /// An array, or an array that was stored as a JSON string.
  fn list(&self, keys: &[&'static str]) -> ParseResult<Vec<Value>> {
    match self.get(keys) {
      None => Ok(Vec::new()),
      Some(Value::Array(items)) => Ok(items.clone()),
      Some(Value::String(s)) => match serde_json::from_str::<Value>(s).map_err(|source| ParseError::Malformed {
        record: self.record,
        source,
      })? {
        Value::Array(items) => Ok(items),
        _ => Err(self.invalid(keys, "expected a list")),
      },
      Some(_) => Err(self.invalid(keys, "expected a list")),
    }
  }
}

fn line_item_from_value(value: &Value) -> ParseResult<LineItem> {
  let f = Fields::of("order item", value)?;
  let quantity = f.count_or(&["quantity", "qty"], 1)?;
  if quantity == 0 {
    return Err(f.invalid(&["quantity"], "must be at least 1"));
  }
  Ok(LineItem {
    product_id: f.string(&["product_id", "productId", "id"])?,
    name: f.opt_string(&["name", "product_name"])?.unwrap_or_default(),
    variant: f.opt_string(&["variant", "brand", "selected_brand", "selectedBrand"])?,
    quantity,
    unit_price: f.money(&["price", "unit_price", "unitPrice"])?,
    catalog_item_id: f.opt_string(&["catalog_item_id", "catalogItemId", "inventory_id"])?,
  })
}

fn payment_split_from_value(value: &Value) -> ParseResult<PaymentSplit> {
  let f = Fields::of("payment split", value)?;
  let delivery_fee = match f.opt_money(&["delivery_fee", "deliveryFee"])? {
    None => None,
    Some(amount) => {
      let payee = match f.opt_string(&["delivery_fee_payee", "deliveryFeePayee", "payee"])? {
        None => FeePayee::DeliveryPartner,
        Some(tag) => serde_json::from_value(Value::String(tag.to_ascii_uppercase()))
          .map_err(|e| f.invalid(&["delivery_fee_payee"], e.to_string()))?,
      };
      Some(DeliveryFee { amount, payee })
    }
  };
  Ok(PaymentSplit {
    store_amount: f.money(&["store_amount", "storeAmount"])?,
    platform_fee: f.opt_money(&["platform_fee", "platformFee"])?,
    delivery_fee,
  })
}

pub fn order_from_value(value: &Value) -> ParseResult<Order> {
  let f = Fields::of("order", value)?;

  let items = f
    .list(&["items", "order_items"])?
    .iter()
    .map(line_item_from_value)
    .collect::<ParseResult<Vec<_>>>()?;

  let status = OrderStatus::from_remote(&f.string(&["status"])?);

  let payment_status = match f.opt_string(&["payment_status", "paymentStatus"])? {
    None => PaymentStatus::Paid,
    Some(s) => match s.trim().to_ascii_uppercase().as_str() {
      "PAID" => PaymentStatus::Paid,
      "PENDING" => PaymentStatus::Pending,
      _ => return Err(f.invalid(&["payment_status"], format!("unknown payment status '{s}'"))),
    },
  };

  let fulfillment = match f.opt_string(&["delivery_mode", "deliveryMode", "fulfillment"])? {
    None => FulfillmentMode::Delivery,
    Some(s) => match s.trim().to_ascii_uppercase().as_str() {
      "DELIVERY" => FulfillmentMode::Delivery,
      "PICKUP" => FulfillmentMode::Pickup,
      _ => return Err(f.invalid(&["delivery_mode"], format!("unknown delivery mode '{s}'"))),
    },
  };

  let delivery = match f.opt_string(&["delivery_type", "deliveryType"])?.map(|s| s.trim().to_ascii_uppercase()) {
    Some(kind) if kind == "SCHEDULED" => {
      let at = f.timestamp(&["scheduled_time", "scheduledTime"])?;
      let pay_by = f.opt_timestamp(&["payment_deadline", "paymentDeadline"])?.unwrap_or(at);
      DeliverySchedule::Scheduled { at, pay_by }
    }
    _ => DeliverySchedule::Instant,
  };

  let payment_split = f
    .get(&["payment_split", "paymentSplit"])
    .map(payment_split_from_value)
    .transpose()?;

  let version = match f.get(&["version"]) {
    None => 0,
    Some(v) => v.as_u64().ok_or_else(|| f.invalid(&["version"], format!("not a version: {v}")))?,
  };

  Ok(Order {
    id: f.uuid(&["id"])?,
    created_at: f.timestamp(&["created_at", "createdAt"])?,
    items,
    total: f.money(&["total_amount", "total", "totalAmount"])?,
    status,
    payment_status,
    fulfillment,
    delivery,
    delivery_address: f.opt_string(&["delivery_address", "deliveryAddress", "address"])?,
    store_id: f.uuid(&["store_id", "storeId"])?,
    customer_id: f.uuid(&["customer_id", "customerId", "user_id"])?,
    store_location: f.point(&["store_location", "storeLocation"], &["store_lat"], &["store_lng"])?,
    customer_location: f.point(&["customer_location", "customerLocation"], &["customer_lat"], &["customer_lng"])?,
    payment_split,
    version,
  })
}

pub fn order_to_value(order: &Order) -> Value {
  let items: Vec<Value> = order
    .items
    .iter()
    .map(|item| {
      json!({
        "product_id": item.product_id,
        "name": item.name,
        "variant": item.variant,
        "quantity": item.quantity,
        "price": rupees(item.unit_price),
        "catalog_item_id": item.catalog_item_id,
      })
    })
    .collect();

  let (delivery_type, scheduled_time, payment_deadline) = match order.delivery {
    DeliverySchedule::Instant => ("INSTANT", None, None),
    DeliverySchedule::Scheduled { at, pay_by } => ("SCHEDULED", Some(at.to_rfc3339()), Some(pay_by.to_rfc3339())),
  };

  let payment_split = order.payment_split.map(|split| {
    json!({
      "store_amount": rupees(split.store_amount),
      "platform_fee": split.platform_fee.map(rupees),
      "delivery_fee": split.delivery_fee.map(|f| rupees(f.amount)),
      "delivery_fee_payee": split.delivery_fee.map(|f| f.payee),
    })
  });

  json!({
    "id": order.id,
    "created_at": order.created_at.to_rfc3339(),
    "items": items,
    "total_amount": rupees(order.total),
    "status": order.status.as_str(),
    "payment_status": order.payment_status,
    "delivery_mode": order.fulfillment,
    "delivery_type": delivery_type,
    "scheduled_time": scheduled_time,
    "payment_deadline": payment_deadline,
    "delivery_address": order.delivery_address,
    "store_id": order.store_id,
    "customer_id": order.customer_id,
    "store_lat": order.store_location.map(|p| p.lat),
    "store_lng": order.store_location.map(|p| p.lng),
    "customer_lat": order.customer_location.map(|p| p.lat),
    "customer_lng": order.customer_location.map(|p| p.lng),
    "payment_split": payment_split,
    "version": order.version,
  })
}

fn variant_from_value(value: &Value) -> ParseResult<VariantListing> {
  let f = Fields::of("inventory variant", value)?;
  Ok(VariantListing {
    brand: f.string(&["brand", "name"])?,
    price: f.money(&["price", "sell_price"])?,
    reference_price: f.opt_money(&["mrp", "reference_price", "referencePrice"])?,
    stock: f.count_or(&["stock", "quantity"], 0)?,
    offered: f.bool_or(&["in_stock", "inStock", "offered"], true)?,
  })
}

pub fn inventory_from_value(value: &Value) -> ParseResult<InventoryItem> {
  let f = Fields::of("inventory item", value)?;
  let variants = f
    .list(&["variants", "brands"])?
    .iter()
    .map(variant_from_value)
    .collect::<ParseResult<Vec<_>>>()?;

  let mut item = InventoryItem {
    id: f.uuid(&["id"])?,
    store_id: f.uuid(&["store_id", "storeId"])?,
    product_id: f.string(&["product_id", "productId"])?,
    name: f.opt_string(&["name", "product_name"])?.unwrap_or_default(),
    custom: f.bool_or(&["is_custom", "isCustom", "custom"], false)?,
    offered: f.bool_or(&["in_stock", "inStock", "offered", "is_active"], true)?,
    stock: f.count_or(&["quantity", "stock"], 0)?,
    sell_price: f.money(&["price", "sell_price", "sellPrice"])?,
    reference_price: f.opt_money(&["mrp", "reference_price", "referencePrice"])?,
    variants,
  };
  item.recompute_stock();
  Ok(item)
}

pub fn inventory_to_value(item: &InventoryItem) -> Value {
  let variants: Vec<Value> = item
    .variants
    .iter()
    .map(|v| {
      json!({
        "brand": v.brand,
        "price": rupees(v.price),
        "mrp": v.reference_price.map(rupees),
        "stock": v.stock,
        "in_stock": v.offered,
      })
    })
    .collect();

  json!({
    "id": item.id,
    "store_id": item.store_id,
    "product_id": item.product_id,
    "name": item.name,
    "is_custom": item.custom,
    "in_stock": item.offered,
    "quantity": item.stock,
    "price": rupees(item.sell_price),
    "mrp": item.reference_price.map(rupees),
    "variants": variants,
  })
}

pub fn store_from_value(value: &Value) -> ParseResult<Store> {
  let f = Fields::of("store", value)?;
  Ok(Store {
    id: f.uuid(&["id"])?,
    owner_id: f.uuid(&["owner_id", "ownerId"])?,
    name: f.string(&["name", "store_name"])?,
    address: f.opt_string(&["address"])?.unwrap_or_default(),
    location: f.point(&["location"], &["latitude", "lat"], &["longitude", "lng"])?,
    is_open: f.bool_or(&["is_open", "isOpen"], true)?,
    category: f
      .opt_string(&["category"])?
      .map(|tag| StoreCategory::from_tag(&tag))
      .unwrap_or_default(),
    payment_id: f.opt_string(&["upi_id", "payment_id", "paymentId"])?,
  })
}

pub fn store_to_value(store: &Store) -> Value {
  json!({
    "id": store.id,
    "owner_id": store.owner_id,
    "name": store.name,
    "address": store.address,
    "latitude": store.location.map(|p| p.lat),
    "longitude": store.location.map(|p| p.lng),
    "is_open": store.is_open,
    "category": store.category,
    "upi_id": store.payment_id,
  })
}

pub fn profile_from_value(value: &Value) -> ParseResult<Profile> {
  let f = Fields::of("profile", value)?;
  let role_tag = f.string(&["role"])?;
  let role = Role::from_tag(&role_tag).ok_or_else(|| f.invalid(&["role"], format!("unknown role '{role_tag}'")))?;

  let mode = match f.opt_string(&["account_type", "accountType", "mode"])? {
    Some(tag) if tag.eq_ignore_ascii_case("demo") => AccountMode::Demo,
    Some(_) => AccountMode::Live,
    None if f.bool_or(&["is_demo", "isDemo"], false)? => AccountMode::Demo,
    None => AccountMode::Live,
  };

  Ok(Profile {
    user_id: f.uuid(&["id", "user_id", "userId"])?,
    display_name: f.opt_string(&["full_name", "display_name", "name"])?.unwrap_or_default(),
    phone: f.opt_string(&["phone"])?,
    role,
    mode,
    created_at: f.opt_timestamp(&["created_at", "createdAt"])?.unwrap_or_else(Utc::now),
  })
}

pub fn profile_to_value(profile: &Profile) -> Value {
  json!({
    "id": profile.user_id,
    "full_name": profile.display_name,
    "phone": profile.phone,
    "role": profile.role,
    "account_type": profile.mode,
    "created_at": profile.created_at.to_rfc3339(),
  })
}

pub fn catalog_from_value(value: &Value) -> ParseResult<CatalogProduct> {
  let f = Fields::of("catalog product", value)?;
  let brands = f
    .list(&["brands", "variants"])?
    .iter()
    .map(|v| -> ParseResult<CatalogBrand> {
      let b = Fields::of("catalog brand", v)?;
      Ok(CatalogBrand {
        brand: b.string(&["brand", "name"])?,
        price: b.money(&["price"])?,
        reference_price: b.opt_money(&["mrp", "reference_price"])?,
      })
    })
    .collect::<ParseResult<Vec<_>>>()?;

  Ok(CatalogProduct {
    id: f.string(&["id", "product_id"])?,
    name: f.string(&["name"])?,
    unit: f.opt_string(&["unit"])?,
    price: f.money(&["price", "default_price"])?,
    reference_price: f.opt_money(&["mrp", "reference_price"])?,
    brands,
  })
}

pub fn catalog_to_value(product: &CatalogProduct) -> Value {
  let brands: Vec<Value> = product
    .brands
    .iter()
    .map(|b| json!({ "brand": b.brand, "price": rupees(b.price), "mrp": b.reference_price.map(rupees) }))
    .collect();
  json!({
    "id": product.id,
    "name": product.name,
    "unit": product.unit,
    "price": rupees(product.price),
    "mrp": product.reference_price.map(rupees),
    "brands": brands,
  })
}
