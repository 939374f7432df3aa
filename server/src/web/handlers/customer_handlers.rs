// kirana_server/src/web/handlers/customer_handlers.rs

use actix_web::{web, HttpResponse};
use kirana::checkout::Cart;
use kirana::geo::{straight_line_estimate, GeoPoint};
use kirana::{CheckoutRequest, FulfillmentMode, PaymentChoice, ScheduleRequest, Session};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::VersionGuard;
use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::web::extractors::Identity;

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
  pub lat: f64,
  pub lng: f64,
}

#[instrument(name = "handler::nearby_stores", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn nearby_stores_handler(
  state: web::Data<AppState>,
  identity: Identity,
  query: web::Query<NearbyQuery>,
) -> Result<HttpResponse> {
  let origin = GeoPoint::new(query.lat, query.lng);
  if !origin.is_valid() {
    return Err(AppError::Validation("Coordinates out of range.".to_string()));
  }
  let stores = state.market.discover_stores(identity.mode, origin).await?;
  Ok(HttpResponse::Ok().json(stores))
}

/// What a customer can buy from one store right now.
pub async fn store_shelf_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let store_id = path.into_inner();
  let items: Vec<_> = state
    .market
    .repository(identity.mode)
    .inventory_for(store_id)
    .await?
    .into_iter()
    .filter(|item| item.offered)
    .collect();
  Ok(HttpResponse::Ok().json(items))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
  pub cart: Cart,
  pub fulfillment: FulfillmentMode,
  #[serde(default)]
  pub schedule: ScheduleRequest,
  pub delivery_address: Option<String>,
  pub customer_location: Option<GeoPoint>,
  pub payment: PaymentChoice,
}

#[instrument(name = "handler::checkout", skip(state, identity, payload), fields(user_id = %identity.user_id))]
pub async fn checkout_handler(
  state: web::Data<AppState>,
  identity: Identity,
  payload: web::Json<CheckoutPayload>,
) -> Result<HttpResponse> {
  let session = identity.session(&state).await?;
  if !matches!(session, Session::Customer { .. }) {
    return Err(AppError::Auth("Only customers can place orders.".to_string()));
  }

  let payload = payload.into_inner();
  let request = CheckoutRequest {
    customer_id: session.user_id(),
    cart: payload.cart,
    fulfillment: payload.fulfillment,
    schedule: payload.schedule,
    delivery_address: payload.delivery_address,
    customer_location: payload.customer_location,
    payment: payload.payment,
  };

  let order = state.market.checkout(session.mode()).place(request).await?;
  info!(order_id = %order.id, total = %order.total, "Order placed.");
  Ok(HttpResponse::Created().json(order))
}

pub async fn list_orders_handler(state: web::Data<AppState>, identity: Identity) -> Result<HttpResponse> {
  let session = identity.session(&state).await?;
  let orders = state.market.order_desk(session.mode()).orders(session.order_scope()).await?;
  Ok(HttpResponse::Ok().json(orders))
}

pub async fn get_order_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let session = identity.session(&state).await?;
  let order = state
    .market
    .order_desk(session.mode())
    .order(session.order_scope(), path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(order))
}

pub async fn track_order_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let session = identity.session(&state).await?;
  let tracking = state
    .market
    .order_desk(session.mode())
    .track(session.order_scope(), path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(tracking))
}

#[instrument(name = "handler::cancel_order", skip(state, identity, guard), fields(user_id = %identity.user_id))]
pub async fn cancel_order_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
  guard: Option<web::Json<VersionGuard>>,
) -> Result<HttpResponse> {
  let session = identity.session(&state).await?;
  let version = guard.and_then(|g| g.version);
  let order = state
    .market
    .order_desk(session.mode())
    .cancel(session.order_scope(), path.into_inner(), version)
    .await?;
  Ok(HttpResponse::Ok().json(order))
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentConfirmation {
  pub reference: Option<String>,
}

#[instrument(name = "handler::confirm_payment", skip(state, identity, body), fields(user_id = %identity.user_id))]
pub async fn confirm_payment_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
  body: Option<web::Json<PaymentConfirmation>>,
) -> Result<HttpResponse> {
  let session = identity.session(&state).await?;
  let reference = body.and_then(|b| b.into_inner().reference);
  let order = state
    .market
    .order_desk(session.mode())
    .confirm_payment(session.order_scope(), path.into_inner(), reference)
    .await?;
  Ok(HttpResponse::Ok().json(order))
}

/// Straight-line route between the order's store and delivery point.
pub async fn route_estimate_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let session = identity.session(&state).await?;
  let order = state
    .market
    .order_desk(session.mode())
    .order(session.order_scope(), path.into_inner())
    .await?;
  let (Some(from), Some(to)) = (order.store_location, order.customer_location) else {
    return Err(AppError::Validation("Order has no store or delivery coordinates.".to_string()));
  };
  let route = straight_line_estimate(from, to, state.market.config().fallback_speed_kmh);
  Ok(HttpResponse::Ok().json(route))
}
