// kirana_server/src/web/handlers/owner_handlers.rs

use actix_web::{web, HttpResponse};
use kirana::model::{StoreUpdate, VariantUpdate};
use kirana::{CustomProduct, KiranaError, ListingUpdate, Session};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::VersionGuard;
use crate::errors::Result;
use crate::state::AppState;
use crate::web::extractors::Identity;

/// The owner session and its store id.
async fn owner_session(state: &AppState, identity: &Identity) -> Result<(Session, Uuid)> {
  let session = identity.session(state).await?;
  let store_id = session
    .store()
    .map(|store| store.id)
    .ok_or(KiranaError::StoreNotLinked { owner_id: identity.user_id })?;
  Ok((session, store_id))
}

#[instrument(name = "handler::accept_order", skip(state, identity, guard), fields(user_id = %identity.user_id))]
pub async fn accept_order_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
  guard: Option<web::Json<VersionGuard>>,
) -> Result<HttpResponse> {
  let (session, store_id) = owner_session(&state, &identity).await?;
  let order = state
    .market
    .order_desk(session.mode())
    .accept(store_id, path.into_inner(), guard.and_then(|g| g.version))
    .await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::advance_order", skip(state, identity, guard), fields(user_id = %identity.user_id))]
pub async fn advance_order_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
  guard: Option<web::Json<VersionGuard>>,
) -> Result<HttpResponse> {
  let (session, store_id) = owner_session(&state, &identity).await?;
  let order = state
    .market
    .order_desk(session.mode())
    .advance(store_id, path.into_inner(), guard.and_then(|g| g.version))
    .await?;
  info!(order_id = %order.id, status = %order.status, "Order advanced by owner.");
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::reject_order", skip(state, identity, guard), fields(user_id = %identity.user_id))]
pub async fn reject_order_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
  guard: Option<web::Json<VersionGuard>>,
) -> Result<HttpResponse> {
  let (session, store_id) = owner_session(&state, &identity).await?;
  let order = state
    .market
    .order_desk(session.mode())
    .reject(store_id, path.into_inner(), guard.and_then(|g| g.version))
    .await?;
  Ok(HttpResponse::Ok().json(order))
}

pub async fn list_inventory_handler(state: web::Data<AppState>, identity: Identity) -> Result<HttpResponse> {
  let (session, store_id) = owner_session(&state, &identity).await?;
  let items = state.market.inventory_desk(session.mode(), store_id).load().await?;
  Ok(HttpResponse::Ok().json(items))
}

#[instrument(name = "handler::update_listing", skip(state, identity, update), fields(user_id = %identity.user_id))]
pub async fn update_listing_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
  update: web::Json<ListingUpdate>,
) -> Result<HttpResponse> {
  let (session, store_id) = owner_session(&state, &identity).await?;
  let item = state
    .market
    .inventory_desk(session.mode(), store_id)
    .apply(path.into_inner(), update.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::toggle_listing", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn toggle_listing_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let (session, store_id) = owner_session(&state, &identity).await?;
  let item = state
    .market
    .inventory_desk(session.mode(), store_id)
    .toggle(path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(item))
}

pub async fn update_variant_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<(Uuid, String)>,
  update: web::Json<VariantUpdate>,
) -> Result<HttpResponse> {
  let (session, store_id) = owner_session(&state, &identity).await?;
  let (item_id, brand) = path.into_inner();
  let item = state
    .market
    .inventory_desk(session.mode(), store_id)
    .set_variant(item_id, &brand, update.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(item))
}

pub async fn browse_catalog_handler(state: web::Data<AppState>, identity: Identity) -> Result<HttpResponse> {
  let catalog = state.market.repository(identity.mode).catalog().await?;
  Ok(HttpResponse::Ok().json(catalog))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListingPayload {
  pub product_id: String,
  #[serde(flatten)]
  pub listing: ListingUpdate,
}

#[instrument(name = "handler::list_catalog_product", skip(state, identity, payload), fields(user_id = %identity.user_id))]
pub async fn list_catalog_product_handler(
  state: web::Data<AppState>,
  identity: Identity,
  payload: web::Json<CatalogListingPayload>,
) -> Result<HttpResponse> {
  let (session, store_id) = owner_session(&state, &identity).await?;
  let payload = payload.into_inner();
  let item = state
    .market
    .inventory_desk(session.mode(), store_id)
    .list_catalog_product(&payload.product_id, payload.listing)
    .await?;
  Ok(HttpResponse::Created().json(item))
}

#[instrument(name = "handler::add_custom_product", skip(state, identity, product), fields(user_id = %identity.user_id))]
pub async fn add_custom_product_handler(
  state: web::Data<AppState>,
  identity: Identity,
  product: web::Json<CustomProduct>,
) -> Result<HttpResponse> {
  let (session, store_id) = owner_session(&state, &identity).await?;
  let item = state
    .market
    .inventory_desk(session.mode(), store_id)
    .add_custom_product(product.into_inner())
    .await?;
  Ok(HttpResponse::Created().json(item))
}

pub async fn update_store_handler(
  state: web::Data<AppState>,
  identity: Identity,
  update: web::Json<StoreUpdate>,
) -> Result<HttpResponse> {
  let session = identity.session(&state).await?;
  let store = state.market.update_store(&session, update.into_inner()).await?;
  Ok(HttpResponse::Ok().json(store))
}
