// kirana_server/src/web/handlers/profile_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::web::extractors::Identity;

/// Opens the caller's session, creating a minimal profile on first visit.
#[instrument(name = "handler::session", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn session_handler(state: web::Data<AppState>, identity: Identity) -> Result<HttpResponse> {
  let session = identity.session(&state).await?;
  Ok(HttpResponse::Ok().json(session))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
  pub display_name: Option<String>,
  pub phone: Option<String>,
}

pub async fn update_profile_handler(
  state: web::Data<AppState>,
  identity: Identity,
  payload: web::Json<ProfilePayload>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  if payload.display_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
    return Err(AppError::Validation("Display name cannot be blank.".to_string()));
  }
  let session = identity.session(&state).await?;
  let profile = state
    .market
    .update_profile(&session, payload.display_name, payload.phone)
    .await?;
  Ok(HttpResponse::Ok().json(profile))
}
