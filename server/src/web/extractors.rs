// kirana_server/src/web/extractors.rs

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use kirana::{AccountMode, Role, Session};
use tracing::warn;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::state::AppState;

/// Caller identity taken from request headers.
///
/// `X-User-ID` is required. `X-Role` (`customer` or `store_owner`) and
/// `X-Account-Mode` (`live` or `demo`) default to a live customer. Upstream
/// authentication is expected to have set these.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
  pub user_id: Uuid,
  pub role: Role,
  pub mode: AccountMode,
}

impl Identity {
  /// Opens (and self-heals) the session for this caller.
  pub async fn session(&self, state: &AppState) -> Result<Session> {
    Ok(state.market.open_session(self.user_id, self.role, self.mode).await?)
  }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
  req.headers().get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn identity_from(req: &HttpRequest) -> Result<Identity> {
  let user_id = header(req, "X-User-ID")
    .and_then(|raw| Uuid::parse_str(raw).ok())
    .ok_or_else(|| AppError::Auth("Missing or invalid X-User-ID header.".to_string()))?;

  let role = match header(req, "X-Role") {
    None => Role::Customer,
    Some(raw) => Role::from_tag(raw).ok_or_else(|| AppError::Auth(format!("Unknown role '{}'.", raw)))?,
  };

  let mode = match header(req, "X-Account-Mode").map(str::to_ascii_lowercase).as_deref() {
    None | Some("live") => AccountMode::Live,
    Some("demo") => AccountMode::Demo,
    Some(other) => return Err(AppError::Validation(format!("Unknown account mode '{}'.", other))),
  };

  Ok(Identity { user_id, role, mode })
}

impl FromRequest for Identity {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let identity = identity_from(req);
    if let Err(e) = &identity {
      warn!(error = %e, "Identity extractor rejected request.");
    }
    ready(identity)
  }
}
