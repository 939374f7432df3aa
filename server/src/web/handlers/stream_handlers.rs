// kirana_server/src/web/handlers/stream_handlers.rs

//! Server-sent events carrying whole order snapshots.

use actix_web::http::header;
use actix_web::web::{self, Bytes};
use actix_web::HttpResponse;
use futures_util::stream;
use kirana::{OrderSnapshot, OrderWatcher};
use tracing::{debug, info, instrument};

use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::web::extractors::Identity;

fn sse_frame(snapshot: &OrderSnapshot) -> Result<Bytes> {
  let data = serde_json::to_string(snapshot).map_err(|e| AppError::Internal(e.to_string()))?;
  Ok(Bytes::from(format!("event: orders\nid: {}\ndata: {}\n\n", snapshot.revision, data)))
}

/// Streams the session's orders: the current snapshot first, then one frame
/// per re-fetch. Demo sessions see the simulator's writes the same way.
/// The watcher lives inside the stream, so a closed connection unsubscribes.
#[instrument(name = "handler::order_stream", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn order_stream_handler(state: web::Data<AppState>, identity: Identity) -> Result<HttpResponse> {
  let session = identity.session(&state).await?;
  let watcher = state.market.watch_orders(&session).await?;
  info!(scope = ?watcher.scope(), "Order stream opened.");

  let frames = stream::unfold((watcher, true), |(mut watcher, first): (OrderWatcher, bool)| async move {
    let snapshot = if first {
      watcher.current()
    } else {
      match watcher.changed().await {
        Some(snapshot) => snapshot,
        None => {
          debug!("Order watcher closed; ending stream.");
          return None;
        }
      }
    };
    Some((sse_frame(&snapshot), (watcher, false)))
  });

  Ok(
    HttpResponse::Ok()
      .insert_header((header::CONTENT_TYPE, "text/event-stream"))
      .insert_header((header::CACHE_CONTROL, "no-cache"))
      .streaming(frames),
  )
}
