// kirana_server/src/web/handlers/mod.rs

pub mod customer_handlers;
pub mod owner_handlers;
pub mod profile_handlers;
pub mod stream_handlers;

use serde::Deserialize;

/// Optional compare-and-set guard sent with status writes.
#[derive(Debug, Default, Deserialize)]
pub struct VersionGuard {
  pub version: Option<u64>,
}
