// kirana_server/src/state.rs
use kirana::MarketContext;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub market: Arc<MarketContext>,
}
