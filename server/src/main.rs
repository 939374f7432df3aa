// kirana_server/src/main.rs

mod config;
mod db;
mod errors;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::{spawn_change_bridge, PgRepository};
use crate::services::payment_stub::StubPaymentGateway;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use kirana::{Backend, ChangeHub, MarketContext, MemoryRepository};
use sqlx::PgPool;
use std::io;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
  tracing::error!(error = %err, "{}", context);
  io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting kirana marketplace server...");

  let app_config = Arc::new(AppConfig::from_env().map_err(|e| startup_error("Failed to load configuration", e))?);
  let payments = Arc::new(StubPaymentGateway::new(app_config.payment_stub_account.clone()));

  let market = match &app_config.database_url {
    Some(url) => {
      let pool = PgPool::connect(url)
        .await
        .map_err(|e| startup_error("Failed to connect to the database", e))?;
      tracing::info!("Successfully connected to the database.");

      let repo = Arc::new(PgRepository::new(pool.clone()));
      if app_config.ensure_schema {
        repo
          .ensure_schema()
          .await
          .map_err(|e| startup_error("Failed to ensure database schema", e))?;
      }

      let hub = ChangeHub::new();
      // The bridge task runs for the life of the process.
      spawn_change_bridge(&pool, hub.clone())
        .await
        .map_err(|e| startup_error("Failed to listen for database changes", e))?;

      let demo = Arc::new(MemoryRepository::new(ChangeHub::new()));
      MarketContext::new(app_config.market.clone(), Backend { repo, hub }, demo, payments)
    }
    None => {
      tracing::warn!("DATABASE_URL not set; live accounts are kept in memory.");
      MarketContext::in_memory(app_config.market.clone(), payments)
    }
  };
  let market = Arc::new(market);
  market.start_demo_simulator();

  let app_state = AppState { market: market.clone() };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  let result = HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await;

  market.shutdown();
  result
}
