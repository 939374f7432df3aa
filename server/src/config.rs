// kirana_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use kirana::model::FeePayee;
use kirana::{FeeSchedule, MarketConfig, Money};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Absent means live accounts are served from memory as well.
  pub database_url: Option<String>,
  pub ensure_schema: bool,
  pub payment_stub_account: String,
  pub market: MarketConfig,
}

fn optional_env(var_name: &str) -> Option<String> {
  env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T>(var_name: &str) -> Result<Option<T>>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  optional_env(var_name)
    .map(|raw| {
      raw
        .trim()
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
    })
    .transpose()
}

fn fee_payee(raw: &str) -> Result<FeePayee> {
  match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
    "store" => Ok(FeePayee::Store),
    "platform" => Ok(FeePayee::Platform),
    "delivery_partner" | "partner" => Ok(FeePayee::DeliveryPartner),
    other => Err(AppError::Config(format!("Invalid DELIVERY_FEE_PAYEE: '{}'", other))),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let server_host = optional_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parsed_env::<u16>("SERVER_PORT")?.unwrap_or(8080);
    let database_url = optional_env("DATABASE_URL");
    let ensure_schema = parsed_env::<bool>("ENSURE_SCHEMA")?.unwrap_or(false);
    let payment_stub_account = optional_env("PAYMENT_STUB_ACCOUNT").unwrap_or_else(|| "stub_collect_acct".to_string());

    let mut market = MarketConfig::default();
    if let Some(secs) = parsed_env::<u64>("DEMO_TICK_SECS")? {
      if secs == 0 {
        return Err(AppError::Config("DEMO_TICK_SECS must be at least 1".to_string()));
      }
      market.demo_tick = Duration::from_secs(secs);
    }
    if let Some(mins) = parsed_env::<u64>("SCHEDULED_PAYMENT_LEAD_MINS")? {
      market.scheduled_payment_lead = Duration::from_secs(mins * 60);
    }
    market.fees = FeeSchedule {
      platform_fee: parsed_env::<i64>("PLATFORM_FEE_PAISE")?.filter(|p| *p > 0).map(Money),
      delivery_fee: parsed_env::<i64>("DELIVERY_FEE_PAISE")?.filter(|p| *p > 0).map(Money),
      delivery_fee_payee: match optional_env("DELIVERY_FEE_PAYEE") {
        Some(raw) => fee_payee(&raw)?,
        None => FeePayee::DeliveryPartner,
      },
    };

    tracing::info!(
      database = database_url.is_some(),
      demo_tick_secs = market.demo_tick.as_secs(),
      "Application configuration loaded."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      ensure_schema,
      payment_stub_account,
      market,
    })
  }
}
