// kirana/src/config.rs

use crate::model::{FeePayee, Money};
use std::time::Duration;

/// Fees added on top of the item total at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
  pub platform_fee: Option<Money>,
  pub delivery_fee: Option<Money>,
  pub delivery_fee_payee: FeePayee,
}

impl FeeSchedule {
  pub fn is_empty(&self) -> bool {
    self.platform_fee.is_none() && self.delivery_fee.is_none()
  }
}

impl Default for FeeSchedule {
  fn default() -> Self {
    FeeSchedule {
      platform_fee: None,
      delivery_fee: None,
      delivery_fee_payee: FeePayee::DeliveryPartner,
    }
  }
}

#[derive(Debug, Clone)]
pub struct MarketConfig {
  /// Period of the demo simulator.
  pub demo_tick: Duration,
  pub fees: FeeSchedule,
  /// Scheduled orders must be paid this long before the slot.
  pub scheduled_payment_lead: Duration,
  pub fallback_speed_kmh: f64,
  pub discovery_radius_km: f64,
}

impl Default for MarketConfig {
  fn default() -> Self {
    MarketConfig {
      demo_tick: Duration::from_secs(15),
      fees: FeeSchedule::default(),
      scheduled_payment_lead: Duration::from_secs(60 * 60),
      fallback_speed_kmh: 20.0,
      discovery_radius_km: 5.0,
    }
  }
}
