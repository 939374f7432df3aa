// kirana_server/src/services/payment_stub.rs
use async_trait::async_trait;
use kirana::checkout::{PaymentReceipt, PaymentRequest};
use kirana::PaymentGateway;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Stands in for a real payment provider. Every non-zero amount succeeds
/// after a short simulated round trip.
#[derive(Debug, Clone)]
pub struct StubPaymentGateway {
  account_id: String,
  latency: Duration,
}

impl StubPaymentGateway {
  pub fn new(account_id: impl Into<String>) -> Self {
    StubPaymentGateway {
      account_id: account_id.into(),
      latency: Duration::from_millis(50),
    }
  }
}

#[async_trait]
impl PaymentGateway for StubPaymentGateway {
  #[instrument(
    name = "StubPaymentGateway::confirm",
    skip(self, request),
    fields(store_id = %request.store_id, amount = %request.amount)
  )]
  async fn confirm(&self, request: &PaymentRequest) -> anyhow::Result<PaymentReceipt> {
    if request.amount.0 <= 0 {
      anyhow::bail!("amount must be greater than zero");
    }
    tokio::time::sleep(self.latency).await;

    let reference = request
      .reference
      .clone()
      .unwrap_or_else(|| format!("stub_pay_{}", Uuid::new_v4().simple()));
    let payee = request.payee_account.as_deref().unwrap_or(&self.account_id);
    info!(%reference, payee, "Stub payment confirmed.");
    Ok(PaymentReceipt { reference })
  }
}
