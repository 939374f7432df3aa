// kirana/src/checkout/payment.rs

use crate::model::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
  pub customer_id: Uuid,
  pub store_id: Uuid,
  pub amount: Money,
  /// Client-side reference from the payment sheet, if any.
  pub reference: Option<String>,
  /// The store's collection account.
  pub payee_account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
  pub reference: String,
}

/// Confirms that a payment went through. Failure means no order is created.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn confirm(&self, request: &PaymentRequest) -> anyhow::Result<PaymentReceipt>;
}
