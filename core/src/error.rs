// kirana/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::TransitionError;
use crate::parse::ParseError;

#[derive(Debug, Error)]
pub enum KiranaError {
  #[error("Cart is empty")]
  EmptyCart,

  #[error("No store selected for this cart")]
  MissingStore,

  #[error("Cart mixes items from store {expected} and store {found}")]
  MixedStores { expected: Uuid, found: Uuid },

  #[error("Invalid line item '{product_id}': {reason}")]
  InvalidLineItem { product_id: String, reason: String },

  #[error("Delivery orders need a resolved address and coordinates")]
  MissingDeliveryLocation,

  #[error("Invalid delivery schedule: {0}")]
  InvalidSchedule(String),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Payment confirmation failed: {0}")]
  PaymentFailed(String),

  #[error(transparent)]
  Transition(#[from] TransitionError),

  #[error("Order {order_id} is awaiting payment and cannot progress")]
  PaymentPending { order_id: Uuid },

  #[error("Order {order_id} changed concurrently (expected version {expected}, found {found})")]
  VersionConflict { order_id: Uuid, expected: u64, found: u64 },

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("Store owner {owner_id} has no linked store; contact support")]
  StoreNotLinked { owner_id: Uuid },

  #[error("Backend operation '{operation}' failed: {message}")]
  Backend { operation: &'static str, message: String },

  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Configuration error: {0}")]
  Configuration(String),

  #[error("Error in handler or collaborator. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },
}

impl KiranaError {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    KiranaError::NotFound {
      entity,
      id: id.to_string(),
    }
  }

  pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
    KiranaError::Backend {
      operation,
      message: message.into(),
    }
  }
}

impl From<AnyhowError> for KiranaError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<KiranaError>() {
      Ok(inner) => inner,
      Err(err) => KiranaError::HandlerError { source: err },
    }
  }
}

pub type KiranaResult<T, E = KiranaError> = std::result::Result<T, E>;
