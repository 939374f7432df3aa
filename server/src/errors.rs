// kirana_server/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use kirana::KiranaError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error(transparent)]
  Market(#[from] KiranaError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<KiranaError>() {
      Ok(market) => AppError::Market(market),
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(db) => AppError::Sqlx(db),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

fn market_response(err: &KiranaError) -> HttpResponse {
  let body = json!({ "error": err.to_string() });
  match err {
    KiranaError::EmptyCart
    | KiranaError::MissingStore
    | KiranaError::MixedStores { .. }
    | KiranaError::InvalidLineItem { .. }
    | KiranaError::MissingDeliveryLocation
    | KiranaError::InvalidSchedule(_)
    | KiranaError::InvalidInput(_) => HttpResponse::BadRequest().json(body),
    KiranaError::PaymentFailed(_) | KiranaError::PaymentPending { .. } => HttpResponse::PaymentRequired().json(body),
    KiranaError::Transition(_) | KiranaError::VersionConflict { .. } => HttpResponse::Conflict().json(body),
    KiranaError::NotFound { .. } => HttpResponse::NotFound().json(body),
    KiranaError::StoreNotLinked { .. } => HttpResponse::ServiceUnavailable().json(body),
    KiranaError::Parse(_) => {
      HttpResponse::InternalServerError().json(json!({ "error": "Stored record could not be read", "detail": err.to_string() }))
    }
    KiranaError::Backend { .. } => HttpResponse::InternalServerError().json(json!({ "error": "Backend operation failed" })),
    KiranaError::HandlerMissing { .. } | KiranaError::Configuration(_) | KiranaError::HandlerError { .. } => {
      HttpResponse::InternalServerError().json(json!({ "error": "An internal error occurred", "detail": err.to_string() }))
    }
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Sqlx(_) => HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"})),
      AppError::Market(err) => market_response(err),
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
