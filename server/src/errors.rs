// paysync-server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use paysync_flow::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Method Not Allowed: {0}")]
  MethodNotAllowed(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Database(#[from] sqlx::Error),

  /// A store rejected or could not serve a request (non-sqlx backends).
  #[error("Store Error: {0}")]
  Store(String),

  #[error("Notification Error: {0}")]
  Notification(String),

  #[error("Timed Out: {0}")]
  Timeout(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Short machine-readable kind, used as the `error` field of response bodies.
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "validation_error",
      AppError::Auth(_) => "auth_error",
      AppError::NotFound(_) => "not_found",
      AppError::MethodNotAllowed(_) => "method_not_allowed",
      AppError::Config(_) => "config_error",
      AppError::Database(_) | AppError::Store(_) => "upstream_store_error",
      AppError::Notification(_) => "notification_error",
      AppError::Timeout(_) => "timeout",
      AppError::Workflow { .. } | AppError::Internal(_) => "internal_error",
    }
  }

  /// Message safe to hand back to callers. Database details stay in the logs.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Database(_) => "Database operation failed".to_string(),
      other => other.to_string(),
    }
  }
}

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
    AppError::Notification(err.to_string())
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
      AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
      AppError::Config(_)
      | AppError::Database(_)
      | AppError::Store(_)
      | AppError::Notification(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Rejecting request");
    }
    HttpResponse::build(status).json(json!({
      "error": self.kind(),
      "message": self.public_message(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
