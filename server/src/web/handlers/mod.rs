// paysync-server/src/web/handlers/mod.rs
pub mod batch_handlers;
pub mod webhook_handlers;

use crate::errors::AppError;
use actix_web::{HttpRequest, HttpResponse};

pub async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for unsupported methods on a known path.
pub async fn method_not_allowed_handler(req: HttpRequest) -> Result<HttpResponse, AppError> {
  Err(AppError::MethodNotAllowed(format!(
    "{} is not supported on {}",
    req.method(),
    req.path()
  )))
}

pub(crate) fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
  req
    .headers()
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string)
}
