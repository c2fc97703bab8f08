// paysync-server/src/web/handlers/batch_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::instrument;

use super::header_value;
use crate::errors::AppError;
use crate::pipelines::contexts::BatchCtxData;
use crate::state::AppState;
use paysync_flow::ContextData;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Always 200 once the envelope is valid; each entry carries its own status.
#[instrument(name = "handler::batch", skip_all, fields(payload_bytes = body.len()))]
pub async fn batch_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let admin_token = header_value(&req, ADMIN_TOKEN_HEADER);
  let ctx = ContextData::new(BatchCtxData::new(app_state.get_ref().clone(), body, admin_token));

  app_state.flows.run(ctx.clone()).await?;

  let responses = std::mem::take(&mut ctx.write().responses);
  Ok(HttpResponse::Ok().json(json!({ "responses": responses })))
}
