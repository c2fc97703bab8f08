// paysync-server/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::header_value;
use crate::errors::AppError;
use crate::pipelines::contexts::ReconcileCtxData;
use crate::state::AppState;
use paysync_flow::{ContextData, PipelineResult};

#[derive(Debug, Serialize)]
pub struct WebhookAck {
  pub ok: bool,
  pub updated: u64,
  pub by: &'static str,
}

/// Reconciles one payment provider callback.
///
/// 401 and 400 make the provider retry later; a 500 from the order store does
/// too, which is safe because the update is idempotent.
#[instrument(
  name = "handler::payment_webhook",
  skip_all,
  fields(payload_bytes = body.len(), reconciliation_id)
)]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let presented_token = header_value(&req, &app_state.config.callback_token_header);
  let data = ReconcileCtxData::new(app_state.get_ref().clone(), body, presented_token);
  tracing::Span::current().record("reconciliation_id", tracing::field::display(data.reconciliation_id));
  let ctx = ContextData::new(data);

  let result = app_state.flows.run(ctx.clone()).await?;
  if result == PipelineResult::Stopped {
    warn!("Reconciliation stopped before completion.");
  }

  let guard = ctx.read();
  let ack = WebhookAck {
    ok: true,
    updated: guard.outcome.rows(),
    by: guard.outcome.by(),
  };
  info!(
    updated = ack.updated,
    by = ack.by,
    archived_items = guard.archived_items,
    notified = guard.notified,
    "Callback acknowledged."
  );
  Ok(HttpResponse::Ok().json(ack))
}
