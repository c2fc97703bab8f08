// paysync-server/src/pipelines/reconcile_pipeline.rs

//! Payment callback reconciliation.
//!
//! authenticate -> normalize -> match by invoice id -> match by external id
//! -> archive purchased items (best effort) -> notify operators (best effort).

use crate::errors::AppError;
use crate::models::{NormalizedCallback, OrderStatus, RawEnvelope};
use crate::pipelines::contexts::ReconcileCtxData;
use crate::security::tokens_match;
use crate::services::{OrderMatcher, PaymentNotification};
use crate::store::ARCHIVE_LOOKUP_LIMIT;
use paysync_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl, SkipCondition, StepKind};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const AUTHENTICATE: &str = "authenticate_callback";
pub const NORMALIZE: &str = "normalize_payload";
pub const MATCH_BY_INVOICE_ID: &str = "match_by_invoice_id";
pub const MATCH_BY_EXTERNAL_ID: &str = "match_by_external_id";
pub const ARCHIVE_ITEMS: &str = "archive_purchased_items";
pub const NOTIFY: &str = "notify_operators";

type StepResult = Result<PipelineControl, AppError>;

pub fn build_reconcile_pipeline() -> Pipeline<ReconcileCtxData, AppError> {
  let already_matched: SkipCondition<ReconcileCtxData> = Arc::new(|data: &ReconcileCtxData| data.outcome.is_matched());
  let not_confirmed: SkipCondition<ReconcileCtxData> = Arc::new(|data: &ReconcileCtxData| !data.payment_confirmed());

  let mut p = Pipeline::<ReconcileCtxData, AppError>::new(&[
    (AUTHENTICATE, StepKind::Required, None),
    (NORMALIZE, StepKind::Required, None),
    (MATCH_BY_INVOICE_ID, StepKind::Required, None),
    (MATCH_BY_EXTERNAL_ID, StepKind::Required, Some(already_matched)),
    (ARCHIVE_ITEMS, StepKind::BestEffort, Some(not_confirmed.clone())),
    (NOTIFY, StepKind::BestEffort, Some(not_confirmed)),
  ]);

  p.on_step(AUTHENTICATE, authenticate_callback);
  p.on_step(NORMALIZE, normalize_payload);
  p.on_step(MATCH_BY_INVOICE_ID, match_by_invoice_id);
  p.on_step(MATCH_BY_EXTERNAL_ID, match_by_external_id);
  p.on_step(ARCHIVE_ITEMS, archive_purchased_items);
  p.on_step(NOTIFY, notify_operators);
  p
}

pub fn register_reconcile_pipeline(registry: &FlowRegistry<AppError>) {
  registry.register_pipeline(build_reconcile_pipeline());
}

/// Rejects the callback unless it carries the configured shared secret.
/// Passes everything when no secret is configured.
#[instrument(skip_all)]
async fn authenticate_callback(ctx: ContextData<ReconcileCtxData>) -> StepResult {
  let guard = ctx.read();
  let Some(expected) = guard.app_state.config.callback_token.as_deref() else {
    return Ok(PipelineControl::Continue);
  };
  match guard.presented_token.as_deref() {
    Some(presented) if tokens_match(presented, expected) => Ok(PipelineControl::Continue),
    Some(_) => Err(AppError::Auth("Invalid callback token.".to_string())),
    None => Err(AppError::Auth(format!(
      "Missing '{}' header.",
      guard.app_state.config.callback_token_header
    ))),
  }
}

#[instrument(skip_all)]
async fn normalize_payload(ctx: ContextData<ReconcileCtxData>) -> StepResult {
  let mut guard = ctx.write();
  let callback = RawEnvelope::parse(&guard.raw_body)?
    .normalize(&guard.app_state.config.default_currency, guard.received_at)?;
  info!(
    invoice_id = ?callback.invoice_id,
    external_id = ?callback.external_id,
    provider_status = %callback.provider_status,
    status = %callback.status,
    "Callback normalized."
  );
  guard.callback = Some(callback);
  Ok(PipelineControl::Continue)
}

fn matcher_and_callback(ctx: &ContextData<ReconcileCtxData>) -> Result<(OrderMatcher, NormalizedCallback), AppError> {
  let guard = ctx.read();
  let callback = guard
    .callback
    .clone()
    .ok_or_else(|| AppError::Internal("Callback was not normalized before matching.".to_string()))?;
  Ok((OrderMatcher::new(guard.app_state.orders.clone()), callback))
}

#[instrument(skip_all)]
async fn match_by_invoice_id(ctx: ContextData<ReconcileCtxData>) -> StepResult {
  let (matcher, callback) = matcher_and_callback(&ctx)?;
  let outcome = matcher.try_primary_key(&callback, &callback.to_update()).await?;
  info!(by = outcome.by(), rows = outcome.rows(), "Primary key attempted.");
  ctx.write().outcome = outcome;
  Ok(PipelineControl::Continue)
}

#[instrument(skip_all)]
async fn match_by_external_id(ctx: ContextData<ReconcileCtxData>) -> StepResult {
  let (matcher, callback) = matcher_and_callback(&ctx)?;
  let outcome = matcher.try_fallback_key(&callback, &callback.to_update()).await?;
  if outcome.is_matched() {
    info!(by = outcome.by(), rows = outcome.rows(), "Fallback key matched.");
  } else {
    warn!(
      invoice_id = ?callback.invoice_id,
      external_id = ?callback.external_id,
      "Callback matched no order."
    );
  }
  ctx.write().outcome = outcome;
  Ok(PipelineControl::Continue)
}

/// Takes the purchased items off sale. Failure leaves the order update intact.
#[instrument(skip_all)]
async fn archive_purchased_items(ctx: ContextData<ReconcileCtxData>) -> StepResult {
  let (orders, catalog, key, at) = {
    let guard = ctx.read();
    let key = guard
      .outcome
      .key()
      .cloned()
      .ok_or_else(|| AppError::Internal("Archival requested without a matched key.".to_string()))?;
    (
      guard.app_state.orders.clone(),
      guard.app_state.catalog.clone(),
      key,
      guard.received_at,
    )
  };

  let product_ids = orders.product_ids(&key, ARCHIVE_LOOKUP_LIMIT).await?;
  if product_ids.is_empty() {
    info!(%key, "Matched orders reference no catalog items.");
    return Ok(PipelineControl::Continue);
  }
  let archived = catalog.archive_items(&product_ids, at).await?;
  info!(%key, items = ?product_ids, archived, "Purchased items archived.");
  ctx.write().archived_items = archived;
  Ok(PipelineControl::Continue)
}

#[instrument(skip_all)]
async fn notify_operators(ctx: ContextData<ReconcileCtxData>) -> StepResult {
  let (notifier, notification) = {
    let guard = ctx.read();
    let key = guard.outcome.key().map(|k| k.value().to_string()).unwrap_or_default();
    let callback = guard.callback.as_ref();
    (
      guard.app_state.notifier.clone(),
      PaymentNotification {
        reconciliation_id: guard.reconciliation_id,
        matched_by: guard.outcome.by(),
        key,
        status: callback.map_or(OrderStatus::Pending, |cb| cb.status),
        rows: guard.outcome.rows(),
        payer_email: callback.and_then(|cb| cb.payer_email.clone()),
      },
    )
  };
  notifier.notify(&notification).await?;
  ctx.write().notified = true;
  Ok(PipelineControl::Continue)
}
