// paysync-server/src/pipelines/batch_pipeline.rs

//! validate envelope -> resolve admin access -> dispatch concurrently -> restore request order.

use crate::batch::dispatcher::{dispatch_all, restore_order};
use crate::batch::{BatchEntry, BatchEnvelope};
use crate::errors::AppError;
use crate::pipelines::contexts::BatchCtxData;
use crate::security::tokens_match;
use paysync_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl, StepKind};
use tracing::{debug, info, instrument};

pub const VALIDATE: &str = "validate_batch_envelope";
pub const ADMIN_ACCESS: &str = "resolve_admin_access";
pub const DISPATCH: &str = "dispatch_sub_requests";
pub const RESTORE_ORDER: &str = "restore_request_order";

type StepResult = Result<PipelineControl, AppError>;

pub fn build_batch_pipeline() -> Pipeline<BatchCtxData, AppError> {
  let mut p = Pipeline::<BatchCtxData, AppError>::new(&[
    (VALIDATE, StepKind::Required, None),
    (ADMIN_ACCESS, StepKind::Required, None),
    (DISPATCH, StepKind::Required, None),
    (RESTORE_ORDER, StepKind::Required, None),
  ]);

  p.on_step(VALIDATE, validate_batch_envelope);
  p.on_step(ADMIN_ACCESS, resolve_admin_access);
  p.on_step(DISPATCH, dispatch_sub_requests);
  p.on_step(RESTORE_ORDER, restore_request_order);
  p
}

pub fn register_batch_pipeline(registry: &FlowRegistry<AppError>) {
  registry.register_pipeline(build_batch_pipeline());
}

/// Rejects the whole batch before any sub-request runs. Malformed items
/// with a usable id are settled here as `400` entries.
#[instrument(skip_all)]
async fn validate_batch_envelope(ctx: ContextData<BatchCtxData>) -> StepResult {
  let mut guard = ctx.write();
  let max = guard.app_state.config.batch_max_requests;
  let entries = BatchEnvelope::parse(&guard.raw_body)?.into_entries(max)?;
  guard.request_ids = entries.iter().map(|e| e.id().to_string()).collect();
  for entry in entries {
    match entry {
      BatchEntry::Valid(request) => guard.pending.push(request),
      BatchEntry::Invalid(response) => guard.completed.push(response),
    }
  }
  info!(
    count = guard.request_ids.len(),
    rejected = guard.completed.len(),
    "Batch accepted."
  );
  Ok(PipelineControl::Continue)
}

/// Admin endpoints are open when no admin token is configured.
#[instrument(skip_all)]
async fn resolve_admin_access(ctx: ContextData<BatchCtxData>) -> StepResult {
  let mut guard = ctx.write();
  let authorized = match guard.app_state.config.admin_token.as_deref() {
    None => true,
    Some(expected) => guard
      .presented_admin_token
      .as_deref()
      .is_some_and(|presented| tokens_match(presented, expected)),
  };
  debug!(authorized, "Admin access resolved.");
  guard.admin_authorized = authorized;
  Ok(PipelineControl::Continue)
}

#[instrument(skip_all)]
async fn dispatch_sub_requests(ctx: ContextData<BatchCtxData>) -> StepResult {
  let (state, requests, admin_authorized) = {
    let mut guard = ctx.write();
    let requests = std::mem::take(&mut guard.pending);
    (guard.app_state.clone(), requests, guard.admin_authorized)
  };
  let completed = dispatch_all(&state, requests, admin_authorized).await;
  ctx.write().completed.extend(completed);
  Ok(PipelineControl::Continue)
}

#[instrument(skip_all)]
async fn restore_request_order(ctx: ContextData<BatchCtxData>) -> StepResult {
  let mut guard = ctx.write();
  let completed = std::mem::take(&mut guard.completed);
  let responses = restore_order(&guard.request_ids, completed);
  let failed = responses.iter().filter(|r| !r.is_success()).count();
  info!(total = responses.len(), failed, "Batch settled.");
  guard.responses = responses;
  Ok(PipelineControl::Continue)
}
