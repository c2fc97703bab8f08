// paysync-server/src/batch/dispatcher.rs

use crate::batch::endpoints::{Endpoint, Resolved};
use crate::batch::{BatchSubRequest, BatchSubResponse};
use crate::errors::{AppError, Result};
use crate::state::AppState;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::{debug, error, instrument, warn, Instrument};

/// Runs one sub-request to completion, mapping every failure to a value.
#[instrument(
  name = "batch::item",
  skip(state, request),
  fields(id = %request.id, endpoint = %request.endpoint, method = %request.method, status)
)]
pub async fn resolve_one(state: AppState, request: BatchSubRequest, admin_authorized: bool) -> BatchSubResponse {
  let BatchSubRequest {
    id,
    endpoint,
    method,
    params,
  } = request;
  let item_timeout = state.config.batch_item_timeout;

  let outcome = match tokio::time::timeout(item_timeout, execute(&state, &endpoint, &method, params, admin_authorized))
    .await
  {
    Ok(result) => result,
    Err(_) => Err(AppError::Timeout(format!(
      "'{}' did not finish within {} ms.",
      endpoint,
      item_timeout.as_millis()
    ))),
  };

  let response = match outcome {
    Ok(data) => BatchSubResponse::ok(id, data),
    Err(err) => {
      warn!(error = %err, "Sub-request failed.");
      BatchSubResponse::failed(id, &err)
    }
  };
  tracing::Span::current().record("status", response.status);
  response
}

async fn execute(
  state: &AppState,
  endpoint: &str,
  method: &str,
  params: Option<JsonValue>,
  admin_authorized: bool,
) -> Result<JsonValue> {
  let endpoint = match Endpoint::resolve(endpoint) {
    Resolved::Supported(endpoint) => endpoint,
    Resolved::NotSupported(name) => return Err(AppError::NotFound(format!("Unknown endpoint '{}'.", name))),
  };
  if !endpoint.supports_method(method) {
    return Err(AppError::MethodNotAllowed(format!(
      "'{}' does not support {}.",
      endpoint.name(),
      method
    )));
  }
  if endpoint.requires_admin() && !admin_authorized {
    return Err(AppError::Auth(format!("'{}' requires a valid admin token.", endpoint.name())));
  }
  endpoint.call(state, params).await
}

/// Spawns every sub-request as its own task and collects the responses in
/// completion order. A task that panics still yields a `500` for its id.
#[instrument(name = "batch::dispatch_all", skip_all, fields(count = requests.len()))]
pub async fn dispatch_all(
  state: &AppState,
  requests: Vec<BatchSubRequest>,
  admin_authorized: bool,
) -> Vec<BatchSubResponse> {
  let mut in_flight: FuturesUnordered<_> = requests
    .into_iter()
    .map(|request| {
      let id = request.id.clone();
      let task = tokio::spawn(resolve_one(state.clone(), request, admin_authorized).in_current_span());
      async move { (id, task.await) }
    })
    .collect();

  let mut completed = Vec::with_capacity(in_flight.len());
  while let Some((id, joined)) = in_flight.next().await {
    let response = joined.unwrap_or_else(|join_err| {
      error!(%id, error = %join_err, "Sub-request task aborted.");
      BatchSubResponse::failed(id, &AppError::Internal("Sub-request aborted unexpectedly.".to_string()))
    });
    debug!(id = %response.id, status = response.status, "Sub-request settled.");
    completed.push(response);
  }
  completed
}

/// Orders `completed` to follow `request_ids`, looking each one up by id.
///
/// An id with no response (which `dispatch_all` never produces) becomes a
/// `500` entry so the output ids always equal the input ids.
pub fn restore_order(request_ids: &[String], completed: Vec<BatchSubResponse>) -> Vec<BatchSubResponse> {
  let mut by_id: HashMap<String, BatchSubResponse> = completed.into_iter().map(|r| (r.id.clone(), r)).collect();
  request_ids
    .iter()
    .map(|id| {
      by_id.remove(id).unwrap_or_else(|| {
        BatchSubResponse::failed(id.clone(), &AppError::Internal("No response recorded.".to_string()))
      })
    })
    .collect()
}
