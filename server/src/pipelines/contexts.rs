// paysync-server/src/pipelines/contexts.rs

//! Data carried through each pipeline run. Handlers receive these wrapped in
//! `paysync_flow::ContextData`.

use crate::batch::{BatchSubRequest, BatchSubResponse};
use crate::models::NormalizedCallback;
use crate::services::MatchOutcome;
use crate::state::AppState;
use actix_web::web::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Clone)]
pub struct ReconcileCtxData {
  pub app_state: AppState,
  /// Correlates the log lines and the notification of one callback.
  pub reconciliation_id: Uuid,
  pub raw_body: Bytes,
  /// Value of the configured callback-token header, if the request carried one.
  pub presented_token: Option<String>,
  pub received_at: DateTime<Utc>,
  pub callback: Option<NormalizedCallback>,
  pub outcome: MatchOutcome,
  pub archived_items: u64,
  pub notified: bool,
}

impl ReconcileCtxData {
  pub fn new(app_state: AppState, raw_body: Bytes, presented_token: Option<String>) -> Self {
    Self {
      app_state,
      reconciliation_id: Uuid::new_v4(),
      raw_body,
      presented_token,
      received_at: Utc::now(),
      callback: None,
      outcome: MatchOutcome::NoMatch,
      archived_items: 0,
      notified: false,
    }
  }

  /// True once a match succeeded for a `paid` or `completed` callback.
  pub fn payment_confirmed(&self) -> bool {
    self.outcome.is_matched() && self.callback.as_ref().is_some_and(|cb| cb.status.is_payment_success())
  }
}

#[derive(Clone)]
pub struct BatchCtxData {
  pub app_state: AppState,
  pub raw_body: Bytes,
  pub presented_admin_token: Option<String>,
  pub admin_authorized: bool,
  pub request_ids: Vec<String>,
  pub pending: Vec<BatchSubRequest>,
  /// Responses in completion order.
  pub completed: Vec<BatchSubResponse>,
  /// Responses in request order.
  pub responses: Vec<BatchSubResponse>,
}

impl BatchCtxData {
  pub fn new(app_state: AppState, raw_body: Bytes, presented_admin_token: Option<String>) -> Self {
    Self {
      app_state,
      raw_body,
      presented_admin_token,
      admin_authorized: false,
      request_ids: Vec::new(),
      pending: Vec::new(),
      completed: Vec::new(),
      responses: Vec::new(),
    }
  }
}
