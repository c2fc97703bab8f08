// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use paysync_flow::{ContextData, FlowError, PipelineControl};
use tracing::Level;

/// Stand-in for a callback being reconciled: each step leaves a mark in `trail`.
#[derive(Clone, Debug, Default)]
pub struct CallbackCtx {
  pub rows_updated: u64,
  pub trail: Vec<String>,
  pub stop_at: Option<String>,
  pub archived: bool,
  pub notified: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("step failed: {0}")]
  Step(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

/// Records `mark` in the trail and bumps `rows_updated`; stops if `stop_at` names this mark.
pub fn marking_handler(mark: &'static str) -> paysync_flow::Handler<CallbackCtx, TestError> {
  Box::new(move |ctx: ContextData<CallbackCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.rows_updated += 1;
      guard.trail.push(mark.to_string());
      tracing::debug!(target: "test_handlers", mark, rows = guard.rows_updated, "marked");
      if guard.stop_at.as_deref() == Some(mark) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(mark: &'static str, message: &'static str) -> paysync_flow::Handler<CallbackCtx, TestError> {
  Box::new(move |ctx: ContextData<CallbackCtx>| {
    Box::pin(async move {
      ctx.write().trail.push(mark.to_string());
      Err(TestError::Step(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
