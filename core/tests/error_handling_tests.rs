// tests/error_handling_tests.rs
mod common;

use common::*;
use paysync_flow::{ContextData, FlowError, Pipeline, PipelineControl, StepKind};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn pipeline_with_flow_error_type() {
  setup_tracing();
  let mut pipeline = Pipeline::<CallbackCtx, FlowError>::new(&[("archive", StepKind::Required, None)]);
  pipeline.on_step("archive", |ctx: ContextData<CallbackCtx>| async move {
    ctx.write().archived = true;
    Ok::<_, FlowError>(PipelineControl::Continue)
  });
  let ctx = ContextData::new(CallbackCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert!(ctx.read().archived);

  let mut failing = Pipeline::<CallbackCtx, FlowError>::new(&[("archive", StepKind::Required, None)]);
  failing.on_step("archive", |_ctx: ContextData<CallbackCtx>| async move {
    Err::<PipelineControl, _>(FlowError::Internal("catalog rejected update".to_string()))
  });
  match failing.run(ContextData::new(CallbackCtx::default())).await {
    Err(FlowError::Internal(s)) => assert_eq!(s, "catalog rejected update"),
    other => panic!("expected FlowError::Internal, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn anyhow_errors_become_handler_errors() {
  setup_tracing();
  let mut pipeline = Pipeline::<CallbackCtx, FlowError>::new(&[("notify", StepKind::Required, None)]);
  pipeline.on_step("notify", |_ctx: ContextData<CallbackCtx>| async move {
    Err::<PipelineControl, _>(anyhow::anyhow!("gateway returned 502"))
  });

  match pipeline.run(ContextData::new(CallbackCtx::default())).await {
    Err(FlowError::HandlerError { source }) => assert_eq!(source.to_string(), "gateway returned 502"),
    other => panic!("expected HandlerError, got {:?}", other),
  }
}

#[test]
fn flow_error_round_trips_through_anyhow() {
  let wrapped = anyhow::Error::new(FlowError::HandlerMissing {
    step_name: "authenticate".to_string(),
  });
  match FlowError::from(wrapped) {
    FlowError::HandlerMissing { step_name } => assert_eq!(step_name, "authenticate"),
    other => panic!("expected the original variant back, got {:?}", other),
  }
}
