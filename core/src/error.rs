// paysync_flow/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for required step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No pipeline registered for context type {type_name}")]
  PipelineNotRegistered { type_name: String },

  #[error("Type mismatch during context downcast (expected {expected_type}, at: '{step_name}')")]
  TypeMismatch {
    step_name: String,
    expected_type: String,
  },

  #[error("Error in handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a FlowError that was boxed into anyhow on its way out of a handler.
    match err.downcast::<FlowError>() {
      Ok(flow_err) => flow_err,
      Err(err) => FlowError::HandlerError { source: err },
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
