// paysync_flow/src/core/control.rs

//! Flow signals returned by handlers and the outcome of a whole run.

/// Returned by a handler to continue or halt the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// Halt now. Remaining handlers of this step and all later steps are not run.
  Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}
