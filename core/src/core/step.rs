// paysync_flow/src/core/step.rs

use std::sync::Arc;

/// Evaluated against the context right before a step runs; `true` skips the step.
pub type SkipCondition<TData> = Arc<dyn Fn(&TData) -> bool + Send + Sync + 'static>;

/// How the runner treats a step's handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
  /// Must have at least one handler; any handler error aborts the run.
  Required,
  /// May have no handlers; handler errors still abort the run.
  Optional,
  /// May have no handlers; handler errors are logged and the run moves on to
  /// the next step.
  BestEffort,
}

impl StepKind {
  pub fn tolerates_missing_handlers(self) -> bool {
    !matches!(self, StepKind::Required)
  }
}

#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub kind: StepKind,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("kind", &self.kind)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
