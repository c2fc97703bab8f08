// paysync_flow/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` struct and its structural editing methods.

use crate::core::context::Handler;
use crate::core::step::{SkipCondition, StepDef, StepKind};
use crate::error::FlowError;
use std::collections::HashMap;

/// An ordered set of named steps over the context data type `TData`.
///
/// `Err` is what handlers return and what `run` reports. It must be
/// constructible from `FlowError` so that setup problems discovered at run
/// time (a required step without handlers) surface through the same type.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,

  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new(step_defs: &[(&str, StepKind, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, kind, skip_if)| StepDef {
        name: (*name).to_string(),
        kind: *kind,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  /// Step names in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  fn position_of(&self, step_name: &str) -> Result<usize, FlowError> {
    self
      .steps
      .iter()
      .position(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })
  }

  /// Panics when the step is unknown. Handler registration happens at startup,
  /// where a misspelled step name is a programming error.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if let Err(e) = self.position_of(step_name) {
      panic!("Pipeline setup error: {}", e);
    }
  }

  fn ensure_step_not_exists(&self, step_name: &str) {
    if self.steps.iter().any(|s| s.name == step_name) {
      panic!("Pipeline setup error: step '{}' already exists.", step_name);
    }
  }

  pub fn insert_before_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    kind: StepKind,
    skip_if: Option<SkipCondition<TData>>,
  ) -> Result<(), FlowError> {
    let idx = self.position_of(existing_step_name)?;
    let name: String = new_step_name.into();
    self.ensure_step_not_exists(&name);
    self.steps.insert(idx, StepDef { name, kind, skip_if });
    Ok(())
  }

  pub fn insert_after_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    kind: StepKind,
    skip_if: Option<SkipCondition<TData>>,
  ) -> Result<(), FlowError> {
    let idx = self.position_of(existing_step_name)?;
    let name: String = new_step_name.into();
    self.ensure_step_not_exists(&name);
    self.steps.insert(idx + 1, StepDef { name, kind, skip_if });
    Ok(())
  }

  /// Removes a step with all of its handlers. Unknown names are a no-op.
  pub fn remove_step(&mut self, step_name: &str) {
    if let Ok(idx) = self.position_of(step_name) {
      self.steps.remove(idx);
      self.before.remove(step_name);
      self.on.remove(step_name);
      self.after.remove(step_name);
    }
  }

  pub fn set_kind(&mut self, step_name: &str, kind: StepKind) -> Result<(), FlowError> {
    let idx = self.position_of(step_name)?;
    self.steps[idx].kind = kind;
    Ok(())
  }

  pub fn set_skip_condition(
    &mut self,
    step_name: &str,
    skip_if: Option<SkipCondition<TData>>,
  ) -> Result<(), FlowError> {
    let idx = self.position_of(step_name)?;
    self.steps[idx].skip_if = skip_if;
    Ok(())
  }
}
