// paysync_flow/src/pipeline/execution.rs

//! `Pipeline::run()`: walks the steps in order and applies each step kind's
//! failure policy.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::step::{StepDef, StepKind};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes every step against `ctx_data`.
  ///
  /// A required step with no handlers fails with `FlowError::HandlerMissing`
  /// converted into `Err`. Errors from `BestEffort` steps are logged and do not
  /// affect the returned result.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline_context_data_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");
    let mut tolerated_failures = 0usize;

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_def.name.as_str(),
        step_index = step_idx,
        kind = ?step_def.kind
      );

      if let Some(skip_cond) = &step_def.skip_if {
        let skip = {
          let guard = ctx_data.read();
          skip_cond(&*guard)
        };
        if skip {
          event!(parent: &step_span, Level::DEBUG, "Step skipped by its condition.");
          continue;
        }
      }

      match self.run_step(step_def, &ctx_data).instrument(step_span.clone()).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => {
          event!(parent: &step_span, Level::INFO, "Pipeline stopped by a handler.");
          return Ok(PipelineResult::Stopped);
        }
        Err(e) if step_def.kind == StepKind::BestEffort => {
          tolerated_failures += 1;
          event!(parent: &step_span, Level::WARN, error = %e, "Best-effort step failed; continuing.");
        }
        Err(e) => return Err(e),
      }
    }

    event!(Level::DEBUG, tolerated_failures, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: &ContextData<TData>) -> Result<PipelineControl, Err> {
    let step_name = step_def.name.as_str();
    let phases = [("before", &self.before), ("on", &self.on), ("after", &self.after)];

    let has_handlers = phases
      .iter()
      .any(|(_, handlers)| handlers.get(step_name).is_some_and(|v| !v.is_empty()));
    if !has_handlers {
      if step_def.kind.tolerates_missing_handlers() {
        event!(Level::DEBUG, "Step has no handlers, skipping.");
        return Ok(PipelineControl::Continue);
      }
      event!(Level::ERROR, "Required step has no handlers.");
      return Err(Err::from(FlowError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    }

    for (phase, handlers) in phases {
      let Some(handlers) = handlers.get(step_name) else {
        continue;
      };
      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        let handler_span = span!(Level::DEBUG, "step_handler", phase, handler_index = handler_idx);
        match handler_fn(ctx_data.clone()).instrument(handler_span).await {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
          Err(e) => {
            event!(Level::DEBUG, phase, error = %e, "Handler failed.");
            return Err(e);
          }
        }
      }
    }
    Ok(PipelineControl::Continue)
  }
}
