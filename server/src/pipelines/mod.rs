// paysync-server/src/pipelines/mod.rs

//! Defines and registers the application's pipelines.

use crate::errors::AppError;
use paysync_flow::FlowRegistry;

pub mod batch_pipeline;
pub mod contexts;
pub mod reconcile_pipeline;

/// Registers every pipeline with `registry`. Called once per `AppState`.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) {
  tracing::info!("Registering pipelines...");
  reconcile_pipeline::register_reconcile_pipeline(registry);
  batch_pipeline::register_batch_pipeline(registry);
  tracing::info!("All application pipelines registered.");
}
