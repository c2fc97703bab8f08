// paysync_flow/src/core/context.rs

//! The boxed handler type stored by a `Pipeline<TData, Err>`.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A pipeline step handler.
///
/// Takes a clone of the shared `ContextData<TData>` and resolves to
/// `Result<PipelineControl, Err>`. Lock guards taken inside a handler must be
/// dropped before the next `.await`.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
