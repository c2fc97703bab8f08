// src/lib.rs

//! paysync-flow: asynchronous step pipelines for payment reconciliation.
//!
//! A pipeline is an ordered list of named steps operating on a shared
//! [`ContextData`]. Each step can carry `before`, `on` and `after` handlers,
//! a skip condition evaluated against the current context, and a
//! [`StepKind`] that decides what a failure means:
//!  - `Required` steps abort the run on error and must have handlers.
//!  - `Optional` steps may be left without handlers.
//!  - `BestEffort` steps log and swallow handler errors, so work that follows
//!    an authoritative state change can fail without undoing it.
//!
//! [`FlowRegistry`] keeps one pipeline per context type and converts
//! framework and handler errors into an application error type.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef, StepKind};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;
