// kirana/src/flow/mod.rs

//! A small asynchronous step-flow engine.
//!
//! A [`Flow`] is an ordered list of named steps. Each step may carry `before`,
//! `on` and `after` handlers which receive a clone of the shared
//! [`FlowData`] and return a [`StepControl`]. Steps can be optional or skipped
//! by a condition evaluated against the current data. Order placement is
//! expressed as a flow (see [`crate::checkout`]).

pub mod control;
pub mod data;
pub mod definition;
pub mod execution;
pub mod hooks;
pub mod step;

pub use control::{FlowOutcome, StepControl};
pub use data::FlowData;
pub use definition::{Flow, Handler};
pub use step::{SkipCondition, StepDef};
