//! Structured per-execution log buffer with a dual time/size flush policy.
//!
//! Layered on top of, not a replacement for, ordinary `tracing`
//! instrumentation: every subsystem emits `tracing` spans/events
//! independent of whether a given call path also appends to an execution's
//! log buffer. This crate is for the durable, per-execution audit trail
//! that ends up in `WorkflowExecution.logs`.

mod buffer;
mod event;

pub use buffer::{ExecutionLogBuffer, FlushPolicy};
pub use event::{LogEvent, LogLevel};
