//! Bounded-concurrency DAG scheduler and executor.
//!
//! Drives a compiled [`weave_graph::Graph`] to completion: a dispatcher
//! pulls ready nodes off a queue and spawns a worker per node, bounded by a
//! `max_parallel` semaphore; a worker aggregates its upstream results,
//! invokes the node's connector with linear-backoff retry, and pushes any
//! downstream node whose inputs are now all satisfied. See [`run`] for the
//! entry point.

mod config;
mod error_sink;
mod observer;
mod retry;
mod scheduler;
mod state;

pub use config::{SchedulerConfig, WorkflowRunSettings};
pub use observer::{NoopObserver, SchedulerObserver};
pub use scheduler::{run, ExecutionOutcome, RunStatus};
