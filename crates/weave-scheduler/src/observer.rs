//! Scheduler progress hooks, analogous in spirit to an execution notifier:
//! the scheduler calls these at well-defined points and leaves it to the
//! caller to decide what to do with them (append to a log buffer, emit a
//! metric, ignore). Every method has a no-op default so callers only
//! implement what they need.

use weave_errors::WeaveError;

pub trait SchedulerObserver: Send + Sync {
  fn node_started(&self, _node_id: &str, _attempt: u32) {}

  fn node_completed(&self, _node_id: &str, _attempt: u32) {}

  fn node_failed(&self, _node_id: &str, _attempt: u32, _error: &WeaveError) {}

  fn node_retrying(&self, _node_id: &str, _attempt: u32, _delay: std::time::Duration) {}

  fn schema_conflict(&self, _node_id: &str, _error: &weave_errors::SchemaConflictError) {}
}

/// Discards every notification. Useful for tests and for callers that don't
/// need per-node observability beyond ambient `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SchedulerObserver for NoopObserver {}
