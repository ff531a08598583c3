//! Scheduler-level tunables, threaded in by the engine's `EngineConfig`.

use std::time::Duration;

/// Bounds and timing the scheduler applies uniformly to every execution.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
  /// Ceiling on concurrently running worker tasks.
  pub max_parallel: usize,
  /// Applied to the whole execution, not per node.
  pub default_timeout: Duration,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      max_parallel: 10,
      default_timeout: Duration::from_secs(3600),
    }
  }
}

/// Per-workflow overrides of the retry/timeout defaults, read from the
/// workflow's own persisted settings.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowRunSettings {
  pub max_retries: u32,
  pub retry_delay: Duration,
  pub timeout: Duration,
}

impl WorkflowRunSettings {
  pub fn from_workflow(
    max_retries: Option<u32>,
    retry_delay_seconds: Option<u64>,
    timeout_seconds: Option<u64>,
    config: &SchedulerConfig,
  ) -> Self {
    Self {
      max_retries: max_retries.unwrap_or(0),
      retry_delay: Duration::from_secs(retry_delay_seconds.unwrap_or(0)),
      timeout: timeout_seconds.map(Duration::from_secs).unwrap_or(config.default_timeout),
    }
  }
}
