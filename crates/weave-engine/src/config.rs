//! Layered, typed engine configuration.
//!
//! Constructed once at the composition root (the CLI's `main`, or any other
//! owning process) and threaded through every subsystem the engine wires
//! together. Inner subsystems never read `std::env` themselves — a thin
//! env-var/file layer belongs to the process embedding the engine, not to
//! this crate.

use std::time::Duration;

use weave_scheduler::SchedulerConfig;

/// Every tunable the engine exposes, with the defaults from the system's
/// external-interfaces section.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
  pub max_parallel: usize,
  pub schema_cache_ttl: Duration,
  pub schema_cache_max: usize,
  pub log_flush_interval: Duration,
  pub log_flush_batch: usize,
  pub default_workflow_timeout: Duration,
  pub sample_limit_max: usize,
  pub sample_limit_default: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      max_parallel: 10,
      schema_cache_ttl: Duration::from_secs(5 * 60),
      schema_cache_max: 1000,
      log_flush_interval: Duration::from_secs(2),
      log_flush_batch: 10,
      default_workflow_timeout: Duration::from_secs(3600),
      sample_limit_max: 100,
      sample_limit_default: 20,
    }
  }
}

impl EngineConfig {
  pub(crate) fn scheduler_config(&self) -> SchedulerConfig {
    SchedulerConfig {
      max_parallel: self.max_parallel,
      default_timeout: self.default_workflow_timeout,
    }
  }

  pub(crate) fn log_flush_policy(&self) -> weave_log::FlushPolicy {
    weave_log::FlushPolicy {
      interval: self.log_flush_interval,
      batch: self.log_flush_batch,
    }
  }

  /// Clamps a caller-requested sample limit to `[1, sample_limit_max]`,
  /// substituting `sample_limit_default` when none is given.
  pub(crate) fn clamp_sample_limit(&self, requested: Option<usize>) -> usize {
    requested.unwrap_or(self.sample_limit_default).clamp(1, self.sample_limit_max)
  }
}
