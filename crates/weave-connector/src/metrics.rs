//! Per-connector execution counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Invocation/success/failure counters for one connector id.
///
/// Cheap to clone (an `Arc` internally via [`ConnectorRegistry`]); updates
/// are lock-free atomics so recording a result never contends with the
/// scheduler's own locks.
#[derive(Debug, Default)]
pub struct ConnectorCounters {
  invocations: AtomicU64,
  successes: AtomicU64,
  failures: AtomicU64,
}

impl ConnectorCounters {
  pub fn record_invocation(&self) {
    self.invocations.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_success(&self) {
    self.successes.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_failure(&self) {
    self.failures.fetch_add(1, Ordering::Relaxed);
  }

  pub fn snapshot(&self) -> ConnectorCountersSnapshot {
    ConnectorCountersSnapshot {
      invocations: self.invocations.load(Ordering::Relaxed),
      successes: self.successes.load(Ordering::Relaxed),
      failures: self.failures.load(Ordering::Relaxed),
    }
  }
}

/// A point-in-time read of [`ConnectorCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectorCountersSnapshot {
  pub invocations: u64,
  pub successes: u64,
  pub failures: u64,
}
