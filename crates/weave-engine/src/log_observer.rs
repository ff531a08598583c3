//! Bridges [`SchedulerObserver`]'s synchronous callbacks to the async,
//! mutex-guarded [`ExecutionLogBuffer`].
//!
//! The scheduler calls observer methods from inside a worker task with no
//! `.await` point available at the call site; rather than spawn one
//! detached task per event (which would let appends interleave out of
//! order and race the terminal flush), each event is pushed onto an
//! unbounded channel and a single drain task applies them to the buffer in
//! the order they were produced. The runner awaits the drain task's join
//! handle before calling `flush_terminal`, so every event is guaranteed
//! written before the execution record's terminal fields are.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use weave_errors::{SchemaConflictError, WeaveError};
use weave_log::{ExecutionLogBuffer, LogEvent, LogLevel};
use weave_scheduler::SchedulerObserver;
use weave_store::Store;

pub(crate) struct LogObserver {
  tx: mpsc::UnboundedSender<LogEvent>,
}

impl LogObserver {
  /// Spawns the drain task and returns the observer plus its join handle.
  /// Drop the observer (or simply let it go out of scope) to close the
  /// channel; the drain task exits once it has processed everything sent
  /// before the close.
  pub(crate) fn spawn(buffer: Arc<ExecutionLogBuffer>, store: Arc<dyn Store>) -> (Self, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<LogEvent>();
    let handle = tokio::spawn(async move {
      while let Some(event) = rx.recv().await {
        if buffer.append(store.as_ref(), event).await.is_err() {
          break;
        }
      }
    });
    (Self { tx }, handle)
  }

  fn send(&self, level: LogLevel, message: String, node_id: &str, attempt: u32) {
    let event = LogEvent::new(chrono::Utc::now(), level, message)
      .with_metadata("node_id", node_id)
      .with_metadata("attempt", attempt);
    let _ = self.tx.send(event);
  }
}

impl SchedulerObserver for LogObserver {
  fn node_started(&self, node_id: &str, attempt: u32) {
    self.send(LogLevel::Info, format!("node '{node_id}' started (attempt {attempt})"), node_id, attempt);
  }

  fn node_completed(&self, node_id: &str, attempt: u32) {
    self.send(LogLevel::Info, format!("node '{node_id}' completed"), node_id, attempt);
  }

  fn node_failed(&self, node_id: &str, attempt: u32, error: &WeaveError) {
    self.send(LogLevel::Error, format!("node '{node_id}' failed after {attempt} attempt(s): {error}"), node_id, attempt);
  }

  fn node_retrying(&self, node_id: &str, attempt: u32, delay: Duration) {
    self.send(
      LogLevel::Warn,
      format!("node '{node_id}' attempt {attempt} failed, retrying in {delay:?}"),
      node_id,
      attempt,
    );
  }

  fn schema_conflict(&self, node_id: &str, error: &SchemaConflictError) {
    self.send(LogLevel::Warn, format!("schema conflict on node '{node_id}': {}", error.message), node_id, 0);
  }
}
