//! The flush-throttled log buffer for one execution.

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::instrument;
use weave_store::{ExecutionStatus, Record, RecordKind, Store, StoreError};

use crate::event::{LogEvent, LogLevel};

/// Flush thresholds. Defaults come from the owning `EngineConfig`
/// (`log_flush_interval=2s`, `log_flush_batch=10`); this crate takes them as
/// plain values so it has no dependency on the engine's config type.
#[derive(Debug, Clone, Copy)]
pub struct FlushPolicy {
  pub interval: Duration,
  pub batch: usize,
}

impl Default for FlushPolicy {
  fn default() -> Self {
    Self {
      interval: Duration::from_secs(2),
      batch: 10,
    }
  }
}

struct State {
  events: Vec<LogEvent>,
  last_flush: Instant,
}

/// Structured, per-execution audit log. Distinct from ordinary `tracing`
/// instrumentation: this buffer persists to the execution record for
/// durable, per-execution review; `tracing` is for process-wide operational
/// observability and is emitted independently by every subsystem.
///
/// Append is mutex-guarded. A flush writes the buffer to the execution
/// record when either at least `policy.interval` has elapsed since the
/// previous flush, or the buffer holds at least `policy.batch` events.
/// Terminal transitions always force a flush regardless of the policy.
pub struct ExecutionLogBuffer {
  execution_id: String,
  policy: FlushPolicy,
  state: Mutex<State>,
}

impl ExecutionLogBuffer {
  pub fn new(execution_id: impl Into<String>, policy: FlushPolicy) -> Self {
    Self {
      execution_id: execution_id.into(),
      policy,
      state: Mutex::new(State {
        events: Vec::new(),
        last_flush: Instant::now(),
      }),
    }
  }

  /// Appends one event and flushes if the policy threshold is reached.
  #[instrument(skip(self, store), fields(execution_id = %self.execution_id))]
  pub async fn append(&self, store: &dyn Store, event: LogEvent) -> Result<(), StoreError> {
    let mut state = self.state.lock().await;
    state.events.push(event);
    let due = state.last_flush.elapsed() >= self.policy.interval || state.events.len() >= self.policy.batch;
    if due {
      self.flush_locked(store, &mut state).await?;
    }
    Ok(())
  }

  pub async fn info(&self, store: &dyn Store, message: impl Into<String>) -> Result<(), StoreError> {
    self.append(store, LogEvent::new(chrono::Utc::now(), LogLevel::Info, message)).await
  }

  pub async fn warn(&self, store: &dyn Store, message: impl Into<String>) -> Result<(), StoreError> {
    self.append(store, LogEvent::new(chrono::Utc::now(), LogLevel::Warn, message)).await
  }

  pub async fn error(&self, store: &dyn Store, message: impl Into<String>) -> Result<(), StoreError> {
    self.append(store, LogEvent::new(chrono::Utc::now(), LogLevel::Error, message)).await
  }

  /// Flushes unconditionally. Used by a periodic background tick so a
  /// long-idle execution's logs still reach the Store within `interval`.
  pub async fn flush(&self, store: &dyn Store) -> Result<(), StoreError> {
    let mut state = self.state.lock().await;
    self.flush_locked(store, &mut state).await
  }

  async fn flush_locked(&self, store: &dyn Store, state: &mut State) -> Result<(), StoreError> {
    let mut record = self.load(store).await?;
    record.logs = Value::Array(state.events.iter().map(|e| serde_json::to_value(e).expect("LogEvent always serializes")).collect());
    store.save(Record::WorkflowExecution(record)).await?;
    state.last_flush = Instant::now();
    Ok(())
  }

  /// Forces a final flush that also stamps the terminal fields. Called
  /// exactly once per execution, at its `completed`/`failed`/`cancelled`
  /// transition.
  #[instrument(skip(self, store, results), fields(execution_id = %self.execution_id))]
  pub async fn flush_terminal(
    &self,
    store: &dyn Store,
    status: ExecutionStatus,
    end_time: chrono::DateTime<chrono::Utc>,
    duration_ms: u64,
    error_message: Option<String>,
    results: Value,
  ) -> Result<(), StoreError> {
    let mut state = self.state.lock().await;
    let mut record = self.load(store).await?;
    record.status = status;
    record.end_time = Some(end_time);
    record.duration_ms = Some(duration_ms);
    record.error_message = error_message;
    record.results = results;
    record.logs = Value::Array(state.events.iter().map(|e| serde_json::to_value(e).expect("LogEvent always serializes")).collect());
    store.save(Record::WorkflowExecution(record)).await?;
    state.last_flush = Instant::now();
    Ok(())
  }

  async fn load(&self, store: &dyn Store) -> Result<weave_store::WorkflowExecutionRecord, StoreError> {
    let record = store
      .find_by_id(RecordKind::WorkflowExecution, &self.execution_id)
      .await?
      .ok_or_else(|| StoreError::NotFound {
        kind: RecordKind::WorkflowExecution,
        id: self.execution_id.clone(),
      })?;
    Ok(record.as_workflow_execution().expect("find_by_id(WorkflowExecution) returns that variant").clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use weave_store::{MemoryStore, WorkflowExecutionRecord};

  async fn seed(store: &MemoryStore, execution_id: &str) {
    store
      .save(Record::WorkflowExecution(WorkflowExecutionRecord::new_running(
        execution_id,
        "wf1",
        chrono::Utc::now(),
      )))
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn flush_triggers_at_batch_threshold() {
    let store = MemoryStore::new();
    seed(&store, "exec1").await;
    let buffer = ExecutionLogBuffer::new("exec1", FlushPolicy { interval: Duration::from_secs(3600), batch: 3 });

    for i in 0..3 {
      buffer.info(&store, format!("event {i}")).await.unwrap();
    }

    let record = store.find_by_id(RecordKind::WorkflowExecution, "exec1").await.unwrap().unwrap();
    let logs = record.as_workflow_execution().unwrap().logs.as_array().unwrap();
    assert_eq!(logs.len(), 3);
  }

  #[tokio::test]
  async fn below_threshold_does_not_flush() {
    let store = MemoryStore::new();
    seed(&store, "exec1").await;
    let buffer = ExecutionLogBuffer::new("exec1", FlushPolicy { interval: Duration::from_secs(3600), batch: 10 });

    buffer.info(&store, "only one event").await.unwrap();

    let record = store.find_by_id(RecordKind::WorkflowExecution, "exec1").await.unwrap().unwrap();
    let logs = record.as_workflow_execution().unwrap().logs.as_array().unwrap();
    assert!(logs.is_empty());
  }

  #[tokio::test]
  async fn flush_terminal_always_writes_regardless_of_policy() {
    let store = MemoryStore::new();
    seed(&store, "exec1").await;
    let buffer = ExecutionLogBuffer::new("exec1", FlushPolicy { interval: Duration::from_secs(3600), batch: 10 });

    buffer.info(&store, "one event").await.unwrap();
    buffer
      .flush_terminal(&store, ExecutionStatus::Completed, chrono::Utc::now(), 42, None, serde_json::json!({}))
      .await
      .unwrap();

    let record = store.find_by_id(RecordKind::WorkflowExecution, "exec1").await.unwrap().unwrap();
    let execution = record.as_workflow_execution().unwrap();
    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.duration_ms, Some(42));
    assert_eq!(execution.logs.as_array().unwrap().len(), 1);
  }
}
