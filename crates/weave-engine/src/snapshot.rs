//! `get_execution_status`'s return shape: the persisted execution record
//! with its JSON `logs`/`results` columns parsed into real types instead of
//! left as opaque `Value`s for the caller to re-parse.

use chrono::{DateTime, Utc};
use serde::Serialize;
use weave_log::LogEvent;
use weave_store::{ExecutionStatus, WorkflowExecutionRecord};

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSnapshot {
  pub id: String,
  pub workflow_id: String,
  pub status: ExecutionStatus,
  pub start_time: DateTime<Utc>,
  pub end_time: Option<DateTime<Utc>>,
  pub duration_ms: Option<u64>,
  pub error_message: Option<String>,
  pub logs: Vec<LogEvent>,
  /// JSON object keyed by destination node id, as written by the runner.
  pub results: serde_json::Value,
}

impl From<WorkflowExecutionRecord> for ExecutionSnapshot {
  /// Malformed log entries (should not occur — the buffer is the only
  /// writer) are dropped rather than failing the whole snapshot.
  fn from(record: WorkflowExecutionRecord) -> Self {
    let logs = record
      .logs
      .as_array()
      .map(|events| events.iter().filter_map(|v| serde_json::from_value(v.clone()).ok()).collect())
      .unwrap_or_default();

    Self {
      id: record.id,
      workflow_id: record.workflow_id,
      status: record.status,
      start_time: record.start_time,
      end_time: record.end_time,
      duration_ms: record.duration_ms,
      error_message: record.error_message,
      logs,
      results: record.results,
    }
  }
}
