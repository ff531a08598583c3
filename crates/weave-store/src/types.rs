//! The four record kinds the engine persists through the [`crate::Store`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A workflow execution's terminal or in-flight state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
  Running,
  Completed,
  Failed,
  Cancelled,
}

/// A workflow's static, persisted settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
  pub id: String,
  pub name: String,
  pub timeout_seconds: Option<u64>,
  pub max_retries: Option<u32>,
  pub retry_delay_seconds: Option<u64>,
}

/// A persisted node belonging to a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNodeRecord {
  pub id: String,
  pub workflow_id: String,
  pub name: String,
  /// `"source" | "processor" | "destination"`.
  pub category: String,
  pub connector_id: String,
  pub config: Value,
  #[serde(default)]
  pub position: Value,
  pub timeout_ms: Option<u64>,
  pub max_retry_attempts: Option<u32>,
}

/// A persisted directed edge between two nodes in the same workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConnectionRecord {
  pub id: String,
  pub workflow_id: String,
  pub source_node_id: String,
  pub target_node_id: String,
}

/// A single run of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecutionRecord {
  pub id: String,
  pub workflow_id: String,
  pub status: ExecutionStatus,
  pub start_time: DateTime<Utc>,
  pub end_time: Option<DateTime<Utc>>,
  pub duration_ms: Option<u64>,
  pub error_message: Option<String>,
  /// JSON array of structured log events.
  pub logs: Value,
  /// JSON object keyed by destination node id.
  pub results: Value,
}

impl WorkflowExecutionRecord {
  pub fn new_running(id: impl Into<String>, workflow_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
    Self {
      id: id.into(),
      workflow_id: workflow_id.into(),
      status: ExecutionStatus::Running,
      start_time,
      end_time: None,
      duration_ms: None,
      error_message: None,
      logs: Value::Array(Vec::new()),
      results: Value::Object(serde_json::Map::new()),
    }
  }
}
