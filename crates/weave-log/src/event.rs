//! A single structured log event in an execution's audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
  Info,
  Warn,
  Error,
}

/// One append to an execution's log. `metadata` carries free-form,
/// event-specific fields (e.g. `node_id`, `attempt`) flattened alongside the
/// fixed fields on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
  pub timestamp: DateTime<Utc>,
  pub level: LogLevel,
  pub message: String,
  #[serde(flatten)]
  pub metadata: Map<String, Value>,
}

impl LogEvent {
  pub fn new(timestamp: DateTime<Utc>, level: LogLevel, message: impl Into<String>) -> Self {
    Self {
      timestamp,
      level,
      message: message.into(),
      metadata: Map::new(),
    }
  }

  pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.metadata.insert(key.into(), value.into());
    self
  }
}
