//! The kind-tagged record wrapper the [`crate::Store`] trait exchanges.

use serde::{Deserialize, Serialize};

use crate::types::{WorkflowConnectionRecord, WorkflowExecutionRecord, WorkflowNodeRecord, WorkflowRecord};

/// Which of the four persisted entity kinds a [`Record`] or a lookup refers
/// to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordKind {
  Workflow,
  WorkflowNode,
  WorkflowConnection,
  WorkflowExecution,
}

/// A typed union of the four record kinds the Store moves around.
///
/// The core never inspects a `Record` through anything other than the kind
/// it expected back from `find_by_id`/`find_by_filter` — a Store
/// implementation returning the wrong variant for a given `RecordKind` is a
/// programming error, not a recoverable one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Record {
  Workflow(WorkflowRecord),
  WorkflowNode(WorkflowNodeRecord),
  WorkflowConnection(WorkflowConnectionRecord),
  WorkflowExecution(WorkflowExecutionRecord),
}

impl Record {
  pub fn kind(&self) -> RecordKind {
    match self {
      Record::Workflow(_) => RecordKind::Workflow,
      Record::WorkflowNode(_) => RecordKind::WorkflowNode,
      Record::WorkflowConnection(_) => RecordKind::WorkflowConnection,
      Record::WorkflowExecution(_) => RecordKind::WorkflowExecution,
    }
  }

  pub fn id(&self) -> &str {
    match self {
      Record::Workflow(r) => &r.id,
      Record::WorkflowNode(r) => &r.id,
      Record::WorkflowConnection(r) => &r.id,
      Record::WorkflowExecution(r) => &r.id,
    }
  }

  /// Filter matching used by in-memory/test `Store` implementations:
  /// `filter` is satisfied when every named field, serialized to JSON,
  /// equals the record's own value for that field.
  pub fn matches_filter(&self, filter: &std::collections::BTreeMap<String, serde_json::Value>) -> bool {
    let value = match serde_json::to_value(self) {
      Ok(v) => v,
      Err(_) => return false,
    };
    filter.iter().all(|(field, expected)| value.get(field) == Some(expected))
  }

  pub fn as_workflow(&self) -> Option<&WorkflowRecord> {
    match self {
      Record::Workflow(r) => Some(r),
      _ => None,
    }
  }

  pub fn as_workflow_node(&self) -> Option<&WorkflowNodeRecord> {
    match self {
      Record::WorkflowNode(r) => Some(r),
      _ => None,
    }
  }

  pub fn as_workflow_connection(&self) -> Option<&WorkflowConnectionRecord> {
    match self {
      Record::WorkflowConnection(r) => Some(r),
      _ => None,
    }
  }

  pub fn as_workflow_execution(&self) -> Option<&WorkflowExecutionRecord> {
    match self {
      Record::WorkflowExecution(r) => Some(r),
      _ => None,
    }
  }
}
