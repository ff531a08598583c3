//! Conversions between the Store's persisted row shapes and the graph
//! crate's in-memory row shapes.
//!
//! The Store treats `category` as a plain string (its schema is agnostic to
//! the core's own enums); the graph crate wants a typed [`NodeCategory`].
//! This module is the one place that bridges the two.

use weave_connector::NodeCategory;
use weave_graph::{EdgeRow, NodeRow};
use weave_store::{WorkflowConnectionRecord, WorkflowNodeRecord};

use crate::error::EngineError;

pub(crate) fn category_from_str(raw: &str) -> Option<NodeCategory> {
  match raw {
    "source" => Some(NodeCategory::Source),
    "processor" => Some(NodeCategory::Processor),
    "destination" => Some(NodeCategory::Destination),
    _ => None,
  }
}

pub(crate) fn category_to_str(category: NodeCategory) -> &'static str {
  match category {
    NodeCategory::Source => "source",
    NodeCategory::Processor => "processor",
    NodeCategory::Destination => "destination",
  }
}

pub(crate) fn node_row_from_record(record: WorkflowNodeRecord) -> Result<NodeRow, EngineError> {
  let category = category_from_str(&record.category).ok_or_else(|| {
    EngineError::Weave(weave_errors::WeaveError::Validation(weave_errors::ValidationError::UnknownConnector {
      node_id: record.id.clone(),
      connector_id: format!("<unrecognised category '{}'>", record.category),
    }))
  })?;
  Ok(NodeRow {
    id: record.id,
    name: record.name,
    category,
    connector_id: record.connector_id,
    config: record.config,
    position: record.position,
    timeout_ms: record.timeout_ms,
    max_retry_attempts: record.max_retry_attempts,
  })
}

pub(crate) fn node_record_from_row(workflow_id: &str, row: &NodeRow) -> WorkflowNodeRecord {
  WorkflowNodeRecord {
    id: row.id.clone(),
    workflow_id: workflow_id.to_string(),
    name: row.name.clone(),
    category: category_to_str(row.category).to_string(),
    connector_id: row.connector_id.clone(),
    config: row.config.clone(),
    position: row.position.clone(),
    timeout_ms: row.timeout_ms,
    max_retry_attempts: row.max_retry_attempts,
  }
}

pub(crate) fn edge_row_from_record(record: WorkflowConnectionRecord) -> EdgeRow {
  EdgeRow {
    id: record.id,
    source_node_id: record.source_node_id,
    target_node_id: record.target_node_id,
  }
}

pub(crate) fn edge_record_from_row(workflow_id: &str, row: &EdgeRow) -> WorkflowConnectionRecord {
  WorkflowConnectionRecord {
    id: row.id.clone(),
    workflow_id: workflow_id.to_string(),
    source_node_id: row.source_node_id.clone(),
    target_node_id: row.target_node_id.clone(),
  }
}
