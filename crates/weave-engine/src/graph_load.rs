//! Loads a workflow's persisted nodes and edges and compiles them into a
//! [`Graph`], the same compilation path used by execution, validation, and
//! schema introspection alike.

use std::collections::BTreeMap;

use weave_graph::{build_graph, Graph};
use weave_store::{RecordKind, Store, WorkflowRecord};

use crate::convert::{edge_row_from_record, node_row_from_record};
use crate::error::EngineError;

pub(crate) async fn load_workflow(store: &dyn Store, workflow_id: &str) -> Result<WorkflowRecord, EngineError> {
  let record = store
    .find_by_id(RecordKind::Workflow, workflow_id)
    .await?
    .ok_or_else(|| EngineError::WorkflowNotFound { workflow_id: workflow_id.to_string() })?;
  Ok(record.as_workflow().expect("find_by_id(Workflow) returns that variant").clone())
}

/// Fetches every node and edge belonging to `workflow_id` and builds a
/// [`Graph`] from them. Built fresh on every call — a `Graph` is never
/// shared across executions or introspection requests.
pub(crate) async fn load_graph(store: &dyn Store, workflow_id: &str) -> Result<Graph, EngineError> {
  let mut node_filter = BTreeMap::new();
  node_filter.insert("workflow_id".to_string(), serde_json::Value::String(workflow_id.to_string()));
  let node_records = store.find_by_filter(RecordKind::WorkflowNode, &node_filter).await?;

  let mut edge_filter = BTreeMap::new();
  edge_filter.insert("workflow_id".to_string(), serde_json::Value::String(workflow_id.to_string()));
  let edge_records = store.find_by_filter(RecordKind::WorkflowConnection, &edge_filter).await?;

  let mut node_rows = Vec::with_capacity(node_records.len());
  for record in node_records {
    let node = record.as_workflow_node().expect("find_by_filter(WorkflowNode) returns that variant").clone();
    node_rows.push(node_row_from_record(node)?);
  }

  let edge_rows = edge_records
    .into_iter()
    .map(|record| edge_row_from_record(record.as_workflow_connection().expect("find_by_filter(WorkflowConnection) returns that variant").clone()))
    .collect();

  Ok(build_graph(node_rows, edge_rows))
}
