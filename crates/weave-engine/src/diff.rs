//! `save_workflow_graph`'s diff-upsert: delete what's gone, update what
//! persists, create what's new, remapping any client-generated temporary
//! ids to durable ones along the way.

use std::collections::BTreeSet;

use weave_cache::SchemaCache;
use weave_graph::{remap_temporary_ids, EdgeRow, NodeRow};
use weave_store::{Record, RecordKind, Store};

use crate::convert::{edge_record_from_row, node_record_from_row};
use crate::error::EngineError;
use crate::graph_load::load_graph;

/// Replaces `workflow_id`'s persisted nodes and edges with `nodes`/`edges`,
/// minting durable ids for any temporary (`node_…`/`edge_…`) ones first.
///
/// Invalidates every cached schema for `workflow_id`: a changed graph can
/// change any downstream node's derived schema, and the cache has no way to
/// tell which entries are still valid without re-deriving them anyway.
///
/// Returns the final, durable-id node and edge rows as actually persisted.
pub(crate) async fn save_workflow_graph(
  store: &dyn Store,
  cache: &SchemaCache,
  workflow_id: &str,
  nodes: Vec<NodeRow>,
  edges: Vec<EdgeRow>,
) -> Result<(Vec<NodeRow>, Vec<EdgeRow>), EngineError> {
  let (nodes, edges) = remap_temporary_ids(nodes, edges, |_old| uuid::Uuid::new_v4().to_string());

  let existing = load_graph(store, workflow_id).await?;
  let existing_node_ids: BTreeSet<String> = existing.nodes().keys().cloned().collect();
  let existing_edge_ids: BTreeSet<String> = existing.edges().iter().map(|e| e.id.clone()).collect();

  let new_node_ids: BTreeSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
  let new_edge_ids: BTreeSet<String> = edges.iter().map(|e| e.id.clone()).collect();

  for stale_id in existing_node_ids.difference(&new_node_ids) {
    store.delete(RecordKind::WorkflowNode, stale_id).await?;
  }
  for stale_id in existing_edge_ids.difference(&new_edge_ids) {
    store.delete(RecordKind::WorkflowConnection, stale_id).await?;
  }

  for node in &nodes {
    store.save(Record::WorkflowNode(node_record_from_row(workflow_id, node))).await?;
  }
  for edge in &edges {
    store.save(Record::WorkflowConnection(edge_record_from_row(workflow_id, edge))).await?;
  }

  cache.invalidate_workflow(workflow_id);

  Ok((nodes, edges))
}
