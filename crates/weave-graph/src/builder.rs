//! Compiles persisted node/edge rows into a [`Graph`].

use std::collections::BTreeMap;

use crate::graph::Graph;
use crate::node::{EdgeRow, Node, NodeRow};

/// A temporary, client-generated id (not yet assigned by the Store) carries
/// one of these prefixes. [`remap_temporary_ids`] replaces them with durable
/// ids minted by the caller before the graph is built for real.
pub const TEMP_NODE_PREFIX: &str = "node_";
pub const TEMP_EDGE_PREFIX: &str = "edge_";

pub fn is_temporary_node_id(id: &str) -> bool {
  id.starts_with(TEMP_NODE_PREFIX)
}

pub fn is_temporary_edge_id(id: &str) -> bool {
  id.starts_with(TEMP_EDGE_PREFIX)
}

/// Rewrites temporary node ids to durable ones, consistently across both the
/// node rows and every edge endpoint that references them.
///
/// `mint` is called once per distinct temporary id and must return a fresh
/// durable id; the builder does not itself talk to the Store.
pub fn remap_temporary_ids(
  mut nodes: Vec<NodeRow>,
  mut edges: Vec<EdgeRow>,
  mut mint: impl FnMut(&str) -> String,
) -> (Vec<NodeRow>, Vec<EdgeRow>) {
  let mut remap: BTreeMap<String, String> = BTreeMap::new();

  for node in &mut nodes {
    if is_temporary_node_id(&node.id) {
      let durable = remap.entry(node.id.clone()).or_insert_with_key(|id| mint(id)).clone();
      node.id = durable;
    }
  }

  for edge in &mut edges {
    if let Some(durable) = remap.get(&edge.source_node_id) {
      edge.source_node_id = durable.clone();
    }
    if let Some(durable) = remap.get(&edge.target_node_id) {
      edge.target_node_id = durable.clone();
    }
  }

  (nodes, edges)
}

/// Builds a [`Graph`] from persisted rows.
///
/// Populates each [`Node`]'s `inputs`/`outputs` from the edge list. Edges
/// whose endpoints are missing from `nodes` are kept out of the adjacency
/// (the [`crate::validator::Validator`] reports them, the builder does not
/// reject them outright so that validation can report every problem at once).
pub fn build_graph(node_rows: Vec<NodeRow>, edges: Vec<EdgeRow>) -> Graph {
  let node_ids: std::collections::BTreeSet<String> = node_rows.iter().map(|n| n.id.clone()).collect();

  let mut inputs: BTreeMap<String, Vec<String>> = BTreeMap::new();
  let mut outputs: BTreeMap<String, Vec<String>> = BTreeMap::new();

  for edge in &edges {
    if !node_ids.contains(&edge.source_node_id) || !node_ids.contains(&edge.target_node_id) {
      continue;
    }
    outputs.entry(edge.source_node_id.clone()).or_default().push(edge.target_node_id.clone());
    inputs.entry(edge.target_node_id.clone()).or_default().push(edge.source_node_id.clone());
  }

  let nodes: BTreeMap<String, Node> = node_rows
    .into_iter()
    .map(|row| {
      let node = Node {
        inputs: inputs.remove(&row.id).unwrap_or_default(),
        outputs: outputs.remove(&row.id).unwrap_or_default(),
        id: row.id.clone(),
        name: row.name,
        category: row.category,
        connector_id: row.connector_id,
        config: row.config,
        position: row.position,
        timeout_ms: row.timeout_ms,
        max_retry_attempts: row.max_retry_attempts,
      };
      (row.id, node)
    })
    .collect();

  Graph::new(nodes, edges)
}

#[cfg(test)]
mod tests {
  use super::*;
  use weave_connector::NodeCategory;

  fn node_row(id: &str, category: NodeCategory) -> NodeRow {
    NodeRow {
      id: id.to_string(),
      name: id.to_string(),
      category,
      connector_id: "noop".to_string(),
      config: serde_json::json!({}),
      position: serde_json::json!({}),
      timeout_ms: None,
      max_retry_attempts: None,
    }
  }

  fn edge_row(id: &str, from: &str, to: &str) -> EdgeRow {
    EdgeRow {
      id: id.to_string(),
      source_node_id: from.to_string(),
      target_node_id: to.to_string(),
    }
  }

  #[test]
  fn build_graph_populates_inputs_and_outputs() {
    let nodes = vec![node_row("a", NodeCategory::Source), node_row("b", NodeCategory::Destination)];
    let edges = vec![edge_row("e1", "a", "b")];
    let graph = build_graph(nodes, edges);
    assert_eq!(graph.node("a").unwrap().outputs, vec!["b".to_string()]);
    assert_eq!(graph.node("b").unwrap().inputs, vec!["a".to_string()]);
  }

  #[test]
  fn build_graph_ignores_edges_with_missing_endpoints() {
    let nodes = vec![node_row("a", NodeCategory::Source)];
    let edges = vec![edge_row("e1", "a", "missing")];
    let graph = build_graph(nodes, edges);
    assert!(graph.node("a").unwrap().outputs.is_empty());
  }

  #[test]
  fn remap_temporary_ids_rewrites_nodes_and_edges_consistently() {
    let nodes = vec![node_row("node_abc", NodeCategory::Source), node_row("b", NodeCategory::Destination)];
    let edges = vec![edge_row("edge_1", "node_abc", "b")];
    let mut counter = 0;
    let (nodes, edges) = remap_temporary_ids(nodes, edges, |_| {
      counter += 1;
      format!("durable-{counter}")
    });
    assert_eq!(nodes[0].id, "durable-1");
    assert_eq!(edges[0].source_node_id, "durable-1");
    assert_eq!(edges[0].target_node_id, "b");
  }

  #[test]
  fn remap_temporary_ids_mints_once_per_distinct_id() {
    let nodes = vec![node_row("node_abc", NodeCategory::Source)];
    let edges = vec![edge_row("edge_1", "node_abc", "node_abc")];
    let mut calls = 0;
    let (_, edges) = remap_temporary_ids(nodes, edges, |_| {
      calls += 1;
      "durable-1".to_string()
    });
    assert_eq!(calls, 1);
    assert_eq!(edges[0].source_node_id, "durable-1");
    assert_eq!(edges[0].target_node_id, "durable-1");
  }
}
