//! Graph structure for traversal and validation.

use std::collections::{BTreeMap, BTreeSet};

use crate::node::{EdgeRow, Node};

/// An in-memory compiled graph: nodes plus the adjacency derived from edges.
///
/// Built fresh at execution start and at every schema-introspection call; a
/// `Graph` is never shared across executions, so it carries no interior
/// mutability.
#[derive(Debug, Clone)]
pub struct Graph {
  nodes: BTreeMap<String, Node>,
  edges: Vec<EdgeRow>,
  adjacency: BTreeMap<String, Vec<String>>,
  reverse_adjacency: BTreeMap<String, Vec<String>>,
  entry_points: Vec<String>,
  join_points: BTreeSet<String>,
}

impl Graph {
  /// Builds a graph from already-constructed nodes and their edges.
  ///
  /// Does not validate well-formedness — see [`crate::validator::Validator`].
  /// Edges referencing a missing node are simply not reflected in the
  /// adjacency; the validator is responsible for reporting that as an error.
  pub fn new(nodes: BTreeMap<String, Node>, edges: Vec<EdgeRow>) -> Self {
    let mut adjacency: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut reverse_adjacency: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for node_id in nodes.keys() {
      adjacency.entry(node_id.clone()).or_default();
      reverse_adjacency.entry(node_id.clone()).or_default();
    }

    for edge in &edges {
      if !nodes.contains_key(&edge.source_node_id) || !nodes.contains_key(&edge.target_node_id) {
        continue;
      }
      adjacency
        .entry(edge.source_node_id.clone())
        .or_default()
        .push(edge.target_node_id.clone());
      reverse_adjacency
        .entry(edge.target_node_id.clone())
        .or_default()
        .push(edge.source_node_id.clone());
    }

    let entry_points: Vec<String> = nodes
      .keys()
      .filter(|id| reverse_adjacency.get(*id).is_none_or(|v| v.is_empty()))
      .cloned()
      .collect();

    let join_points: BTreeSet<String> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(id, _)| id.clone())
      .collect();

    Self {
      nodes,
      edges,
      adjacency,
      reverse_adjacency,
      entry_points,
      join_points,
    }
  }

  pub fn node(&self, node_id: &str) -> Option<&Node> {
    self.nodes.get(node_id)
  }

  pub fn nodes(&self) -> &BTreeMap<String, Node> {
    &self.nodes
  }

  pub fn edges(&self) -> &[EdgeRow] {
    &self.edges
  }

  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Downstream node ids for `node_id`, in edge-insertion order.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self.adjacency.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Upstream node ids for `node_id`, in edge-insertion order.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self.reverse_adjacency.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
  }

  pub fn is_join_point(&self, node_id: &str) -> bool {
    self.join_points.contains(node_id)
  }

  pub fn join_points(&self) -> &BTreeSet<String> {
    &self.join_points
  }

  /// Detects cycles with a DFS recursion-stack set. Returns the first cycle
  /// found as a sequence of node ids, or `None` if the graph is acyclic.
  pub fn find_cycle(&self) -> Option<Vec<String>> {
    let mut marks: BTreeMap<&str, MarkState> = BTreeMap::new();
    let mut stack: Vec<String> = Vec::new();

    for start in self.nodes.keys() {
      if marks.contains_key(start.as_str()) {
        continue;
      }
      if let Some(cycle) = self.visit(start, &mut marks, &mut stack) {
        return Some(cycle);
      }
    }
    None
  }

  fn visit<'a>(
    &'a self,
    node_id: &'a str,
    marks: &mut BTreeMap<&'a str, MarkState>,
    stack: &mut Vec<String>,
  ) -> Option<Vec<String>> {
    marks.insert(node_id, MarkState::InProgress);
    stack.push(node_id.to_string());

    for next in self.downstream(node_id) {
      match marks.get(next.as_str()) {
        Some(MarkState::InProgress) => {
          let start = stack.iter().position(|id| id == next).unwrap_or(0);
          let mut cycle = stack[start..].to_vec();
          cycle.push(next.clone());
          return Some(cycle);
        }
        Some(MarkState::Done) => continue,
        None => {
          if let Some(cycle) = self.visit(next, marks, stack) {
            return Some(cycle);
          }
        }
      }
    }

    stack.pop();
    marks.insert(node_id, MarkState::Done);
    None
  }

  /// Node ids reachable from any entry point (source), via a DFS from each.
  pub fn reachable_from_sources(&self, sources: &[String]) -> BTreeSet<String> {
    let mut visited = BTreeSet::new();
    let mut stack: Vec<String> = sources.to_vec();
    while let Some(id) = stack.pop() {
      if !visited.insert(id.clone()) {
        continue;
      }
      for next in self.downstream(&id) {
        if !visited.contains(next) {
          stack.push(next.clone());
        }
      }
    }
    visited
  }
}

#[derive(Clone, Copy, PartialEq)]
enum MarkState {
  InProgress,
  Done,
}

#[cfg(test)]
mod tests {
  use super::*;
  use weave_connector::NodeCategory;

  fn node(id: &str, category: NodeCategory) -> Node {
    Node {
      id: id.to_string(),
      name: id.to_string(),
      category,
      connector_id: "noop".to_string(),
      config: serde_json::json!({}),
      position: serde_json::json!({}),
      inputs: Vec::new(),
      outputs: Vec::new(),
      timeout_ms: None,
      max_retry_attempts: None,
    }
  }

  fn edge(id: &str, from: &str, to: &str) -> EdgeRow {
    EdgeRow {
      id: id.to_string(),
      source_node_id: from.to_string(),
      target_node_id: to.to_string(),
    }
  }

  #[test]
  fn entry_points_are_nodes_with_no_incoming_edges() {
    let nodes = BTreeMap::from([
      ("a".to_string(), node("a", NodeCategory::Source)),
      ("b".to_string(), node("b", NodeCategory::Destination)),
    ]);
    let graph = Graph::new(nodes, vec![edge("e1", "a", "b")]);
    assert_eq!(graph.entry_points(), &["a".to_string()]);
  }

  #[test]
  fn join_point_detected_for_multiple_incoming_edges() {
    let nodes = BTreeMap::from([
      ("a".to_string(), node("a", NodeCategory::Source)),
      ("b".to_string(), node("b", NodeCategory::Source)),
      ("c".to_string(), node("c", NodeCategory::Destination)),
    ]);
    let graph = Graph::new(nodes, vec![edge("e1", "a", "c"), edge("e2", "b", "c")]);
    assert!(graph.is_join_point("c"));
    assert!(!graph.is_join_point("a"));
  }

  #[test]
  fn find_cycle_detects_back_edge() {
    let nodes = BTreeMap::from([
      ("a".to_string(), node("a", NodeCategory::Source)),
      ("b".to_string(), node("b", NodeCategory::Processor)),
      ("c".to_string(), node("c", NodeCategory::Destination)),
    ]);
    let graph = Graph::new(
      nodes,
      vec![edge("e1", "a", "b"), edge("e2", "b", "c"), edge("e3", "c", "a")],
    );
    let cycle = graph.find_cycle().expect("cycle should be detected");
    assert!(cycle.contains(&"a".to_string()));
  }

  #[test]
  fn acyclic_graph_has_no_cycle() {
    let nodes = BTreeMap::from([
      ("a".to_string(), node("a", NodeCategory::Source)),
      ("b".to_string(), node("b", NodeCategory::Destination)),
    ]);
    let graph = Graph::new(nodes, vec![edge("e1", "a", "b")]);
    assert!(graph.find_cycle().is_none());
  }

  #[test]
  fn reachable_from_sources_excludes_disconnected_node() {
    let nodes = BTreeMap::from([
      ("a".to_string(), node("a", NodeCategory::Source)),
      ("b".to_string(), node("b", NodeCategory::Destination)),
      ("orphan".to_string(), node("orphan", NodeCategory::Processor)),
    ]);
    let graph = Graph::new(nodes, vec![edge("e1", "a", "b")]);
    let reachable = graph.reachable_from_sources(graph.entry_points());
    assert!(reachable.contains("a"));
    assert!(reachable.contains("b"));
    assert!(!reachable.contains("orphan"));
  }
}
