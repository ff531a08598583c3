//! The in-memory, post-build node representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use weave_connector::NodeCategory;

/// A node ready to be scheduled: identity, the connector it's backed by, and
/// its static config. `inputs`/`outputs` are populated by [`crate::builder`]
/// from the edge list so the scheduler never has to re-derive adjacency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  pub name: String,
  pub category: NodeCategory,
  pub connector_id: String,
  pub config: Value,
  /// Opaque editor layout data, carried through unexamined.
  #[serde(default)]
  pub position: Value,
  pub inputs: Vec<String>,
  pub outputs: Vec<String>,
  pub timeout_ms: Option<u64>,
  pub max_retry_attempts: Option<u32>,
}

impl Node {
  pub fn is_source(&self) -> bool {
    matches!(self.category, NodeCategory::Source)
  }

  pub fn is_destination(&self) -> bool {
    matches!(self.category, NodeCategory::Destination)
  }
}

/// A persisted node row, as read from the Store before building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
  pub id: String,
  pub name: String,
  pub category: NodeCategory,
  pub connector_id: String,
  #[serde(default = "default_config")]
  pub config: Value,
  #[serde(default)]
  pub position: Value,
  pub timeout_ms: Option<u64>,
  pub max_retry_attempts: Option<u32>,
}

fn default_config() -> Value {
  serde_json::json!({})
}

/// A persisted directed edge row, as read from the Store before building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRow {
  pub id: String,
  pub source_node_id: String,
  pub target_node_id: String,
}
