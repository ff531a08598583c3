//! The three node categories a connector can be registered under.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node's position in the data-flow: where records enter, pass through,
/// or leave the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
  Source,
  Processor,
  Destination,
}

impl fmt::Display for NodeCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      NodeCategory::Source => "source",
      NodeCategory::Processor => "processor",
      NodeCategory::Destination => "destination",
    };
    f.write_str(s)
  }
}
