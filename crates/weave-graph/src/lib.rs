//! Compiles persisted workflow nodes and edges into an in-memory graph and
//! checks it for well-formedness.
//!
//! A locked graph is validated (no dangling edges, no cycles, category
//! agreement between node and connector) and ready to be handed to the
//! scheduler. Graphs are cheap to rebuild and are never shared across
//! executions.

mod builder;
mod graph;
mod node;
mod validator;

pub use builder::{build_graph, is_temporary_edge_id, is_temporary_node_id, remap_temporary_ids};
pub use graph::Graph;
pub use node::{EdgeRow, Node, NodeRow};
pub use validator::{DisconnectedWarning, UnreachableWarning, ValidationResult, ValidationWarning, Validator};
