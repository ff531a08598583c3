//! The engine's own error type: every failure an API method can return,
//! whether it originated in the Store or in the core's own taxonomy.

use weave_errors::WeaveError;
use weave_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Weave(#[from] WeaveError),

  #[error("no workflow found for id '{workflow_id}'")]
  WorkflowNotFound { workflow_id: String },

  #[error("no execution found for id '{execution_id}'")]
  ExecutionNotFound { execution_id: String },

  #[error("no node '{node_id}' in workflow '{workflow_id}'")]
  NodeNotFound { workflow_id: String, node_id: String },

  #[error("node '{node_id}' reintroduces a cycle during sample preview")]
  PreviewCycle { node_id: String },
}
