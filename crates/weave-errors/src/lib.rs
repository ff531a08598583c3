//! Shared error taxonomy for the weave workflow engine.
//!
//! Every error that can cross a module boundary in weave is a variant of
//! [`WeaveError`] (or wraps cleanly into one). Errors carry enough structure
//! (node id, connector id, underlying cause) to format a complete
//! `error_message` for a [`WorkflowExecution`](https://docs.rs/weave-store)
//! record — callers should not need to re-derive context from a bare string.

use serde::{Deserialize, Serialize};

/// Graph or node-config well-formedness failures.
///
/// Surfaced by `validate_workflow` and checked again at execution start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationError {
  #[error("workflow has no nodes")]
  NoNodes,

  #[error("workflow has no source node")]
  NoSource,

  #[error("workflow has no destination node")]
  NoDestination,

  #[error("node '{node_id}' references unknown connector '{connector_id}'")]
  UnknownConnector { node_id: String, connector_id: String },

  #[error(
    "node '{node_id}' has category '{node_category}' but connector '{connector_id}' is registered as '{connector_category}'"
  )]
  CategoryMismatch {
    node_id: String,
    node_category: String,
    connector_id: String,
    connector_category: String,
  },

  #[error("edge '{edge_id}' references unknown node: from={from}, to={to}")]
  DanglingEdge { edge_id: String, from: String, to: String },

  #[error("workflow contains circular dependencies: {cycle:?}")]
  Cycle { cycle: Vec<String> },

  #[error("source node '{node_id}' has an incoming edge")]
  SourceHasIncomingEdge { node_id: String },

  #[error("destination node '{node_id}' has an outgoing edge")]
  DestinationHasOutgoingEdge { node_id: String },

  #[error("node '{node_id}' is missing required config field '{field}'")]
  MissingRequiredConfig { node_id: String, field: String },
}

/// Unknown connector id, or missing required config field; terminal for the
/// affected node (no retry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ConfigurationError {
  #[error("no connector registered under id '{connector_id}'")]
  UnknownConnector { connector_id: String },

  #[error("invalid configuration for connector '{connector_id}': {message}")]
  Invalid { connector_id: String, message: String },
}

/// Raised by a schema-aware connector's `validate_input_schema`. Non-fatal by
/// default: logged at `warn` and execution continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("schema conflict on node '{node_id}': {message}")]
pub struct SchemaConflictError {
  pub node_id: String,
  pub message: String,
}

/// Factory-level connector failure (construction, not execution).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("connector '{connector_id}' error: {message}")]
pub struct ConnectorError {
  pub connector_id: String,
  pub message: String,
}

/// Wraps any error returned by a connector's `configure`/`execute`. Subject
/// to retry per the node's `max_retries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("node '{node_id}' (connector '{connector_id}') failed: {message}")]
pub struct ExecutionError {
  pub node_id: String,
  pub connector_id: String,
  pub message: String,
  pub attempt: u32,
}

/// The execution-wide deadline was reached before the graph drained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("execution timed out after {timeout_seconds}s")]
pub struct TimeoutError {
  pub timeout_seconds: u64,
}

/// The execution was cancelled by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("execution cancelled")]
pub struct CancellationError;

/// The top-level error taxonomy. Every variant formats a code-bearing,
/// node-attributable message suitable for `WorkflowExecution.error_message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum WeaveError {
  #[error("VALIDATION_ERROR: {0}")]
  Validation(#[from] ValidationError),

  #[error("CONFIGURATION_ERROR: {0}")]
  Configuration(#[from] ConfigurationError),

  #[error("EXECUTION_ERROR: {0}")]
  Execution(#[from] ExecutionError),

  #[error("SCHEMA_CONFLICT_ERROR: {0}")]
  SchemaConflict(#[from] SchemaConflictError),

  #[error("CONNECTOR_ERROR: {0}")]
  Connector(#[from] ConnectorError),

  #[error("TIMEOUT_ERROR: {0}")]
  Timeout(#[from] TimeoutError),

  #[error("CANCELLATION_ERROR: {0}")]
  Cancellation(#[from] CancellationError),
}

impl WeaveError {
  /// The stable error code embedded in `error_message`, e.g. `"TIMEOUT_ERROR"`.
  pub fn code(&self) -> &'static str {
    match self {
      WeaveError::Validation(_) => "VALIDATION_ERROR",
      WeaveError::Configuration(_) => "CONFIGURATION_ERROR",
      WeaveError::Execution(_) => "EXECUTION_ERROR",
      WeaveError::SchemaConflict(_) => "SCHEMA_CONFLICT_ERROR",
      WeaveError::Connector(_) => "CONNECTOR_ERROR",
      WeaveError::Timeout(_) => "TIMEOUT_ERROR",
      WeaveError::Cancellation(_) => "CANCELLATION_ERROR",
    }
  }

  /// The node id this error is attributed to, if any.
  pub fn node_id(&self) -> Option<&str> {
    match self {
      WeaveError::Validation(ValidationError::UnknownConnector { node_id, .. })
      | WeaveError::Validation(ValidationError::CategoryMismatch { node_id, .. })
      | WeaveError::Validation(ValidationError::SourceHasIncomingEdge { node_id })
      | WeaveError::Validation(ValidationError::DestinationHasOutgoingEdge { node_id })
      | WeaveError::Validation(ValidationError::MissingRequiredConfig { node_id, .. })
      | WeaveError::Execution(ExecutionError { node_id, .. })
      | WeaveError::SchemaConflict(SchemaConflictError { node_id, .. }) => Some(node_id.as_str()),
      _ => None,
    }
  }

  /// Renders the full, user-visible failure message: code, node id if any,
  /// message, underlying cause. This is what gets written into
  /// `WorkflowExecution.error_message`.
  pub fn format_message(&self) -> String {
    let mut out = format!("{}", self);
    if let Some(extra) = self.extra_context() {
      out.push_str(&format!(" ({extra})"));
    }
    out
  }

  fn extra_context(&self) -> Option<String> {
    match self {
      WeaveError::Timeout(TimeoutError { timeout_seconds }) => {
        Some(format!("timeout_seconds={timeout_seconds}"))
      }
      _ => None,
    }
  }
}
