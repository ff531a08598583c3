//! Execution-scoped context passed into every connector invocation.

use tokio_util::sync::CancellationToken;

/// Identifiers and cancellation plumbing threaded into `Connector::execute`.
///
/// Connectors must respect `cancel`: a cancellation or timeout propagates
/// here, and a well-behaved connector returns promptly once it observes
/// `cancel.is_cancelled()`.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
  pub execution_id: String,
  pub node_id: String,
  pub attempt: u32,
  pub cancel: CancellationToken,
}

impl ExecutionContext {
  pub fn new(execution_id: impl Into<String>, node_id: impl Into<String>, attempt: u32, cancel: CancellationToken) -> Self {
    Self {
      execution_id: execution_id.into(),
      node_id: node_id.into(),
      attempt,
      cancel,
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancel.is_cancelled()
  }
}
