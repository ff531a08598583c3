//! Per-node execution with linear-backoff retry.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use weave_connector::{ConnectorRegistry, ExecutionContext};
use weave_envelope::{infer_schema_from_data, DataEnvelope};
use weave_errors::{CancellationError, WeaveError};
use weave_graph::Node;

use crate::config::WorkflowRunSettings;
use crate::observer::SchedulerObserver;

/// Runs `node` to completion or exhausts its retry budget.
///
/// Retries apply only to errors `execute` itself returns; `configure`
/// failures (`ConfigurationError`) and cancellation short-circuit with no
/// retry. Backoff between attempts is `settings.retry_delay * attempt`
/// (linear), capped only by the caller's outer timeout.
pub(crate) async fn execute_node_with_retry(
  node: &Node,
  registry: &ConnectorRegistry,
  execution_id: &str,
  aggregated_input: Option<DataEnvelope>,
  settings: &WorkflowRunSettings,
  cancel: &CancellationToken,
  observer: &dyn SchedulerObserver,
) -> Result<DataEnvelope, WeaveError> {
  let max_attempts = settings.max_retries + 1;
  let mut attempt: u32 = 1;
  let counters = registry.counters(&node.connector_id);

  loop {
    if cancel.is_cancelled() {
      return Err(WeaveError::Cancellation(CancellationError));
    }

    observer.node_started(&node.id, attempt);

    let mut connector = registry.create(&node.connector_id).map_err(WeaveError::Configuration)?;
    if let Err(e) = connector.configure(&node.config) {
      return Err(WeaveError::Configuration(e));
    }

    if let Some(schema_aware) = connector.as_schema_aware() {
      let input_schema = aggregated_input.as_ref().map(|e| &e.metadata.schema);
      if let Err(conflict) = schema_aware.validate_input_schema(input_schema) {
        tracing::warn!(node_id = %node.id, error = %conflict, "schema conflict on input validation");
        observer.schema_conflict(&node.id, &conflict);
      }
    }

    let ctx = ExecutionContext::new(execution_id, node.id.clone(), attempt, cancel.clone());
    let start = Instant::now();

    if let Some(counters) = &counters {
      counters.record_invocation();
    }

    match connector.execute(&ctx, aggregated_input.clone()).await {
      Ok(mut envelope) => {
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        envelope.metadata.node_id = Some(node.id.clone());
        envelope.metadata.node_type = Some(node.category.to_string());
        envelope.metadata.execution_time_ms = Some(elapsed_ms);
        if envelope.metadata.schema.is_empty() && !envelope.data.is_empty() {
          envelope.metadata.schema = infer_schema_from_data(&envelope.data, &node.id);
        }
        if let Some(counters) = &counters {
          counters.record_success();
        }
        observer.node_completed(&node.id, attempt);
        return Ok(envelope);
      }
      Err(e) => {
        if let Some(counters) = &counters {
          counters.record_failure();
        }
        if cancel.is_cancelled() {
          return Err(WeaveError::Cancellation(CancellationError));
        }
        if attempt >= max_attempts {
          let error = WeaveError::Execution(e);
          observer.node_failed(&node.id, attempt, &error);
          return Err(error);
        }
        let delay = settings.retry_delay * attempt;
        observer.node_retrying(&node.id, attempt, delay);
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  use async_trait::async_trait;
  use serde_json::Value;
  use weave_connector::{Connector, ConnectorDescriptor, ConnectorRegistry, NodeCategory};
  use weave_errors::{ConfigurationError, ExecutionError};

  use super::*;
  use crate::observer::NoopObserver;

  /// Fails on its first `fail_times` invocations, then succeeds.
  struct FlakySource {
    attempts: Arc<AtomicU32>,
    fail_times: u32,
  }

  #[async_trait]
  impl Connector for FlakySource {
    fn id(&self) -> &str {
      "flaky_source"
    }
    fn name(&self) -> &str {
      "Flaky Source"
    }
    fn category(&self) -> NodeCategory {
      NodeCategory::Source
    }
    fn configure(&mut self, _config: &Value) -> Result<(), ConfigurationError> {
      Ok(())
    }
    async fn execute(&self, ctx: &ExecutionContext, _input: Option<DataEnvelope>) -> Result<DataEnvelope, ExecutionError> {
      let seen = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
      if seen <= self.fail_times {
        return Err(ExecutionError {
          node_id: ctx.node_id.clone(),
          connector_id: "flaky_source".to_string(),
          message: format!("simulated failure on attempt {seen}"),
          attempt: ctx.attempt,
        });
      }
      Ok(DataEnvelope::empty("n1"))
    }
  }

  fn node() -> Node {
    Node {
      id: "n1".to_string(),
      name: "n1".to_string(),
      category: NodeCategory::Source,
      connector_id: "flaky_source".to_string(),
      config: serde_json::json!({}),
      position: Value::Null,
      inputs: Vec::new(),
      outputs: Vec::new(),
      timeout_ms: None,
      max_retry_attempts: None,
    }
  }

  #[tokio::test]
  async fn retry_count_equals_max_retries_plus_one_on_permanent_failure() {
    let attempts = Arc::new(AtomicU32::new(0));
    let mut registry = ConnectorRegistry::new();
    {
      let attempts = attempts.clone();
      registry.register(
        ConnectorDescriptor {
          id: "flaky_source".to_string(),
          name: "Flaky Source".to_string(),
          category: NodeCategory::Source,
          config_schema: serde_json::json!({ "required": [] }),
        },
        move || Box::new(FlakySource { attempts: attempts.clone(), fail_times: u32::MAX }),
      );
    }

    let settings = WorkflowRunSettings {
      max_retries: 2,
      retry_delay: Duration::from_millis(1),
      timeout: Duration::from_secs(5),
    };
    let cancel = CancellationToken::new();
    let result = execute_node_with_retry(&node(), &registry, "exec1", None, &settings, &cancel, &NoopObserver).await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    let counters = registry.counters_snapshot("flaky_source").unwrap();
    assert_eq!(counters.invocations, 3);
    assert_eq!(counters.failures, 3);
    assert_eq!(counters.successes, 0);
  }

  #[tokio::test]
  async fn succeeds_once_failures_are_exhausted_within_budget() {
    let attempts = Arc::new(AtomicU32::new(0));
    let mut registry = ConnectorRegistry::new();
    {
      let attempts = attempts.clone();
      registry.register(
        ConnectorDescriptor {
          id: "flaky_source".to_string(),
          name: "Flaky Source".to_string(),
          category: NodeCategory::Source,
          config_schema: serde_json::json!({ "required": [] }),
        },
        move || Box::new(FlakySource { attempts: attempts.clone(), fail_times: 2 }),
      );
    }

    let settings = WorkflowRunSettings {
      max_retries: 2,
      retry_delay: Duration::from_millis(1),
      timeout: Duration::from_secs(5),
    };
    let cancel = CancellationToken::new();
    let result = execute_node_with_retry(&node(), &registry, "exec1", None, &settings, &cancel, &NoopObserver).await;

    assert!(result.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    let counters = registry.counters_snapshot("flaky_source").unwrap();
    assert_eq!(counters.successes, 1);
    assert_eq!(counters.failures, 2);
  }

  #[tokio::test]
  async fn unknown_connector_id_short_circuits_without_retry() {
    let registry = ConnectorRegistry::new();
    let settings = WorkflowRunSettings {
      max_retries: 3,
      retry_delay: Duration::from_millis(1),
      timeout: Duration::from_secs(5),
    };
    let cancel = CancellationToken::new();
    let result = execute_node_with_retry(&node(), &registry, "exec1", None, &settings, &cancel, &NoopObserver).await;
    assert!(matches!(result, Err(WeaveError::Configuration(ConfigurationError::UnknownConnector { .. }))));
  }
}
