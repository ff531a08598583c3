//! A destination that logs every record it receives at `info` and passes
//! the envelope through unchanged, so `execute_workflow`'s destination
//! results still carry whatever reached this node.

use async_trait::async_trait;
use serde_json::Value;
use weave_connector::{Connector, ExecutionContext, NodeCategory, SchemaAwareConnector};
use weave_envelope::{DataEnvelope, DataSchema};
use weave_errors::{ConfigurationError, ExecutionError, SchemaConflictError};

#[derive(Default)]
pub struct ConsoleCollector {
  label: Option<String>,
}

impl ConsoleCollector {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Connector for ConsoleCollector {
  fn id(&self) -> &str {
    "console_collector"
  }

  fn name(&self) -> &str {
    "Console Collector"
  }

  fn category(&self) -> NodeCategory {
    NodeCategory::Destination
  }

  fn configure(&mut self, config: &Value) -> Result<(), ConfigurationError> {
    self.label = config.get("label").and_then(Value::as_str).map(str::to_string);
    Ok(())
  }

  async fn execute(&self, ctx: &ExecutionContext, input: Option<DataEnvelope>) -> Result<DataEnvelope, ExecutionError> {
    let envelope = input.unwrap_or_else(|| DataEnvelope::empty(ctx.node_id.clone()));
    let label = self.label.as_deref().unwrap_or(&ctx.node_id);
    for record in &envelope.data {
      tracing::info!(node_id = %ctx.node_id, label, ?record, "collected record");
    }
    Ok(envelope)
  }

  fn as_schema_aware(&self) -> Option<&dyn SchemaAwareConnector> {
    Some(self)
  }
}

impl SchemaAwareConnector for ConsoleCollector {
  fn output_schema(&self, input_schema: Option<&DataSchema>) -> Result<DataSchema, SchemaConflictError> {
    Ok(input_schema.cloned().unwrap_or_default())
  }

  fn validate_input_schema(&self, _input_schema: Option<&DataSchema>) -> Result<(), SchemaConflictError> {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio_util::sync::CancellationToken;
  use weave_envelope::Record;

  #[tokio::test]
  async fn passes_through_received_records_unchanged() {
    let mut connector = ConsoleCollector::new();
    connector.configure(&serde_json::json!({})).unwrap();
    let ctx = ExecutionContext::new("exec1", "sink", 1, CancellationToken::new());
    let input = DataEnvelope::new(vec![Record::from([("x".to_string(), Value::from(1))])], Default::default());

    let out = connector.execute(&ctx, Some(input.clone())).await.unwrap();
    assert_eq!(out.data, input.data);
  }

  #[tokio::test]
  async fn missing_input_yields_empty_envelope() {
    let connector = ConsoleCollector::new();
    let ctx = ExecutionContext::new("exec1", "sink", 1, CancellationToken::new());
    let out = connector.execute(&ctx, None).await.unwrap();
    assert!(out.data.is_empty());
  }
}
