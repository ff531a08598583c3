//! A source that emits a fixed set of records from its own configuration —
//! the "file read already done for you" connector used by the CLI harness
//! and integration tests in place of a real filesystem/HTTP source.

use async_trait::async_trait;
use serde_json::Value;
use weave_connector::{Connector, ExecutionContext, NodeCategory, SchemaAwareConnector};
use weave_envelope::{infer_schema_from_data, DataEnvelope, DataSchema, EnvelopeMetadata, Record};
use weave_errors::{ConfigurationError, ExecutionError, SchemaConflictError};

#[derive(Default)]
pub struct JsonLiteralSource {
  records: Vec<Record>,
}

impl JsonLiteralSource {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Connector for JsonLiteralSource {
  fn id(&self) -> &str {
    "json_literal_source"
  }

  fn name(&self) -> &str {
    "JSON Literal Source"
  }

  fn category(&self) -> NodeCategory {
    NodeCategory::Source
  }

  fn config_schema(&self) -> Value {
    serde_json::json!({ "required": ["records"] })
  }

  fn configure(&mut self, config: &Value) -> Result<(), ConfigurationError> {
    let records = config.get("records").and_then(Value::as_array).ok_or_else(|| ConfigurationError::Invalid {
      connector_id: self.id().to_string(),
      message: "config.records must be an array of objects".to_string(),
    })?;
    self.records = records
      .iter()
      .map(|item| match item {
        Value::Object(map) => map.clone().into_iter().collect(),
        other => Record::from([("value".to_string(), other.clone())]),
      })
      .collect();
    Ok(())
  }

  async fn execute(&self, ctx: &ExecutionContext, _input: Option<DataEnvelope>) -> Result<DataEnvelope, ExecutionError> {
    let schema = infer_schema_from_data(&self.records, &ctx.node_id);
    let mut metadata = EnvelopeMetadata { schema, ..Default::default() };
    metadata.sources.insert(ctx.node_id.clone());
    Ok(DataEnvelope::new(self.records.clone(), metadata))
  }

  fn as_schema_aware(&self) -> Option<&dyn SchemaAwareConnector> {
    Some(self)
  }
}

impl SchemaAwareConnector for JsonLiteralSource {
  fn output_schema(&self, _input_schema: Option<&DataSchema>) -> Result<DataSchema, SchemaConflictError> {
    Ok(infer_schema_from_data(&self.records, self.id()))
  }

  fn validate_input_schema(&self, _input_schema: Option<&DataSchema>) -> Result<(), SchemaConflictError> {
    Ok(())
  }
}
