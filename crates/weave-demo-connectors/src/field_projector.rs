//! A processor that projects each incoming record down to a configured
//! subset of fields, dropping the rest.

use async_trait::async_trait;
use serde_json::Value;
use weave_connector::{Connector, ExecutionContext, NodeCategory, SchemaAwareConnector};
use weave_envelope::{DataEnvelope, DataSchema};
use weave_errors::{ConfigurationError, ExecutionError, SchemaConflictError};

/// Keeps only the fields named in `fields`, preserving `source_nodes` as-is
/// (a projection narrows which fields are visible, not which nodes
/// contributed to the schema overall).
fn project_schema(schema: &DataSchema, fields: &[String]) -> DataSchema {
  let mut projected = DataSchema::empty();
  for name in fields {
    if let Some(field) = schema.field(name) {
      projected.push_field(field.clone());
    }
  }
  projected
}

#[derive(Default)]
pub struct FieldProjector {
  fields: Vec<String>,
}

impl FieldProjector {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Connector for FieldProjector {
  fn id(&self) -> &str {
    "field_projector"
  }

  fn name(&self) -> &str {
    "Field Projector"
  }

  fn category(&self) -> NodeCategory {
    NodeCategory::Processor
  }

  fn config_schema(&self) -> Value {
    serde_json::json!({ "required": ["fields"] })
  }

  fn configure(&mut self, config: &Value) -> Result<(), ConfigurationError> {
    let fields = config.get("fields").and_then(Value::as_array).ok_or_else(|| ConfigurationError::Invalid {
      connector_id: self.id().to_string(),
      message: "config.fields must be an array of field names".to_string(),
    })?;
    self.fields = fields.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
    if self.fields.is_empty() {
      return Err(ConfigurationError::Invalid {
        connector_id: self.id().to_string(),
        message: "config.fields must not be empty".to_string(),
      });
    }
    Ok(())
  }

  async fn execute(&self, ctx: &ExecutionContext, input: Option<DataEnvelope>) -> Result<DataEnvelope, ExecutionError> {
    let mut envelope = input.unwrap_or_else(|| DataEnvelope::empty(ctx.node_id.clone()));
    for record in &mut envelope.data {
      record.retain(|name, _| self.fields.iter().any(|f| f == name));
    }
    envelope.metadata.schema = project_schema(&envelope.metadata.schema, &self.fields);
    envelope.metadata.record_count = envelope.data.len();
    Ok(envelope)
  }

  fn as_schema_aware(&self) -> Option<&dyn SchemaAwareConnector> {
    Some(self)
  }
}

impl SchemaAwareConnector for FieldProjector {
  fn output_schema(&self, input_schema: Option<&DataSchema>) -> Result<DataSchema, SchemaConflictError> {
    Ok(project_schema(&input_schema.cloned().unwrap_or_default(), &self.fields))
  }

  fn validate_input_schema(&self, input_schema: Option<&DataSchema>) -> Result<(), SchemaConflictError> {
    let Some(schema) = input_schema else { return Ok(()) };
    let missing: Vec<&str> = self.fields.iter().filter(|f| schema.field(f).is_none()).map(String::as_str).collect();
    if missing.is_empty() {
      Ok(())
    } else {
      Err(SchemaConflictError {
        node_id: String::new(),
        message: format!("projected field(s) not present upstream: {}", missing.join(", ")),
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio_util::sync::CancellationToken;
  use weave_envelope::{EnvelopeMetadata, FieldDefinition, FieldType};

  fn envelope_with_fields() -> DataEnvelope {
    let mut schema = DataSchema::empty();
    schema.push_field(FieldDefinition::new("id", FieldType::Number, "src"));
    schema.push_field(FieldDefinition::new("name", FieldType::String, "src"));
    schema.push_field(FieldDefinition::new("secret", FieldType::String, "src"));
    let mut metadata = EnvelopeMetadata { schema, ..Default::default() };
    metadata.sources.insert("src".to_string());
    DataEnvelope::new(
      vec![std::collections::BTreeMap::from([
        ("id".to_string(), Value::from(1)),
        ("name".to_string(), Value::from("a")),
        ("secret".to_string(), Value::from("shh")),
      ])],
      metadata,
    )
  }

  #[tokio::test]
  async fn execute_drops_unprojected_fields() {
    let mut connector = FieldProjector::new();
    connector.configure(&serde_json::json!({ "fields": ["id", "name"] })).unwrap();
    let ctx = ExecutionContext::new("exec1", "proj", 1, CancellationToken::new());

    let out = connector.execute(&ctx, Some(envelope_with_fields())).await.unwrap();

    assert_eq!(out.data[0].len(), 2);
    assert!(out.data[0].contains_key("id"));
    assert!(!out.data[0].contains_key("secret"));
    assert!(out.metadata.schema.field("secret").is_none());
  }

  #[test]
  fn validate_input_schema_flags_missing_fields() {
    let mut connector = FieldProjector::new();
    connector.configure(&serde_json::json!({ "fields": ["id", "missing_field"] })).unwrap();
    let result = connector.validate_input_schema(Some(&envelope_with_fields().metadata.schema));
    assert!(result.is_err());
  }
}
