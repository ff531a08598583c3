//! Design-time schema inference from literal record data.

use serde_json::Value;

use crate::envelope::Record;
use crate::schema::{DataSchema, FieldDefinition, FieldType};

fn infer_type(value: &Value) -> Option<FieldType> {
  match value {
    Value::Null => None,
    Value::Bool(_) => Some(FieldType::Boolean),
    Value::Number(_) => Some(FieldType::Number),
    Value::String(_) => Some(FieldType::String),
    Value::Array(_) | Value::Object(_) => Some(FieldType::Json),
  }
}

/// Walks `records`, deducing each field's type from its first non-null
/// occurrence. `nullable` becomes `true` if the field is ever absent or
/// null in any record.
pub fn infer_schema_from_data(records: &[Record], source_node: &str) -> DataSchema {
  let mut schema = DataSchema::empty();
  let mut seen_type: Vec<(String, FieldType)> = Vec::new();
  let mut nullable: std::collections::BTreeMap<String, bool> = std::collections::BTreeMap::new();

  // Preserve first-seen field order across all records.
  let mut order: Vec<String> = Vec::new();
  for record in records {
    for name in record.keys() {
      if !order.contains(name) {
        order.push(name.clone());
      }
    }
  }

  for name in &order {
    let mut resolved_type: Option<FieldType> = None;
    let mut is_nullable = false;
    for record in records {
      match record.get(name) {
        None => is_nullable = true,
        Some(Value::Null) => is_nullable = true,
        Some(value) => {
          if resolved_type.is_none() {
            resolved_type = infer_type(value);
          }
        }
      }
    }
    let field_type = resolved_type.unwrap_or(FieldType::Json);
    seen_type.push((name.clone(), field_type));
    nullable.insert(name.clone(), is_nullable);
  }

  for (name, field_type) in seen_type {
    let is_nullable = *nullable.get(&name).unwrap_or(&false);
    schema.push_field(FieldDefinition::new(name, field_type, source_node).nullable(is_nullable));
  }

  schema
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;

  fn record(pairs: &[(&str, Value)]) -> Record {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect::<BTreeMap<_, _>>()
  }

  #[test]
  fn infers_types_from_first_non_null_value() {
    let records = vec![
      record(&[("x", Value::from(1)), ("name", Value::from("a"))]),
      record(&[("x", Value::from(2)), ("name", Value::from("b"))]),
    ];
    let schema = infer_schema_from_data(&records, "node_a");
    assert_eq!(schema.field("x").unwrap().field_type, FieldType::Number);
    assert_eq!(schema.field("name").unwrap().field_type, FieldType::String);
    assert!(!schema.field("x").unwrap().nullable);
  }

  #[test]
  fn nullable_true_when_any_occurrence_is_null_or_absent() {
    let records = vec![
      record(&[("x", Value::from(1))]),
      record(&[("x", Value::Null)]),
      record(&[]),
    ];
    let schema = infer_schema_from_data(&records, "node_a");
    assert!(schema.field("x").unwrap().nullable);
  }

  #[test]
  fn arrays_and_objects_infer_as_json() {
    let records = vec![record(&[("payload", serde_json::json!({"a": 1}))])];
    let schema = infer_schema_from_data(&records, "node_a");
    assert_eq!(schema.field("payload").unwrap().field_type, FieldType::Json);
  }

  #[test]
  fn empty_records_produce_empty_schema() {
    let schema = infer_schema_from_data(&[], "node_a");
    assert!(schema.is_empty());
  }
}
