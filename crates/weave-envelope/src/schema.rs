//! Schema types describing the shape of data carried by an envelope.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The type of a single field's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
  String,
  Number,
  Boolean,
  Date,
  Json,
}

/// A single field in a [`DataSchema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
  pub name: String,
  #[serde(rename = "type")]
  pub field_type: FieldType,
  /// The node id that contributed this field.
  pub source_node: String,
  pub nullable: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl FieldDefinition {
  pub fn new(name: impl Into<String>, field_type: FieldType, source_node: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      field_type,
      source_node: source_node.into(),
      nullable: false,
      description: None,
    }
  }

  pub fn nullable(mut self, nullable: bool) -> Self {
    self.nullable = nullable;
    self
  }
}

/// Describes the fields present in a [`DataEnvelope`](crate::DataEnvelope)'s `data`.
///
/// Invariant: every `field.source_node` appears in `source_nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DataSchema {
  pub fields: Vec<FieldDefinition>,
  pub source_nodes: BTreeSet<String>,
}

impl DataSchema {
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  /// Adds a field, ensuring its source node is tracked in `source_nodes`.
  pub fn push_field(&mut self, field: FieldDefinition) {
    self.source_nodes.insert(field.source_node.clone());
    self.fields.push(field);
  }

  /// Checks the `source_node` invariant; used by tests and by the validator
  /// when accepting a connector-derived schema.
  pub fn check_invariant(&self) -> bool {
    self.fields.iter().all(|f| self.source_nodes.contains(&f.source_node))
  }

  pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
    self.fields.iter().find(|f| f.name == name)
  }
}
