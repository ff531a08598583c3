//! Structural and configuration well-formedness checks.

use weave_connector::{ConnectorRegistry, NodeCategory};
use weave_errors::ValidationError;

use crate::graph::Graph;

/// Node is present in the graph but not reachable from any source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreachableWarning {
  pub node_id: String,
}

/// Node has neither an incoming nor an outgoing edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectedWarning {
  pub node_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
  Unreachable(UnreachableWarning),
  Disconnected(DisconnectedWarning),
}

/// The result of validating a graph: `valid` is true iff `errors` is empty.
/// `warnings` never block execution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
  pub valid: bool,
  pub errors: Vec<ValidationError>,
  pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
  fn finish(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
    Self {
      valid: errors.is_empty(),
      errors,
      warnings,
    }
  }
}

/// Stateless checker run at build, at save, and at execution start.
pub struct Validator;

impl Validator {
  /// Validates `graph` against `registry`, collecting every error and
  /// warning rather than stopping at the first.
  pub fn validate(graph: &Graph, registry: &ConnectorRegistry) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if graph.nodes().is_empty() {
      errors.push(ValidationError::NoNodes);
      return ValidationResult::finish(errors, warnings);
    }

    let has_source = graph.nodes().values().any(|n| n.is_source());
    let has_destination = graph.nodes().values().any(|n| n.is_destination());
    if !has_source {
      errors.push(ValidationError::NoSource);
    }
    if !has_destination {
      errors.push(ValidationError::NoDestination);
    }

    for edge in graph.edges() {
      let source_missing = graph.node(&edge.source_node_id).is_none();
      let target_missing = graph.node(&edge.target_node_id).is_none();
      if source_missing || target_missing {
        errors.push(ValidationError::DanglingEdge {
          edge_id: edge.id.clone(),
          from: edge.source_node_id.clone(),
          to: edge.target_node_id.clone(),
        });
      }
    }

    for node in graph.nodes().values() {
      match registry.get(&node.connector_id) {
        None => errors.push(ValidationError::UnknownConnector {
          node_id: node.id.clone(),
          connector_id: node.connector_id.clone(),
        }),
        Some(descriptor) => {
          if descriptor.category != node.category {
            errors.push(ValidationError::CategoryMismatch {
              node_id: node.id.clone(),
              node_category: node.category.to_string(),
              connector_id: node.connector_id.clone(),
              connector_category: descriptor.category.to_string(),
            });
          }
          for field in required_fields(&descriptor.config_schema) {
            if !has_config_field(&node.config, &field) {
              errors.push(ValidationError::MissingRequiredConfig {
                node_id: node.id.clone(),
                field,
              });
            }
          }
        }
      }

      if node.is_source() && !graph.upstream(&node.id).is_empty() {
        errors.push(ValidationError::SourceHasIncomingEdge { node_id: node.id.clone() });
      }
      if node.is_destination() && !graph.downstream(&node.id).is_empty() {
        errors.push(ValidationError::DestinationHasOutgoingEdge { node_id: node.id.clone() });
      }
    }

    if let Some(cycle) = graph.find_cycle() {
      errors.push(ValidationError::Cycle { cycle });
    }

    let reachable = graph.reachable_from_sources(graph.entry_points());
    for node in graph.nodes().values() {
      if !node.is_source() && !reachable.contains(&node.id) {
        warnings.push(ValidationWarning::Unreachable(UnreachableWarning { node_id: node.id.clone() }));
      }
      if node.inputs.is_empty() && node.outputs.is_empty() && !node.is_source() {
        warnings.push(ValidationWarning::Disconnected(DisconnectedWarning { node_id: node.id.clone() }));
      }
    }

    ValidationResult::finish(errors, warnings)
  }
}

fn required_fields(config_schema: &serde_json::Value) -> Vec<String> {
  config_schema
    .get("required")
    .and_then(|v| v.as_array())
    .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
    .unwrap_or_default()
}

fn has_config_field(config: &serde_json::Value, field: &str) -> bool {
  config.get(field).is_some_and(|v| !v.is_null())
}
