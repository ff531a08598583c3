//! A handful of in-process connectors with no external dependencies, used
//! by the CLI harness and by integration tests elsewhere in the workspace
//! that need a registry without standing up real I/O.

mod console_collector;
mod field_projector;
mod json_literal_source;

pub use console_collector::ConsoleCollector;
pub use field_projector::FieldProjector;
pub use json_literal_source::JsonLiteralSource;

use weave_connector::{ConnectorDescriptor, ConnectorRegistry, NodeCategory};

/// Registers every connector in this crate under its canonical id.
pub fn register_all(registry: &mut ConnectorRegistry) {
  registry.register(
    ConnectorDescriptor {
      id: "json_literal_source".to_string(),
      name: "JSON Literal Source".to_string(),
      category: NodeCategory::Source,
      config_schema: serde_json::json!({ "required": ["records"] }),
    },
    || Box::new(JsonLiteralSource::new()),
  );

  registry.register(
    ConnectorDescriptor {
      id: "field_projector".to_string(),
      name: "Field Projector".to_string(),
      category: NodeCategory::Processor,
      config_schema: serde_json::json!({ "required": ["fields"] }),
    },
    || Box::new(FieldProjector::new()),
  );

  registry.register(
    ConnectorDescriptor {
      id: "console_collector".to_string(),
      name: "Console Collector".to_string(),
      category: NodeCategory::Destination,
      config_schema: serde_json::json!({ "required": [] }),
    },
    || Box::new(ConsoleCollector::new()),
  );
}
