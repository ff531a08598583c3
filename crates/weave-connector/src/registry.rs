//! The connector registry: an engine-owned map from connector id to factory.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use weave_errors::ConfigurationError;

use crate::category::NodeCategory;
use crate::connector::Connector;
use crate::metrics::{ConnectorCounters, ConnectorCountersSnapshot};

/// Static facts about a registered connector, independent of any instance.
#[derive(Debug, Clone)]
pub struct ConnectorDescriptor {
  pub id: String,
  pub name: String,
  pub category: NodeCategory,
  pub config_schema: Value,
}

type Factory = Box<dyn Fn() -> Box<dyn Connector> + Send + Sync>;

struct Entry {
  descriptor: ConnectorDescriptor,
  factory: Factory,
  counters: Arc<ConnectorCounters>,
}

/// Maps connector id to a factory that produces fresh, unconfigured
/// instances.
///
/// The registry is an explicitly constructed, engine-owned value passed
/// down to whoever needs to instantiate connectors — never a global
/// singleton. Registering under an id that already exists replaces the
/// existing factory; in-flight instances created from the old factory are
/// unaffected.
#[derive(Default)]
pub struct ConnectorRegistry {
  entries: HashMap<String, Entry>,
}

impl ConnectorRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a factory under `descriptor.id`. Replaces any existing
  /// registration for that id; its counters are reset.
  pub fn register<F>(&mut self, descriptor: ConnectorDescriptor, factory: F)
  where
    F: Fn() -> Box<dyn Connector> + Send + Sync + 'static,
  {
    let id = descriptor.id.clone();
    self.entries.insert(
      id,
      Entry {
        descriptor,
        factory: Box::new(factory),
        counters: Arc::new(ConnectorCounters::default()),
      },
    );
  }

  /// Instantiates a fresh, unconfigured connector for `id`.
  pub fn create(&self, id: &str) -> Result<Box<dyn Connector>, ConfigurationError> {
    let entry = self
      .entries
      .get(id)
      .ok_or_else(|| ConfigurationError::UnknownConnector { connector_id: id.to_string() })?;
    Ok((entry.factory)())
  }

  /// Lists descriptors for all registered connectors, in registration order
  /// is not guaranteed; callers that need stable ordering should sort.
  pub fn list(&self) -> Vec<ConnectorDescriptor> {
    self.entries.values().map(|e| e.descriptor.clone()).collect()
  }

  /// Looks up one connector's descriptor without instantiating it.
  pub fn get(&self, id: &str) -> Option<ConnectorDescriptor> {
    self.entries.get(id).map(|e| e.descriptor.clone())
  }

  /// Returns the shared counters handle for `id`, used by the scheduler to
  /// record invocation/success/failure after each `execute` call.
  pub fn counters(&self, id: &str) -> Option<Arc<ConnectorCounters>> {
    self.entries.get(id).map(|e| Arc::clone(&e.counters))
  }

  /// Reads a point-in-time snapshot of `id`'s counters, if registered.
  pub fn counters_snapshot(&self, id: &str) -> Option<ConnectorCountersSnapshot> {
    self.entries.get(id).map(|e| e.counters.snapshot())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use weave_envelope::DataEnvelope;
  use weave_errors::ExecutionError;

  use crate::context::ExecutionContext;

  struct NoopSource;

  #[async_trait]
  impl Connector for NoopSource {
    fn id(&self) -> &str {
      "noop_source"
    }

    fn name(&self) -> &str {
      "Noop Source"
    }

    fn category(&self) -> NodeCategory {
      NodeCategory::Source
    }

    fn configure(&mut self, _config: &Value) -> Result<(), ConfigurationError> {
      Ok(())
    }

    async fn execute(&self, _ctx: &ExecutionContext, _input: Option<DataEnvelope>) -> Result<DataEnvelope, ExecutionError> {
      Ok(DataEnvelope::empty("noop_source"))
    }
  }

  fn descriptor(id: &str) -> ConnectorDescriptor {
    ConnectorDescriptor {
      id: id.to_string(),
      name: "Noop Source".to_string(),
      category: NodeCategory::Source,
      config_schema: serde_json::json!({ "required": [] }),
    }
  }

  #[test]
  fn create_unknown_id_fails_with_configuration_error() {
    let registry = ConnectorRegistry::new();
    let err = registry.create("missing").unwrap_err();
    assert!(matches!(err, ConfigurationError::UnknownConnector { .. }));
  }

  #[test]
  fn create_known_id_produces_connector() {
    let mut registry = ConnectorRegistry::new();
    registry.register(descriptor("noop_source"), || Box::new(NoopSource));
    let connector = registry.create("noop_source").expect("should create");
    assert_eq!(connector.id(), "noop_source");
  }

  #[test]
  fn duplicate_registration_replaces_existing_factory() {
    let mut registry = ConnectorRegistry::new();
    registry.register(descriptor("noop_source"), || Box::new(NoopSource));
    registry.register(descriptor("noop_source"), || Box::new(NoopSource));
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn counters_start_at_zero_and_are_shared() {
    let mut registry = ConnectorRegistry::new();
    registry.register(descriptor("noop_source"), || Box::new(NoopSource));
    let counters = registry.counters("noop_source").expect("registered");
    counters.record_invocation();
    counters.record_success();
    let snapshot = registry.counters_snapshot("noop_source").unwrap();
    assert_eq!(snapshot.invocations, 1);
    assert_eq!(snapshot.successes, 1);
    assert_eq!(snapshot.failures, 0);
  }

  #[test]
  fn list_returns_all_descriptors() {
    let mut registry = ConnectorRegistry::new();
    registry.register(descriptor("a"), || Box::new(NoopSource));
    registry.register(descriptor("b"), || Box::new(NoopSource));
    assert_eq!(registry.list().len(), 2);
  }
}
