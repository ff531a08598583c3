//! The connector contract.

use async_trait::async_trait;
use serde_json::Value;
use weave_envelope::DataEnvelope;
use weave_errors::{ConfigurationError, ExecutionError};

use crate::category::NodeCategory;
use crate::context::ExecutionContext;
use crate::schema_aware::SchemaAwareConnector;

/// A pluggable node implementation: a source, processor, or destination.
///
/// `Connector` is a plain trait object (`Box<dyn Connector>`), not a class
/// hierarchy — optional capabilities (like being schema-aware) are exposed
/// through [`as_schema_aware`](Connector::as_schema_aware) rather than a
/// deeper inheritance chain.
#[async_trait]
pub trait Connector: Send + Sync {
  /// The registry key this connector was created under, e.g. `"file_source"`.
  fn id(&self) -> &str;

  /// A human-readable display name.
  fn name(&self) -> &str;

  fn category(&self) -> NodeCategory;

  /// Describes valid configuration. By convention carries a `required`
  /// array of field names that [`configure`](Connector::configure) demands.
  fn config_schema(&self) -> Value {
    serde_json::json!({ "required": [] })
  }

  /// Applies and validates `config`. Called once per connector instance,
  /// before the first `execute`.
  fn configure(&mut self, config: &Value) -> Result<(), ConfigurationError>;

  /// Performs the node's work. `input` is `None` for source nodes; for
  /// processors/destinations it is the aggregated upstream envelope.
  async fn execute(
    &self,
    ctx: &ExecutionContext,
    input: Option<DataEnvelope>,
  ) -> Result<DataEnvelope, ExecutionError>;

  /// Returns `Some(self)` if this connector also implements
  /// [`SchemaAwareConnector`]. The default implementation opts out.
  fn as_schema_aware(&self) -> Option<&dyn SchemaAwareConnector> {
    None
  }
}
