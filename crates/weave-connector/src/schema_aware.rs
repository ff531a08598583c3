//! The optional schema-aware capability.

use weave_envelope::DataSchema;
use weave_errors::SchemaConflictError;

use crate::connector::Connector;

/// A connector capable of deriving its output schema from its input schema
/// without executing — enabling design-time introspection and a sound
/// schema cache.
///
/// Both methods must be pure: no I/O, no mutation of connector state. The
/// schema cache in `weave-cache` relies on this purity to memoise results
/// safely.
pub trait SchemaAwareConnector: Connector {
  /// Derives the output schema deterministically from config + input schema.
  fn output_schema(&self, input_schema: Option<&DataSchema>) -> Result<DataSchema, SchemaConflictError>;

  /// Checks upstream schema compatibility. A failure here is logged at
  /// `warn` and does not abort execution by default (see
  /// `weave-scheduler`); it exists for connectors that want to surface the
  /// conflict for diagnostics.
  fn validate_input_schema(&self, input_schema: Option<&DataSchema>) -> Result<(), SchemaConflictError>;
}
