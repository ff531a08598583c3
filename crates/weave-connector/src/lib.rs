//! The connector contract: the pluggable unit of work in a weave workflow,
//! and the registry that instantiates connectors by id.
//!
//! A connector is a trait object (`Box<dyn Connector>`), not a class in an
//! inheritance tree. Optional capabilities — like deriving an output schema
//! without executing — are exposed through narrower traits
//! ([`SchemaAwareConnector`]) reachable via [`Connector::as_schema_aware`].

mod category;
mod connector;
mod context;
mod metrics;
mod registry;
mod schema_aware;

pub use category::NodeCategory;
pub use connector::Connector;
pub use context::ExecutionContext;
pub use metrics::{ConnectorCounters, ConnectorCountersSnapshot};
pub use registry::{ConnectorDescriptor, ConnectorRegistry};
pub use schema_aware::SchemaAwareConnector;
