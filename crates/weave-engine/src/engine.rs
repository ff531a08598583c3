//! `WorkflowEngine`: the facade composing the connector registry, graph
//! compilation, scheduler, schema cache, and log buffer into the six
//! operations an editor/runtime client calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use weave_cache::SchemaCache;
use weave_connector::ConnectorRegistry;
use weave_envelope::{DataEnvelope, DataSchema};
use weave_graph::{EdgeRow, NodeRow, ValidationResult, Validator};
use weave_store::{RecordKind, Store, WorkflowExecutionRecord};

use crate::config::EngineConfig;
use crate::diff::save_workflow_graph;
use crate::error::EngineError;
use crate::graph_load::{load_graph, load_workflow};
use crate::runner::run_execution;
use crate::schema::{derive_node_output_schema, derive_node_sample_data, derive_workflow_schema, NodeSchemaReport};
use crate::snapshot::ExecutionSnapshot;

/// Owns every subsystem the engine wires together; constructed once at the
/// composition root and cheaply cloned (every field is an `Arc`) to however
/// many call sites need it.
#[derive(Clone)]
pub struct WorkflowEngine {
  store: Arc<dyn Store>,
  registry: Arc<ConnectorRegistry>,
  cache: Arc<SchemaCache>,
  config: EngineConfig,
}

impl WorkflowEngine {
  pub fn new(store: Arc<dyn Store>, registry: Arc<ConnectorRegistry>, config: EngineConfig) -> Self {
    let cache = Arc::new(SchemaCache::new(config.schema_cache_ttl, config.schema_cache_max));
    Self { store, registry, cache, config }
  }

  /// Creates a `running` execution record and spawns its runner as a
  /// detached task, returning the record immediately rather than awaiting
  /// completion.
  #[tracing::instrument(skip(self))]
  pub async fn execute_workflow(&self, workflow_id: &str) -> Result<WorkflowExecutionRecord, EngineError> {
    let workflow = load_workflow(self.store.as_ref(), workflow_id).await?;

    let execution_id = uuid::Uuid::new_v4().to_string();
    let record = WorkflowExecutionRecord::new_running(execution_id.clone(), workflow_id, chrono::Utc::now());
    self.store.save(weave_store::Record::WorkflowExecution(record.clone())).await?;

    tokio::spawn(run_execution(self.store.clone(), self.registry.clone(), self.config, workflow, execution_id));

    Ok(record)
  }

  /// Fetches `execution_id`'s current (possibly still-`running`) snapshot.
  pub async fn get_execution_status(&self, execution_id: &str) -> Result<ExecutionSnapshot, EngineError> {
    let record = self
      .store
      .find_by_id(RecordKind::WorkflowExecution, execution_id)
      .await?
      .ok_or_else(|| EngineError::ExecutionNotFound { execution_id: execution_id.to_string() })?;
    let execution = record.as_workflow_execution().expect("find_by_id(WorkflowExecution) returns that variant").clone();
    Ok(ExecutionSnapshot::from(execution))
  }

  /// Builds and validates `workflow_id`'s current persisted graph without
  /// running it.
  pub async fn validate_workflow(&self, workflow_id: &str) -> Result<ValidationResult, EngineError> {
    let graph = load_graph(self.store.as_ref(), workflow_id).await?;
    Ok(Validator::validate(&graph, &self.registry))
  }

  /// Diff-upserts `nodes`/`edges` for `workflow_id`, invalidates the
  /// workflow's cached schemas, then re-validates the saved graph.
  pub async fn save_workflow_graph(
    &self,
    workflow_id: &str,
    nodes: Vec<NodeRow>,
    edges: Vec<EdgeRow>,
  ) -> Result<(ValidationResult, Vec<NodeRow>, Vec<EdgeRow>), EngineError> {
    let (saved_nodes, saved_edges) = save_workflow_graph(self.store.as_ref(), &self.cache, workflow_id, nodes, edges).await?;
    let graph = load_graph(self.store.as_ref(), workflow_id).await?;
    let validation = Validator::validate(&graph, &self.registry);
    Ok((validation, saved_nodes, saved_edges))
  }

  /// Derives `node_id`'s output schema, recursing into its upstream chain
  /// and consulting the schema cache at every level.
  pub async fn get_node_output_schema(&self, workflow_id: &str, node_id: &str) -> Result<DataSchema, EngineError> {
    let graph = load_graph(self.store.as_ref(), workflow_id).await?;
    let mut memo = std::collections::HashMap::new();
    derive_node_output_schema(&self.registry, &self.cache, &graph, workflow_id, node_id, &mut memo).await
  }

  /// Previews `node_id`'s output by actually executing it and its upstream
  /// chain, truncated to `limit` (clamped to `[1, sample_limit_max]`, or
  /// `sample_limit_default` when absent). Never touches the execution
  /// record or persisted logs.
  pub async fn get_node_sample_data(&self, workflow_id: &str, node_id: &str, limit: Option<usize>) -> Result<DataEnvelope, EngineError> {
    let graph = load_graph(self.store.as_ref(), workflow_id).await?;
    let limit = self.config.clamp_sample_limit(limit);
    let execution_id = format!("preview-{}", uuid::Uuid::new_v4());
    let mut ancestors = std::collections::HashSet::new();
    derive_node_sample_data(&self.registry, &graph, workflow_id, &execution_id, node_id, limit, &mut ancestors).await
  }

  /// Derives every node's output schema; a single node's derivation failure
  /// is captured in its own report entry and never aborts the rest.
  pub async fn get_workflow_schema(&self, workflow_id: &str) -> Result<BTreeMap<String, NodeSchemaReport>, EngineError> {
    let graph = load_graph(self.store.as_ref(), workflow_id).await?;
    Ok(derive_workflow_schema(&self.registry, &self.cache, &graph, workflow_id).await)
  }
}
