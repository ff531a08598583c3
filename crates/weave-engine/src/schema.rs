//! Recursive, cache-backed output-schema derivation and sample-data preview.

use std::collections::{BTreeMap, HashMap, HashSet};

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use weave_cache::{config_hash, SchemaCache};
use weave_connector::{ConnectorRegistry, ExecutionContext};
use weave_envelope::{merge_envelopes, DataEnvelope, DataSchema, EnvelopeMetadata, LabelledEnvelope};
use weave_errors::{ConfigurationError, WeaveError};
use weave_graph::Graph;

use crate::error::EngineError;

/// One node's config hash folded together with the state hashes of its
/// direct inputs, computed fresh per call and memoised only for the
/// duration of that call.
///
/// Changing any node's config anywhere upstream of `node_id` changes
/// `node_id`'s state hash transitively, which is what lets the schema
/// cache's `input_hashes` validity check notice a stale entry without
/// re-deriving the whole subtree on every lookup.
fn state_hash(graph: &Graph, node_id: &str, memo: &mut HashMap<String, String>) -> String {
  if let Some(hash) = memo.get(node_id) {
    return hash.clone();
  }
  let node = graph.node(node_id).expect("state_hash only called for graph-resident ids");
  let mut upstream: Vec<String> = node.inputs.iter().map(|u| state_hash(graph, u, memo)).collect();
  upstream.sort();
  let combined = serde_json::json!({ "config": config_hash(&node.config), "inputs": upstream });
  let hash = config_hash(&combined);
  memo.insert(node_id.to_string(), hash.clone());
  hash
}

fn input_hashes(graph: &Graph, node: &weave_graph::Node, memo: &mut HashMap<String, String>) -> Vec<String> {
  node.inputs.iter().map(|u| state_hash(graph, u, memo)).collect()
}

/// Wraps a schema in a data-free envelope so the schema-only merge can reuse
/// `merge_envelopes`'s field-collision-prefixing logic without needing any
/// actual records.
fn schema_only_envelope(schema: DataSchema) -> DataEnvelope {
  let sources = schema.source_nodes.clone();
  DataEnvelope::new(Vec::new(), EnvelopeMetadata { schema, sources, ..Default::default() })
}

/// Derives `node_id`'s output schema, recursing into its direct inputs and
/// consulting/populating `cache` at every level.
pub(crate) fn derive_node_output_schema<'a>(
  registry: &'a ConnectorRegistry,
  cache: &'a SchemaCache,
  graph: &'a Graph,
  workflow_id: &'a str,
  node_id: &'a str,
  memo: &'a mut HashMap<String, String>,
) -> BoxFuture<'a, Result<DataSchema, EngineError>> {
  Box::pin(async move {
    let node = graph.node(node_id).ok_or_else(|| EngineError::NodeNotFound {
      workflow_id: workflow_id.to_string(),
      node_id: node_id.to_string(),
    })?;

    let own_config_hash = config_hash(&node.config);
    let own_input_hashes = input_hashes(graph, node, memo);

    if let Some(schema) = cache.get(node_id, &own_config_hash, &own_input_hashes) {
      return Ok(schema);
    }

    let mut upstream_schemas = Vec::with_capacity(node.inputs.len());
    for upstream_id in &node.inputs {
      let schema = derive_node_output_schema(registry, cache, graph, workflow_id, upstream_id, memo).await?;
      upstream_schemas.push((upstream_id.clone(), schema));
    }

    let merged_input_schema = if upstream_schemas.is_empty() {
      None
    } else {
      let envelopes: Vec<DataEnvelope> = upstream_schemas.iter().map(|(_, s)| schema_only_envelope(s.clone())).collect();
      let labelled: Vec<LabelledEnvelope<'_>> = upstream_schemas
        .iter()
        .zip(envelopes.iter())
        .map(|((upstream_id, _), envelope)| {
          let label = graph.node(upstream_id).map(|n| n.name.as_str()).unwrap_or(upstream_id.as_str());
          LabelledEnvelope { node_id: upstream_id.as_str(), label, envelope }
        })
        .collect();
      Some(merge_envelopes(&labelled).metadata.schema)
    };

    let mut connector = registry.create(&node.connector_id).map_err(WeaveError::Configuration)?;
    connector.configure(&node.config).map_err(WeaveError::Configuration)?;
    let schema_aware = connector.as_schema_aware().ok_or_else(|| {
      EngineError::Weave(WeaveError::Configuration(ConfigurationError::Invalid {
        connector_id: node.connector_id.clone(),
        message: "does not support schema introspection".to_string(),
      }))
    })?;

    let output_schema = schema_aware.output_schema(merged_input_schema.as_ref()).map_err(WeaveError::SchemaConflict)?;

    cache.set(workflow_id, node_id, output_schema.clone(), own_config_hash, own_input_hashes);
    Ok(output_schema)
  })
}

/// Recursively previews `node_id`'s output by actually executing it and its
/// upstream chain, truncating every envelope (including intermediate ones)
/// to `limit` records. Not memoised: connectors may be side-effecting, so
/// re-deriving a shared ancestor from two branches is a re-execution, not a
/// cache hit. `ancestors` tracks the current recursion path only — a
/// legitimate diamond re-visits a shared source from two branches, which
/// must not be rejected as a cycle.
pub(crate) fn derive_node_sample_data<'a>(
  registry: &'a ConnectorRegistry,
  graph: &'a Graph,
  workflow_id: &'a str,
  execution_id: &'a str,
  node_id: &'a str,
  limit: usize,
  ancestors: &'a mut HashSet<String>,
) -> BoxFuture<'a, Result<DataEnvelope, EngineError>> {
  Box::pin(async move {
    if !ancestors.insert(node_id.to_string()) {
      return Err(EngineError::PreviewCycle { node_id: node_id.to_string() });
    }

    let result = run_node_preview(registry, graph, workflow_id, execution_id, node_id, limit, ancestors).await;
    ancestors.remove(node_id);
    result
  })
}

async fn run_node_preview(
  registry: &ConnectorRegistry,
  graph: &Graph,
  workflow_id: &str,
  execution_id: &str,
  node_id: &str,
  limit: usize,
  ancestors: &mut HashSet<String>,
) -> Result<DataEnvelope, EngineError> {
  let node = graph.node(node_id).ok_or_else(|| EngineError::NodeNotFound {
    workflow_id: workflow_id.to_string(),
    node_id: node_id.to_string(),
  })?;

  let mut upstream_results = Vec::with_capacity(node.inputs.len());
  for upstream_id in &node.inputs {
    let envelope = derive_node_sample_data(registry, graph, workflow_id, execution_id, upstream_id, limit, ancestors).await?;
    upstream_results.push((upstream_id.clone(), envelope));
  }

  let aggregated = if upstream_results.is_empty() {
    None
  } else {
    let labelled: Vec<LabelledEnvelope<'_>> = upstream_results
      .iter()
      .map(|(upstream_id, envelope)| {
        let label = graph.node(upstream_id).map(|n| n.name.as_str()).unwrap_or(upstream_id.as_str());
        LabelledEnvelope { node_id: upstream_id.as_str(), label, envelope }
      })
      .collect();
    Some(merge_envelopes(&labelled))
  };

  let mut connector = registry.create(&node.connector_id).map_err(WeaveError::Configuration)?;
  connector.configure(&node.config).map_err(WeaveError::Configuration)?;

  let ctx = ExecutionContext::new(execution_id, node_id, 1, CancellationToken::new());
  let mut envelope = connector.execute(&ctx, aggregated).await.map_err(WeaveError::Execution)?;
  envelope.data.truncate(limit);
  envelope.metadata.record_count = envelope.data.len();
  Ok(envelope)
}

/// One node's entry in `get_workflow_schema`'s aggregate report.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeSchemaReport {
  pub node_name: String,
  pub connector_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub output_schema: Option<DataSchema>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// Derives every node's output schema independently; one node's failure is
/// captured in its own report entry and never aborts the others.
pub(crate) async fn derive_workflow_schema(
  registry: &ConnectorRegistry,
  cache: &SchemaCache,
  graph: &Graph,
  workflow_id: &str,
) -> BTreeMap<String, NodeSchemaReport> {
  let mut reports = BTreeMap::new();
  for (node_id, node) in graph.nodes() {
    let mut memo = HashMap::new();
    let result = derive_node_output_schema(registry, cache, graph, workflow_id, node_id, &mut memo).await;
    let report = match result {
      Ok(schema) => NodeSchemaReport {
        node_name: node.name.clone(),
        connector_id: node.connector_id.clone(),
        output_schema: Some(schema),
        error: None,
      },
      Err(e) => NodeSchemaReport {
        node_name: node.name.clone(),
        connector_id: node.connector_id.clone(),
        output_schema: None,
        error: Some(e.to_string()),
      },
    };
    reports.insert(node_id.clone(), report);
  }
  reports
}
