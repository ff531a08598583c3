//! End-to-end scheduler runs against small hand-built graphs, covering the
//! linear-chain, diamond-merge, and timeout scenarios.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use weave_connector::{Connector, ConnectorDescriptor, ConnectorRegistry, ExecutionContext, NodeCategory};
use weave_envelope::DataEnvelope;
use weave_errors::{ConfigurationError, ExecutionError};
use weave_graph::{build_graph, EdgeRow, NodeRow};
use weave_scheduler::{run, NoopObserver, RunStatus, SchedulerConfig, WorkflowRunSettings};

/// Emits a fixed, literal envelope, ignoring config and input.
struct FixedSource {
  envelope: DataEnvelope,
}

#[async_trait]
impl Connector for FixedSource {
  fn id(&self) -> &str {
    "fixed_source"
  }
  fn name(&self) -> &str {
    "Fixed Source"
  }
  fn category(&self) -> NodeCategory {
    NodeCategory::Source
  }
  fn configure(&mut self, _config: &Value) -> Result<(), ConfigurationError> {
    Ok(())
  }
  async fn execute(&self, _ctx: &ExecutionContext, _input: Option<DataEnvelope>) -> Result<DataEnvelope, ExecutionError> {
    Ok(self.envelope.clone())
  }
}

/// Passes its aggregated input through unchanged; for sources (no input) it
/// emits an empty envelope.
struct Identity;

#[async_trait]
impl Connector for Identity {
  fn id(&self) -> &str {
    "identity"
  }
  fn name(&self) -> &str {
    "Identity"
  }
  fn category(&self) -> NodeCategory {
    NodeCategory::Processor
  }
  fn configure(&mut self, _config: &Value) -> Result<(), ConfigurationError> {
    Ok(())
  }
  async fn execute(&self, ctx: &ExecutionContext, input: Option<DataEnvelope>) -> Result<DataEnvelope, ExecutionError> {
    Ok(input.unwrap_or_else(|| DataEnvelope::empty(ctx.node_id.clone())))
  }
}

/// Sleeps past any reasonable test timeout unless the context is cancelled
/// first, in which case it returns promptly.
struct SleepySource {
  duration: Duration,
}

#[async_trait]
impl Connector for SleepySource {
  fn id(&self) -> &str {
    "sleepy_source"
  }
  fn name(&self) -> &str {
    "Sleepy Source"
  }
  fn category(&self) -> NodeCategory {
    NodeCategory::Source
  }
  fn configure(&mut self, _config: &Value) -> Result<(), ConfigurationError> {
    Ok(())
  }
  async fn execute(&self, ctx: &ExecutionContext, _input: Option<DataEnvelope>) -> Result<DataEnvelope, ExecutionError> {
    tokio::select! {
      _ = tokio::time::sleep(self.duration) => Ok(DataEnvelope::empty(ctx.node_id.clone())),
      _ = ctx.cancel.cancelled() => Err(ExecutionError {
        node_id: ctx.node_id.clone(),
        connector_id: "sleepy_source".to_string(),
        message: "cancelled while sleeping".to_string(),
        attempt: ctx.attempt,
      }),
    }
  }
}

/// Counts invocations, useful for asserting exactly-once execution and the
/// concurrency bound.
struct CountingProcessor {
  running: Arc<AtomicUsize>,
  max_observed: Arc<AtomicUsize>,
  hold: Duration,
}

#[async_trait]
impl Connector for CountingProcessor {
  fn id(&self) -> &str {
    "counting_processor"
  }
  fn name(&self) -> &str {
    "Counting Processor"
  }
  fn category(&self) -> NodeCategory {
    NodeCategory::Processor
  }
  fn configure(&mut self, _config: &Value) -> Result<(), ConfigurationError> {
    Ok(())
  }
  async fn execute(&self, ctx: &ExecutionContext, input: Option<DataEnvelope>) -> Result<DataEnvelope, ExecutionError> {
    let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_observed.fetch_max(now_running, Ordering::SeqCst);
    tokio::time::sleep(self.hold).await;
    self.running.fetch_sub(1, Ordering::SeqCst);
    Ok(input.unwrap_or_else(|| DataEnvelope::empty(ctx.node_id.clone())))
  }
}

fn node(id: &str, category: NodeCategory, connector_id: &str) -> NodeRow {
  NodeRow {
    id: id.to_string(),
    name: id.to_string(),
    category,
    connector_id: connector_id.to_string(),
    config: serde_json::json!({}),
    position: Value::Null,
    timeout_ms: None,
    max_retry_attempts: None,
  }
}

fn edge(id: &str, from: &str, to: &str) -> EdgeRow {
  EdgeRow {
    id: id.to_string(),
    source_node_id: from.to_string(),
    target_node_id: to.to_string(),
  }
}

fn default_settings(timeout: Duration) -> WorkflowRunSettings {
  WorkflowRunSettings { max_retries: 0, retry_delay: Duration::from_millis(1), timeout }
}

fn record(field: &str, value: i64) -> weave_envelope::Record {
  BTreeMap::from([(field.to_string(), Value::from(value))])
}

#[tokio::test]
async fn linear_chain_propagates_data_and_lineage_to_destination() {
  let mut registry = ConnectorRegistry::new();
  let mut source_schema = weave_envelope::DataSchema::empty();
  source_schema.push_field(weave_envelope::FieldDefinition::new("x", weave_envelope::FieldType::Number, "a"));
  let mut source_metadata = weave_envelope::EnvelopeMetadata { schema: source_schema, ..Default::default() };
  source_metadata.sources.insert("a".to_string());
  let source_envelope = DataEnvelope::new(vec![record("x", 1), record("x", 2)], source_metadata);

  registry.register(
    ConnectorDescriptor {
      id: "fixed_source".to_string(),
      name: "Fixed Source".to_string(),
      category: NodeCategory::Source,
      config_schema: serde_json::json!({ "required": [] }),
    },
    move || Box::new(FixedSource { envelope: source_envelope.clone() }),
  );
  registry.register(
    ConnectorDescriptor {
      id: "identity".to_string(),
      name: "Identity".to_string(),
      category: NodeCategory::Processor,
      config_schema: serde_json::json!({ "required": [] }),
    },
    || Box::new(Identity),
  );
  registry.register(
    ConnectorDescriptor {
      id: "identity_dest".to_string(),
      name: "Identity".to_string(),
      category: NodeCategory::Destination,
      config_schema: serde_json::json!({ "required": [] }),
    },
    || Box::new(Identity) as Box<dyn Connector>,
  );

  let graph = Arc::new(build_graph(
    vec![
      node("a", NodeCategory::Source, "fixed_source"),
      node("b", NodeCategory::Processor, "identity"),
      node("c", NodeCategory::Destination, "identity_dest"),
    ],
    vec![edge("e1", "a", "b"), edge("e2", "b", "c")],
  ));

  let outcome = run(
    graph.clone(),
    Arc::new(registry),
    "exec1",
    default_settings(Duration::from_secs(5)),
    SchedulerConfig::default(),
    CancellationToken::new(),
    Arc::new(NoopObserver),
  )
  .await;

  assert_eq!(outcome.status, RunStatus::Completed);
  let results = outcome.destination_results(&graph);
  let c = results.get("c").expect("c should have a result");
  assert_eq!(c.data, vec![record("x", 1), record("x", 2)]);
  assert_eq!(c.metadata.sources, std::collections::BTreeSet::from(["a".to_string()]));
}

#[tokio::test]
async fn diamond_merge_prefixes_colliding_fields_and_unions_sources() {
  let mut registry = ConnectorRegistry::new();

  fn envelope_with(node_id: &str, field: &str, value: i64) -> DataEnvelope {
    let mut schema = weave_envelope::DataSchema::empty();
    schema.push_field(weave_envelope::FieldDefinition::new(field, weave_envelope::FieldType::String, node_id));
    let mut metadata = weave_envelope::EnvelopeMetadata { schema, ..Default::default() };
    metadata.sources.insert(node_id.to_string());
    DataEnvelope::new(vec![BTreeMap::from([(field.to_string(), Value::from(value))])], metadata)
  }

  let left = envelope_with("a", "k", 1);
  let right = envelope_with("b", "k", 2);

  registry.register(
    ConnectorDescriptor {
      id: "left_source".to_string(),
      name: "left".to_string(),
      category: NodeCategory::Source,
      config_schema: serde_json::json!({ "required": [] }),
    },
    move || Box::new(FixedSource { envelope: left.clone() }),
  );
  registry.register(
    ConnectorDescriptor {
      id: "right_source".to_string(),
      name: "right".to_string(),
      category: NodeCategory::Source,
      config_schema: serde_json::json!({ "required": [] }),
    },
    move || Box::new(FixedSource { envelope: right.clone() }),
  );
  registry.register(
    ConnectorDescriptor {
      id: "identity".to_string(),
      name: "Identity".to_string(),
      category: NodeCategory::Processor,
      config_schema: serde_json::json!({ "required": [] }),
    },
    || Box::new(Identity),
  );
  registry.register(
    ConnectorDescriptor {
      id: "identity_dest".to_string(),
      name: "Identity".to_string(),
      category: NodeCategory::Destination,
      config_schema: serde_json::json!({ "required": [] }),
    },
    || Box::new(Identity) as Box<dyn Connector>,
  );

  let mut a = node("a", NodeCategory::Source, "left_source");
  a.name = "left".to_string();
  let mut b = node("b", NodeCategory::Source, "right_source");
  b.name = "right".to_string();

  let graph = Arc::new(build_graph(
    vec![a, b, node("m", NodeCategory::Processor, "identity"), node("d", NodeCategory::Destination, "identity_dest")],
    vec![edge("e1", "a", "m"), edge("e2", "b", "m"), edge("e3", "m", "d")],
  ));

  let outcome = run(
    graph.clone(),
    Arc::new(registry),
    "exec2",
    default_settings(Duration::from_secs(5)),
    SchedulerConfig::default(),
    CancellationToken::new(),
    Arc::new(NoopObserver),
  )
  .await;

  assert_eq!(outcome.status, RunStatus::Completed);
  let results = outcome.destination_results(&graph);
  let d = results.get("d").expect("d should have a result");
  assert_eq!(d.data.len(), 2);
  let field_names: std::collections::BTreeSet<&str> = d.metadata.schema.fields.iter().map(|f| f.name.as_str()).collect();
  assert!(field_names.contains("left_k"));
  assert!(field_names.contains("right_k"));
  assert!(!field_names.contains("k"));
  assert_eq!(d.metadata.sources, std::collections::BTreeSet::from(["a".to_string(), "b".to_string()]));
}

#[tokio::test]
async fn execution_past_deadline_ends_with_timeout_status() {
  let mut registry = ConnectorRegistry::new();
  registry.register(
    ConnectorDescriptor {
      id: "sleepy_source".to_string(),
      name: "Sleepy".to_string(),
      category: NodeCategory::Source,
      config_schema: serde_json::json!({ "required": [] }),
    },
    || Box::new(SleepySource { duration: Duration::from_secs(10) }),
  );
  registry.register(
    ConnectorDescriptor {
      id: "identity_dest".to_string(),
      name: "Identity".to_string(),
      category: NodeCategory::Destination,
      config_schema: serde_json::json!({ "required": [] }),
    },
    || Box::new(Identity) as Box<dyn Connector>,
  );

  let graph = Arc::new(build_graph(
    vec![node("a", NodeCategory::Source, "sleepy_source"), node("b", NodeCategory::Destination, "identity_dest")],
    vec![edge("e1", "a", "b")],
  ));

  let outcome = run(
    graph,
    Arc::new(registry),
    "exec3",
    default_settings(Duration::from_millis(50)),
    SchedulerConfig::default(),
    CancellationToken::new(),
    Arc::new(NoopObserver),
  )
  .await;

  assert_eq!(outcome.status, RunStatus::Failed);
  assert!(matches!(outcome.error, Some(weave_errors::WeaveError::Timeout(_))));
}

#[tokio::test]
async fn concurrency_never_exceeds_max_parallel() {
  let mut registry = ConnectorRegistry::new();
  registry.register(
    ConnectorDescriptor {
      id: "fixed_source".to_string(),
      name: "Fixed Source".to_string(),
      category: NodeCategory::Source,
      config_schema: serde_json::json!({ "required": [] }),
    },
    || Box::new(FixedSource { envelope: DataEnvelope::empty("unused") }),
  );

  let running = Arc::new(AtomicUsize::new(0));
  let max_observed = Arc::new(AtomicUsize::new(0));
  {
    let running = running.clone();
    let max_observed = max_observed.clone();
    registry.register(
      ConnectorDescriptor {
        id: "counting_processor".to_string(),
        name: "Counting Processor".to_string(),
        category: NodeCategory::Destination,
        config_schema: serde_json::json!({ "required": [] }),
      },
      move || {
        Box::new(CountingProcessor {
          running: running.clone(),
          max_observed: max_observed.clone(),
          hold: Duration::from_millis(30),
        })
      },
    );
  }

  let mut source_nodes = Vec::new();
  let mut edges = Vec::new();
  let fan_out = 8;
  for i in 0..fan_out {
    let source_id = format!("source{i}");
    source_nodes.push(node(&source_id, NodeCategory::Source, "fixed_source"));
    edges.push(edge(&format!("e{i}"), &source_id, "sink"));
  }
  source_nodes.push(node("sink", NodeCategory::Destination, "counting_processor"));

  let graph = Arc::new(build_graph(source_nodes, edges));
  let config = SchedulerConfig { max_parallel: 3, ..SchedulerConfig::default() };

  run(
    graph,
    Arc::new(registry),
    "exec4",
    default_settings(Duration::from_secs(5)),
    config,
    CancellationToken::new(),
    Arc::new(NoopObserver),
  )
  .await;

  assert!(max_observed.load(Ordering::SeqCst) <= 3);
}
