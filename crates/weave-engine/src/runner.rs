//! The detached `execute_workflow` runner: drives one execution from
//! `running` to a terminal status, independent of the caller that kicked it
//! off.

use std::collections::BTreeMap;
use std::sync::Arc;

use weave_connector::ConnectorRegistry;
use weave_envelope::DataEnvelope;
use weave_errors::WeaveError;
use weave_graph::Graph;
use weave_log::ExecutionLogBuffer;
use weave_scheduler::{RunStatus, WorkflowRunSettings};
use weave_store::{ExecutionStatus, Record, RecordKind, Store, WorkflowExecutionRecord, WorkflowRecord};

use crate::config::EngineConfig;
use crate::graph_load::load_graph;
use crate::log_observer::LogObserver;

/// Runs `workflow_id`'s execution `execution_id` to completion, writing
/// status transitions, final results, and logs back to `store`.
///
/// Spawned as a detached task by `execute_workflow`; nothing awaits this
/// function's return, so every failure mode here (validation, build,
/// scheduling) is reported by mutating the execution record, not by
/// propagating an error to a caller.
pub(crate) async fn run_execution(
  store: Arc<dyn Store>,
  registry: Arc<ConnectorRegistry>,
  config: EngineConfig,
  workflow: WorkflowRecord,
  execution_id: String,
) {
  let graph = match load_graph(store.as_ref(), &workflow.id).await {
    Ok(graph) => graph,
    Err(e) => {
      fail_immediately(store.as_ref(), &execution_id, e.to_string()).await;
      return;
    }
  };

  let validation = weave_graph::Validator::validate(&graph, &registry);
  if !validation.valid {
    let joined = validation.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
    let message = format!("workflow failed validation: {joined}");
    fail_immediately(store.as_ref(), &execution_id, message).await;
    return;
  }

  let scheduler_config = config.scheduler_config();
  let settings = WorkflowRunSettings::from_workflow(
    workflow.max_retries,
    workflow.retry_delay_seconds,
    workflow.timeout_seconds,
    &scheduler_config,
  );

  let buffer = Arc::new(ExecutionLogBuffer::new(execution_id.clone(), config.log_flush_policy()));
  let (observer, drain_handle) = LogObserver::spawn(buffer.clone(), store.clone());

  let flush_ticker = spawn_flush_ticker(buffer.clone(), store.clone(), config.log_flush_policy().interval);

  let cancel = tokio_util::sync::CancellationToken::new();
  let graph = Arc::new(graph);
  let outcome = weave_scheduler::run(
    graph.clone(),
    registry,
    execution_id.clone(),
    settings,
    scheduler_config,
    cancel,
    Arc::new(observer),
  )
  .await;

  flush_ticker.abort();
  let _ = drain_handle.await;

  let (status, error_message) = match (outcome.status, &outcome.error) {
    (RunStatus::Completed, _) => (ExecutionStatus::Completed, None),
    (RunStatus::Cancelled, _) => (ExecutionStatus::Cancelled, outcome.error.as_ref().map(WeaveError::format_message)),
    (RunStatus::Failed, _) => (ExecutionStatus::Failed, outcome.error.as_ref().map(WeaveError::format_message)),
  };

  let results = destination_results_as_json(&graph, &outcome.node_results);
  let end_time = chrono::Utc::now();
  let record = match store.find_by_id(RecordKind::WorkflowExecution, &execution_id).await {
    Ok(Some(r)) => r.as_workflow_execution().cloned(),
    _ => None,
  };
  let duration_ms = record
    .map(|r| (end_time - r.start_time).num_milliseconds().max(0) as u64)
    .unwrap_or(0);

  let _ = buffer.flush_terminal(store.as_ref(), status, end_time, duration_ms, error_message, results).await;
}

fn destination_results_as_json(graph: &Graph, node_results: &BTreeMap<String, DataEnvelope>) -> serde_json::Value {
  let mut out = serde_json::Map::new();
  for (node_id, envelope) in node_results {
    if graph.node(node_id).is_some_and(weave_graph::Node::is_destination) {
      out.insert(node_id.clone(), envelope.to_map());
    }
  }
  serde_json::Value::Object(out)
}

/// Writes a terminal `failed` status directly, for failures that happen
/// before there is a graph to schedule against at all.
async fn fail_immediately(store: &dyn Store, execution_id: &str, message: String) {
  if let Ok(Some(record)) = store.find_by_id(RecordKind::WorkflowExecution, execution_id).await {
    if let Some(mut execution) = record.as_workflow_execution().cloned() {
      execution.status = ExecutionStatus::Failed;
      execution.end_time = Some(chrono::Utc::now());
      execution.error_message = Some(message);
      let _ = store.save(Record::WorkflowExecution(execution)).await;
    }
  }
}

fn spawn_flush_ticker(buffer: Arc<ExecutionLogBuffer>, store: Arc<dyn Store>, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
      ticker.tick().await;
      if buffer.flush(store.as_ref()).await.is_err() {
        break;
      }
    }
  })
}
