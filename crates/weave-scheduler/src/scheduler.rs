//! The dispatcher/worker execution loop.
//!
//! There is no task-per-node at graph-build time: workers are spawned on
//! demand as nodes become ready and drain until the graph completes. A
//! single mutex guards the ready queue, the visited map, and the node
//! results map together, so marking a node done and deciding which
//! downstream nodes become ready happens as one atomic step; `connector
//! .execute` and the retry backoff always run outside that lock.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use weave_connector::ConnectorRegistry;
use weave_envelope::{merge_envelopes, DataEnvelope, LabelledEnvelope};
use weave_errors::{CancellationError, TimeoutError, WeaveError};
use weave_graph::{Graph, Node};

use crate::config::{SchedulerConfig, WorkflowRunSettings};
use crate::error_sink::ErrorSink;
use crate::observer::SchedulerObserver;
use crate::retry::execute_node_with_retry;
use crate::state::{Inner, SharedState};

/// How the dispatcher loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
  Completed,
  Failed,
  Cancelled,
}

/// The full result of one `run`: every node result produced before
/// termination (useful for post-mortem even on failure/cancellation) plus
/// the terminal status and, if applicable, the error that caused it.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
  pub status: RunStatus,
  pub node_results: BTreeMap<String, DataEnvelope>,
  pub error: Option<WeaveError>,
}

impl ExecutionOutcome {
  /// The envelopes produced by every destination node — the execution's
  /// final, externally visible result.
  pub fn destination_results<'a>(&'a self, graph: &'a Graph) -> BTreeMap<String, DataEnvelope> {
    self
      .node_results
      .iter()
      .filter(|(id, _)| graph.node(id).is_some_and(Node::is_destination))
      .map(|(id, envelope)| (id.clone(), envelope.clone()))
      .collect()
  }
}

/// Falls back to waking the dispatcher on a short interval even if a
/// `Notify` wakeup is missed (a freshly constructed `Notified` future is not
/// registered until first polled, so a notification racing the check-then-
/// await sequence can in principle be lost). Bounds worst-case added
/// latency per idle tick without risking a stuck dispatcher.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs `graph` to completion (or to its first failure, timeout, or
/// cancellation), honoring `settings.max_retries`/`retry_delay` per node and
/// `config.max_parallel` across all of them.
pub async fn run(
  graph: Arc<Graph>,
  registry: Arc<ConnectorRegistry>,
  execution_id: impl Into<String>,
  settings: WorkflowRunSettings,
  config: SchedulerConfig,
  cancel: CancellationToken,
  observer: Arc<dyn SchedulerObserver>,
) -> ExecutionOutcome {
  let execution_id = Arc::new(execution_id.into());
  let sources: Vec<String> = graph.nodes().values().filter(|n| n.is_source()).map(|n| n.id.clone()).collect();
  let shared = Arc::new(SharedState::new(graph.nodes().keys().cloned(), &sources));
  let semaphore = Arc::new(Semaphore::new(config.max_parallel.max(1)));
  let error_sink = Arc::new(ErrorSink::default());

  let dispatcher = dispatch(
    graph.clone(),
    registry,
    shared.clone(),
    semaphore,
    error_sink.clone(),
    execution_id,
    settings,
    cancel.clone(),
    observer,
  );

  tokio::select! {
    _ = tokio::time::sleep(settings.timeout) => {
      // Wake every in-flight worker so they drop their retry loop instead of
      // running on unobserved in the background after this function returns.
      cancel.cancel();
      let node_results = shared.inner.lock().await.node_results.clone();
      ExecutionOutcome {
        status: RunStatus::Failed,
        node_results,
        error: Some(WeaveError::Timeout(TimeoutError { timeout_seconds: settings.timeout.as_secs() })),
      }
    }
    _ = cancel.cancelled() => {
      let node_results = shared.inner.lock().await.node_results.clone();
      ExecutionOutcome {
        status: RunStatus::Cancelled,
        node_results,
        error: Some(WeaveError::Cancellation(CancellationError)),
      }
    }
    _ = dispatcher => {
      let node_results = shared.inner.lock().await.node_results.clone();
      match error_sink.take().await {
        Some(error) => ExecutionOutcome { status: RunStatus::Failed, node_results, error: Some(error) },
        None => ExecutionOutcome { status: RunStatus::Completed, node_results, error: None },
      }
    }
  }
}

#[allow(clippy::too_many_arguments)]
async fn dispatch(
  graph: Arc<Graph>,
  registry: Arc<ConnectorRegistry>,
  shared: Arc<SharedState>,
  semaphore: Arc<Semaphore>,
  error_sink: Arc<ErrorSink>,
  execution_id: Arc<String>,
  settings: WorkflowRunSettings,
  cancel: CancellationToken,
  observer: Arc<dyn SchedulerObserver>,
) {
  loop {
    let notified = shared.notify.notified();

    let maybe_node = {
      let mut inner = shared.inner.lock().await;
      inner.ready.pop_front()
    };

    let Some(node_id) = maybe_node else {
      let inflight = shared.inner.lock().await.inflight;
      if inflight == 0 {
        break;
      }
      tokio::select! {
        _ = notified => {}
        _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
      }
      continue;
    };

    if cancel.is_cancelled() {
      break;
    }

    let Ok(permit) = semaphore.clone().acquire_owned().await else {
      break;
    };

    {
      let mut inner = shared.inner.lock().await;
      inner.inflight += 1;
    }

    let task_graph = graph.clone();
    let task_registry = registry.clone();
    let task_shared = shared.clone();
    let task_error_sink = error_sink.clone();
    let task_execution_id = execution_id.clone();
    let task_cancel = cancel.clone();
    let task_observer = observer.clone();

    tokio::spawn(async move {
      worker(
        node_id,
        task_graph,
        task_registry,
        task_shared,
        task_error_sink,
        task_execution_id,
        settings,
        task_cancel,
        task_observer,
        permit,
      )
      .await;
    });
  }
}

enum Admission {
  Skip,
  Proceed(Option<DataEnvelope>),
}

#[allow(clippy::too_many_arguments)]
async fn worker(
  node_id: String,
  graph: Arc<Graph>,
  registry: Arc<ConnectorRegistry>,
  shared: Arc<SharedState>,
  error_sink: Arc<ErrorSink>,
  execution_id: Arc<String>,
  settings: WorkflowRunSettings,
  cancel: CancellationToken,
  observer: Arc<dyn SchedulerObserver>,
  _permit: tokio::sync::OwnedSemaphorePermit,
) {
  let node = graph.node(&node_id).expect("ready queue only ever carries known node ids");

  let admission = if cancel.is_cancelled() {
    Admission::Skip
  } else {
    let inner = shared.inner.lock().await;
    if *inner.visited.get(&node_id).unwrap_or(&false) {
      Admission::Skip
    } else {
      Admission::Proceed(aggregate_inputs(&graph, &inner, node))
    }
  };

  let Admission::Proceed(aggregated_input) = admission else {
    finish(&shared, None).await;
    return;
  };

  let result = execute_node_with_retry(node, &registry, &execution_id, aggregated_input, &settings, &cancel, observer.as_ref()).await;

  let newly_ready = finish(&shared, Some((node_id.clone(), &graph, &result))).await;
  let _ = newly_ready;

  if let Err(error) = result {
    error_sink.set_first(error).await;
  }
}

/// Records the worker's outcome (if it ran one) and decrements `inflight`,
/// all under one lock acquisition, then wakes the dispatcher.
async fn finish(shared: &SharedState, outcome: Option<(String, &Arc<Graph>, &Result<DataEnvelope, WeaveError>)>) {
  {
    let mut inner = shared.inner.lock().await;
    if let Some((node_id, graph, result)) = outcome {
      inner.visited.insert(node_id.clone(), true);
      *inner.node_attempts.entry(node_id.clone()).or_insert(0) += 1;
      if let Ok(envelope) = result {
        inner.node_results.insert(node_id.clone(), envelope.clone());
        push_newly_ready(graph, &mut inner, &node_id);
      }
    }
    inner.inflight -= 1;
  }
  shared.notify.notify_waiters();
}

fn push_newly_ready(graph: &Graph, inner: &mut Inner, completed_node_id: &str) {
  for downstream_id in graph.downstream(completed_node_id) {
    let Some(downstream_node) = graph.node(downstream_id) else { continue };
    let all_inputs_ready = downstream_node.inputs.iter().all(|u| inner.node_results.contains_key(u));
    let already_visited = *inner.visited.get(downstream_id).unwrap_or(&false);
    let already_queued = inner.ready.contains(downstream_id);
    if all_inputs_ready && !already_visited && !already_queued {
      inner.ready.push_back(downstream_id.clone());
    }
  }
}

fn aggregate_inputs(graph: &Graph, inner: &Inner, node: &Node) -> Option<DataEnvelope> {
  if node.inputs.is_empty() {
    return None;
  }
  let labelled: Vec<LabelledEnvelope<'_>> = node
    .inputs
    .iter()
    .filter_map(|upstream_id| {
      let envelope = inner.node_results.get(upstream_id)?;
      let label = graph.node(upstream_id).map(|n| n.name.as_str()).unwrap_or(upstream_id.as_str());
      Some(LabelledEnvelope { node_id: upstream_id.as_str(), label, envelope })
    })
    .collect();
  if labelled.is_empty() {
    None
  } else {
    Some(merge_envelopes(&labelled))
  }
}
