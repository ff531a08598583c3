use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use weave_connector::{ConnectorRegistry, NodeCategory};
use weave_engine::{EngineConfig, WorkflowEngine};
use weave_graph::{EdgeRow, NodeRow};
use weave_store::{ExecutionStatus, MemoryStore, Record, Store, WorkflowRecord};

/// weave - a DAG data-pipeline workflow engine
#[derive(Parser)]
#[command(name = "weave")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Load a workflow definition, execute it, and print its final status and results
  Run { workflow_file: PathBuf },

  /// Load a workflow definition and report whether it is well-formed, without running it
  Validate { workflow_file: PathBuf },

  /// Derive every node's output schema without executing anything
  Schema { workflow_file: PathBuf },

  /// Preview one node's output by actually executing it and its upstream chain
  Sample {
    workflow_file: PathBuf,

    /// The node id to preview
    #[arg(long)]
    node: String,

    /// Maximum number of records to return
    #[arg(long)]
    limit: Option<usize>,
  },
}

/// The on-disk shape of a workflow definition handed to the CLI. Distinct
/// from the persisted `Workflow*Record` types: this is what a human or
/// editor writes, not what the Store keeps.
#[derive(Debug, Deserialize)]
struct WorkflowFile {
  #[serde(default)]
  id: Option<String>,
  name: String,
  #[serde(default)]
  timeout_seconds: Option<u64>,
  #[serde(default)]
  max_retries: Option<u32>,
  #[serde(default)]
  retry_delay_seconds: Option<u64>,
  nodes: Vec<NodeSpec>,
  #[serde(default)]
  edges: Vec<EdgeSpec>,
}

#[derive(Debug, Deserialize)]
struct NodeSpec {
  id: String,
  name: String,
  category: NodeCategory,
  connector_id: String,
  #[serde(default)]
  config: serde_json::Value,
  #[serde(default)]
  position: serde_json::Value,
  #[serde(default)]
  timeout_ms: Option<u64>,
  #[serde(default)]
  max_retry_attempts: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EdgeSpec {
  id: String,
  source_node_id: String,
  target_node_id: String,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();
  let rt = tokio::runtime::Runtime::new()?;

  rt.block_on(async move {
    match cli.command {
      Commands::Run { workflow_file } => run_workflow(workflow_file).await,
      Commands::Validate { workflow_file } => validate_workflow(workflow_file).await,
      Commands::Schema { workflow_file } => print_workflow_schema(workflow_file).await,
      Commands::Sample { workflow_file, node, limit } => print_sample_data(workflow_file, node, limit).await,
    }
  })
}

/// Reads `workflow_file`, seeds a fresh in-memory Store and connector
/// registry, and saves the workflow's graph through the engine (exercising
/// the same diff-upsert path a real editor client would use).
async fn load_engine(workflow_file: PathBuf) -> Result<(WorkflowEngine, String)> {
  let content = tokio::fs::read_to_string(&workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  let file: WorkflowFile = serde_json::from_str(&content).with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  let workflow_id = file.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

  let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
  store
    .save(Record::Workflow(WorkflowRecord {
      id: workflow_id.clone(),
      name: file.name,
      timeout_seconds: file.timeout_seconds,
      max_retries: file.max_retries,
      retry_delay_seconds: file.retry_delay_seconds,
    }))
    .await
    .context("failed to save workflow record")?;

  let mut registry = ConnectorRegistry::new();
  weave_demo_connectors::register_all(&mut registry);

  let engine = WorkflowEngine::new(store, Arc::new(registry), EngineConfig::default());

  let nodes: Vec<NodeRow> = file
    .nodes
    .into_iter()
    .map(|n| NodeRow {
      id: n.id,
      name: n.name,
      category: n.category,
      connector_id: n.connector_id,
      config: n.config,
      position: n.position,
      timeout_ms: n.timeout_ms,
      max_retry_attempts: n.max_retry_attempts,
    })
    .collect();
  let edges: Vec<EdgeRow> = file
    .edges
    .into_iter()
    .map(|e| EdgeRow {
      id: e.id,
      source_node_id: e.source_node_id,
      target_node_id: e.target_node_id,
    })
    .collect();

  let (validation, ..) = engine.save_workflow_graph(&workflow_id, nodes, edges).await.context("failed to save workflow graph")?;
  if !validation.valid {
    eprintln!("warning: workflow failed validation: {:?}", validation.errors);
  }
  for warning in &validation.warnings {
    eprintln!("warning: {warning:?}");
  }

  Ok((engine, workflow_id))
}

async fn run_workflow(workflow_file: PathBuf) -> Result<()> {
  let (engine, workflow_id) = load_engine(workflow_file).await?;

  let record = engine.execute_workflow(&workflow_id).await.context("failed to start execution")?;
  eprintln!("started execution {}", record.id);

  let snapshot = loop {
    let snapshot = engine.get_execution_status(&record.id).await.context("failed to poll execution status")?;
    if snapshot.status != ExecutionStatus::Running {
      break snapshot;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
  };

  eprintln!("execution {} finished: {:?}", snapshot.id, snapshot.status);
  if let Some(message) = &snapshot.error_message {
    eprintln!("error: {message}");
  }

  println!("{}", serde_json::to_string_pretty(&snapshot.results)?);

  if snapshot.status == ExecutionStatus::Failed {
    anyhow::bail!("workflow execution failed");
  }
  Ok(())
}

async fn validate_workflow(workflow_file: PathBuf) -> Result<()> {
  let (engine, workflow_id) = load_engine(workflow_file).await?;
  let validation = engine.validate_workflow(&workflow_id).await.context("failed to validate workflow")?;
  println!("{}", serde_json::to_string_pretty(&serde_json::json!({
    "valid": validation.valid,
    "errors": format!("{:?}", validation.errors),
    "warnings": format!("{:?}", validation.warnings),
  }))?);
  if !validation.valid {
    anyhow::bail!("workflow is not valid");
  }
  Ok(())
}

async fn print_workflow_schema(workflow_file: PathBuf) -> Result<()> {
  let (engine, workflow_id) = load_engine(workflow_file).await?;
  let report = engine.get_workflow_schema(&workflow_id).await.context("failed to derive workflow schema")?;
  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}

async fn print_sample_data(workflow_file: PathBuf, node: String, limit: Option<usize>) -> Result<()> {
  let (engine, workflow_id) = load_engine(workflow_file).await?;
  let envelope = engine
    .get_node_sample_data(&workflow_id, &node, limit)
    .await
    .with_context(|| format!("failed to preview node '{node}'"))?;
  println!("{}", serde_json::to_string_pretty(&envelope.to_map())?);
  Ok(())
}
