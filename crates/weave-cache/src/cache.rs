//! The schema cache store: keyed lookup, TTL + approximate-LRU eviction.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use weave_envelope::DataSchema;

use crate::metrics::{CacheCounters, CacheCountersSnapshot};

#[derive(Clone)]
struct CacheEntry {
  schema: DataSchema,
  config_hash: String,
  input_hashes: Vec<String>,
  timestamp: Instant,
}

struct Inner {
  entries: HashMap<String, CacheEntry>,
  /// workflow_id -> node ids with a live entry, so a save can invalidate
  /// every affected node at once.
  by_workflow: HashMap<String, BTreeSet<String>>,
}

/// Design-time output-schema cache, keyed by node id.
///
/// A cached entry is valid only while its `config_hash` and `input_hashes`
/// match the node's current state and it has not aged past `ttl`; anything
/// else forces a fresh derivation. Eviction is approximate LRU: when the
/// cache is full, the single oldest entry by insertion timestamp is evicted,
/// not necessarily the least-recently-read one.
pub struct SchemaCache {
  inner: Mutex<Inner>,
  ttl: Duration,
  max_entries: usize,
  counters: CacheCounters,
}

impl SchemaCache {
  pub fn new(ttl: Duration, max_entries: usize) -> Self {
    Self {
      inner: Mutex::new(Inner {
        entries: HashMap::new(),
        by_workflow: HashMap::new(),
      }),
      ttl,
      max_entries,
      counters: CacheCounters::default(),
    }
  }

  /// Looks up `node_id`'s cached schema, returning it only if `config_hash`
  /// and `input_hashes` still match and the entry hasn't aged out.
  pub fn get(&self, node_id: &str, config_hash: &str, input_hashes: &[String]) -> Option<DataSchema> {
    let inner = self.inner.lock().expect("schema cache mutex poisoned");
    let entry = inner.entries.get(node_id)?;
    let valid = entry.config_hash == config_hash && entry.input_hashes == input_hashes && entry.timestamp.elapsed() < self.ttl;
    if valid {
      self.counters.record_hit();
      Some(entry.schema.clone())
    } else {
      self.counters.record_miss();
      None
    }
  }

  /// Inserts or replaces `node_id`'s cached schema, evicting the oldest
  /// entry first if the cache is at capacity.
  pub fn set(&self, workflow_id: &str, node_id: &str, schema: DataSchema, config_hash: String, input_hashes: Vec<String>) {
    let mut inner = self.inner.lock().expect("schema cache mutex poisoned");

    if !inner.entries.contains_key(node_id) && inner.entries.len() >= self.max_entries {
      if let Some(oldest_id) = inner
        .entries
        .iter()
        .min_by_key(|(_, e)| e.timestamp)
        .map(|(id, _)| id.clone())
      {
        inner.entries.remove(&oldest_id);
        for nodes in inner.by_workflow.values_mut() {
          nodes.remove(&oldest_id);
        }
        self.counters.record_eviction();
      }
    }

    inner.entries.insert(
      node_id.to_string(),
      CacheEntry {
        schema,
        config_hash,
        input_hashes,
        timestamp: Instant::now(),
      },
    );
    inner.by_workflow.entry(workflow_id.to_string()).or_default().insert(node_id.to_string());
    self.counters.record_set();
  }

  /// Drops every cached entry belonging to `workflow_id`, forcing the next
  /// lookup for each of its nodes to miss and re-derive.
  pub fn invalidate_workflow(&self, workflow_id: &str) {
    let mut inner = self.inner.lock().expect("schema cache mutex poisoned");
    if let Some(node_ids) = inner.by_workflow.remove(workflow_id) {
      for node_id in node_ids {
        inner.entries.remove(&node_id);
      }
    }
  }

  pub fn counters(&self) -> CacheCountersSnapshot {
    self.counters.snapshot()
  }

  pub fn len(&self) -> usize {
    self.inner.lock().expect("schema cache mutex poisoned").entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
