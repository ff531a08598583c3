//! Shared, mutex-guarded execution state: visited flags, node results, and
//! the ready queue, all under one lock so that marking a node done and
//! deciding which downstream nodes become ready happens atomically.

use std::collections::{BTreeMap, VecDeque};

use tokio::sync::{Mutex, Notify};
use weave_envelope::DataEnvelope;

pub(crate) struct Inner {
  pub(crate) visited: BTreeMap<String, bool>,
  pub(crate) node_results: BTreeMap<String, DataEnvelope>,
  pub(crate) node_attempts: BTreeMap<String, u32>,
  pub(crate) ready: VecDeque<String>,
  pub(crate) inflight: usize,
}

/// The single lock workers and the dispatcher share. A worker holds it only
/// for the instant needed to read/write maps or push/pop the ready queue;
/// `connector.execute` and the retry backoff run entirely outside it.
pub(crate) struct SharedState {
  pub(crate) inner: Mutex<Inner>,
  /// Woken whenever the ready queue gains an item or `inflight` reaches
  /// zero, so the dispatcher can avoid busy-polling while idle.
  pub(crate) notify: Notify,
}

impl SharedState {
  pub(crate) fn new(node_ids: impl Iterator<Item = String>, sources: &[String]) -> Self {
    let visited = node_ids.map(|id| (id, false)).collect();
    Self {
      inner: Mutex::new(Inner {
        visited,
        node_results: BTreeMap::new(),
        node_attempts: BTreeMap::new(),
        ready: sources.iter().cloned().collect(),
        inflight: 0,
      }),
      notify: Notify::new(),
    }
  }
}
