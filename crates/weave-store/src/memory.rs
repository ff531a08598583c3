//! An in-process `Store` for the CLI harness and for tests.
//!
//! Not a product surface: the core specifies `Store` as an abstract
//! collaborator and leaves concrete persistence to the owning HTTP/API
//! layer. This implementation exists so the engine can be exercised
//! end-to-end without a real database.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::record::{Record, RecordKind};
use crate::store::Store;

#[derive(Default)]
pub struct MemoryStore {
  records: Mutex<HashMap<RecordKind, HashMap<String, Record>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn find_by_id(&self, kind: RecordKind, id: &str) -> Result<Option<Record>, StoreError> {
    let records = self.records.lock().expect("memory store mutex poisoned");
    Ok(records.get(&kind).and_then(|table| table.get(id)).cloned())
  }

  async fn find_by_filter(&self, kind: RecordKind, filter: &BTreeMap<String, Value>) -> Result<Vec<Record>, StoreError> {
    let records = self.records.lock().expect("memory store mutex poisoned");
    let matches = records
      .get(&kind)
      .map(|table| table.values().filter(|r| r.matches_filter(filter)).cloned().collect())
      .unwrap_or_default();
    Ok(matches)
  }

  async fn save(&self, record: Record) -> Result<(), StoreError> {
    let mut records = self.records.lock().expect("memory store mutex poisoned");
    records.entry(record.kind()).or_default().insert(record.id().to_string(), record);
    Ok(())
  }

  async fn delete(&self, kind: RecordKind, id: &str) -> Result<(), StoreError> {
    let mut records = self.records.lock().expect("memory store mutex poisoned");
    records.entry(kind).or_default().remove(id);
    Ok(())
  }
}
