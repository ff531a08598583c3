//! The abstract persistence interface.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::record::{Record, RecordKind};

/// Persistence for the four record kinds the engine reads and writes.
///
/// The core treats `Store` as an opaque external collaborator: HTTP/API
/// surface, authentication, and the concrete database are all out of scope
/// here. Implementations are free to back this with SQL, a document store,
/// or (as in [`crate::MemoryStore`]) a plain in-process map for tests and
/// the CLI harness.
#[async_trait]
pub trait Store: Send + Sync {
  async fn find_by_id(&self, kind: RecordKind, id: &str) -> Result<Option<Record>, StoreError>;

  async fn find_by_filter(&self, kind: RecordKind, filter: &BTreeMap<String, Value>) -> Result<Vec<Record>, StoreError>;

  async fn save(&self, record: Record) -> Result<(), StoreError>;

  async fn delete(&self, kind: RecordKind, id: &str) -> Result<(), StoreError>;
}
