//! Errors a [`crate::Store`] implementation can return.

use crate::record::RecordKind;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("no {kind:?} record found for id '{id}'")]
  NotFound { kind: RecordKind, id: String },

  #[error("store backend error: {0}")]
  Backend(String),
}
