//! The abstract persistence interface consumed by the weave workflow engine.
//!
//! Concrete databases, the HTTP/API surface, and authentication are external
//! collaborators, out of scope here. [`MemoryStore`] is the one concrete
//! implementation this crate carries, and it exists only for the CLI
//! harness and tests.

mod error;
mod memory;
mod record;
mod store;
mod types;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use record::{Record, RecordKind};
pub use store::Store;
pub use types::{ExecutionStatus, WorkflowConnectionRecord, WorkflowExecutionRecord, WorkflowNodeRecord, WorkflowRecord};
