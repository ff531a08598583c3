//! The design-time schema inference cache.
//!
//! Output-schema derivation is recursive and can be expensive once a
//! workflow has deep chains of processors; this crate provides the memoised
//! store keyed by node id, config hash, and upstream hashes. The recursive
//! derivation itself — which needs the connector registry and graph — lives
//! in `weave-engine`, which is the cache's only caller.

mod cache;
mod hash;
mod metrics;

pub use cache::SchemaCache;
pub use hash::config_hash;
pub use metrics::{CacheCounters, CacheCountersSnapshot};
