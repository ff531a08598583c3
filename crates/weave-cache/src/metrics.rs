//! Hit/miss/eviction/set counters for the schema cache.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CacheCounters {
  hits: AtomicU64,
  misses: AtomicU64,
  evictions: AtomicU64,
  sets: AtomicU64,
}

impl CacheCounters {
  pub fn record_hit(&self) {
    self.hits.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_miss(&self) {
    self.misses.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_eviction(&self) {
    self.evictions.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_set(&self) {
    self.sets.fetch_add(1, Ordering::Relaxed);
  }

  pub fn snapshot(&self) -> CacheCountersSnapshot {
    CacheCountersSnapshot {
      hits: self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
      evictions: self.evictions.load(Ordering::Relaxed),
      sets: self.sets.load(Ordering::Relaxed),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheCountersSnapshot {
  pub hits: u64,
  pub misses: u64,
  pub evictions: u64,
  pub sets: u64,
}
