//! Report cache shared by every store in a registry

use std::collections::HashMap;
use parking_lot::RwLock;

use shared::{ModuleSlug, ReportKey, ReportResult};

/// Settled report results keyed by serialized request.
///
/// Entries are immutable once stored: a key can only be written again after
/// it has been removed by `invalidate`. `Pending` is never stored; in-flight
/// state lives in the deduplicator.
#[derive(Debug, Default)]
pub struct ReportCache {
    entries: RwLock<HashMap<ReportKey, ReportResult>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ReportKey) -> Option<ReportResult> {
        self.entries.read().get(key).cloned()
    }

    /// Store a settled result. Returns false if the result is `Pending` or the
    /// key already holds a settled result.
    pub fn set(&self, key: ReportKey, result: ReportResult) -> bool {
        if !result.is_settled() {
            tracing::debug!(key = %key, "refusing to cache a pending result");
            return false;
        }

        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            tracing::debug!(key = %key, "cache entry already settled, keeping existing result");
            return false;
        }
        entries.insert(key, result);
        true
    }

    /// Remove every entry whose key matches `predicate`; returns how many
    pub fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&ReportKey) -> bool,
    {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    /// Remove all entries belonging to one module
    pub fn invalidate_module(&self, module: ModuleSlug) -> usize {
        self.invalidate(|key| key.belongs_to(module))
    }

    pub fn contains(&self, key: &ReportKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn keys_for(&self, module: ModuleSlug) -> Vec<ReportKey> {
        self.entries
            .read()
            .keys()
            .filter(|key| key.belongs_to(module))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
