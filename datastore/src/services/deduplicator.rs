//! Request deduplication
//!
//! At most one fetch is registered per cache key. Callers asking for a key
//! that is already in flight get a clone of the same shared future. Each fetch
//! runs on its own tokio task, so dropping every consumer does not cancel it:
//! the result is still cached for whoever asks next.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use uuid::Uuid;

use shared::{ApiFailure, ReportKey, ReportResult};
use crate::services::report_cache::ReportCache;

/// Joinable handle to an in-flight fetch
pub type SharedFetch = Shared<BoxFuture<'static, ReportResult>>;

/// How a lookup was satisfied
pub enum Dispatch {
    /// Already settled in the cache; no fetch involved
    Cached(ReportResult),
    /// Joined a fetch another caller started
    Joined(SharedFetch),
    /// Started a new fetch
    Issued(SharedFetch),
}

impl Dispatch {
    pub fn issued(&self) -> bool {
        matches!(self, Dispatch::Issued(_))
    }

    /// Wait for the settled result
    pub async fn result(self) -> ReportResult {
        match self {
            Dispatch::Cached(result) => result,
            Dispatch::Joined(fetch) | Dispatch::Issued(fetch) => fetch.await,
        }
    }
}

struct InFlight {
    id: Uuid,
    fetch: SharedFetch,
}

/// In-flight table in front of a `ReportCache`.
///
/// Lock order is always in-flight table, then cache. A fetch task writes its
/// result to the cache and removes its marker under one lock, so a key is
/// always either cached, in flight, or genuinely absent.
pub struct RequestDeduplicator {
    cache: Arc<ReportCache>,
    in_flight: Mutex<HashMap<ReportKey, InFlight>>,
}

impl RequestDeduplicator {
    pub fn new(cache: Arc<ReportCache>) -> Self {
        Self {
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<ReportCache> {
        &self.cache
    }

    /// Return the cached result for `key`, join its in-flight fetch, or start
    /// one with `start`. `start` is only called when a new fetch is issued.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch<F, Fut>(self: &Arc<Self>, key: ReportKey, start: F) -> Dispatch
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ReportResult> + Send + 'static,
    {
        let mut in_flight = self.in_flight.lock();

        if let Some(result) = self.cache.get(&key) {
            return Dispatch::Cached(result);
        }
        if let Some(existing) = in_flight.get(&key) {
            tracing::debug!(key = %key, fetch_id = %existing.id, "joining in-flight fetch");
            return Dispatch::Joined(existing.fetch.clone());
        }

        let id = Uuid::new_v4();
        tracing::debug!(key = %key, fetch_id = %id, "issuing fetch");

        let request = start();
        let mut guard = SettleGuard {
            dedup: Arc::clone(self),
            key: key.clone(),
            id,
            result: None,
        };
        let handle = tokio::spawn(async move {
            let result = request.await;
            guard.result = Some(result.clone());
            // settle before the result becomes visible to consumers
            drop(guard);
            result
        });

        let fetch = async move {
            handle.await.unwrap_or_else(|e| {
                ReportResult::Error(ApiFailure::NetworkError {
                    status: None,
                    message: format!("fetch task failed: {e}"),
                })
            })
        }
        .boxed()
        .shared();

        in_flight.insert(key, InFlight { id, fetch: fetch.clone() });
        Dispatch::Issued(fetch)
    }

    pub fn is_in_flight(&self, key: &ReportKey) -> bool {
        self.in_flight.lock().contains_key(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Forget in-flight fetches and cached results matching `predicate`.
    ///
    /// Fetches already running keep going and still resolve for their current
    /// consumers, but their results are not written to the cache.
    pub fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&ReportKey) -> bool,
    {
        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|key, _| !predicate(key));
        self.cache.invalidate(&predicate)
    }

    fn settle(&self, key: &ReportKey, id: Uuid, result: Option<ReportResult>) {
        let mut in_flight = self.in_flight.lock();

        let current = in_flight.get(key).is_some_and(|entry| entry.id == id);
        if !current {
            tracing::debug!(key = %key, fetch_id = %id, "fetch was invalidated, result not cached");
            return;
        }

        match result {
            Some(result) => {
                self.cache.set(key.clone(), result);
            }
            None => {
                tracing::warn!(key = %key, fetch_id = %id, "fetch task ended without a result");
            }
        }
        in_flight.remove(key);
    }
}

/// Settles the marker when the fetch task finishes, panics or is aborted
struct SettleGuard {
    dedup: Arc<RequestDeduplicator>,
    key: ReportKey,
    id: Uuid,
    result: Option<ReportResult>,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        self.dedup.settle(&self.key, self.id, self.result.take());
    }
}
