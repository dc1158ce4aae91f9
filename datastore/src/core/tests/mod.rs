//! Tests for module stores, core stores and the registry
//!
//! Most tests script the transport with `MockApiFetcher`. Tests that need to
//! observe a fetch while it is still pending use `GatedFetcher`.


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use shared::{ApiFailure, ModuleSlug, ReportRequest};
use crate::core::ModuleStore;
use crate::services::{ReportCache, RequestDeduplicator};
use crate::traits::ApiFetcher;
use crate::types::ApiRequest;

type Responder = Box<dyn Fn(&ApiRequest) -> Result<Value, ApiFailure> + Send + Sync>;

/// Fetcher that holds requests until `open` is called
pub struct GatedFetcher {
    calls: AtomicUsize,
    gate: Semaphore,
    gated_datapoint: Option<&'static str>,
    respond: Responder,
}

impl GatedFetcher {
    pub fn new<R>(respond: R) -> Self
    where
        R: Fn(&ApiRequest) -> Result<Value, ApiFailure> + Send + Sync + 'static,
    {
        Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            gated_datapoint: None,
            respond: Box::new(respond),
        }
    }

    /// Only hold requests for `datapoint`; everything else answers at once
    pub fn gating<R>(datapoint: &'static str, respond: R) -> Self
    where
        R: Fn(&ApiRequest) -> Result<Value, ApiFailure> + Send + Sync + 'static,
    {
        Self {
            gated_datapoint: Some(datapoint),
            ..Self::new(respond)
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(64);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApiFetcher for GatedFetcher {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gated = self
            .gated_datapoint
            .map_or(true, |datapoint| request.endpoint.datapoint == datapoint);
        if gated {
            let _permit = self.gate.acquire().await;
        }
        (self.respond)(&request)
    }
}

pub fn create_store<F: ApiFetcher + 'static>(slug: ModuleSlug, fetcher: Arc<F>) -> ModuleStore<F> {
    let dedup = Arc::new(RequestDeduplicator::new(Arc::new(ReportCache::new())));
    ModuleStore::new(slug, fetcher, dedup)
}

pub fn search_analytics() -> ReportRequest {
    ReportRequest::new(ModuleSlug::SearchConsole, "searchanalytics")
        .param("startDate", "2024-01-01")
        .param("endDate", "2024-01-31")
        .param("dimensions", "query")
}

pub fn analytics_report() -> ReportRequest {
    ReportRequest::new(ModuleSlug::Analytics4, "report")
        .param("startDate", "2024-01-01")
        .param("endDate", "2024-01-31")
        .param("metrics", "sessions")
}

pub fn stale_credentials() -> ApiFailure {
    ApiFailure::StaleCredentials {
        status: 401,
        message: "Sorry, you are not allowed to do that.".to_string(),
    }
}

pub fn access_granted() -> Value {
    json!({ "access": true })
}

/// Helper to wait for async conditions with timeout
pub async fn wait_for_condition<F, Fut>(mut condition: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        if condition().await {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
