//! Tests for datastore services
//!
//! Cache and deduplicator tests drive the services directly; REST fetcher
//! tests run against a local wiremock server.


use std::time::Duration;
use shared::{ModuleSlug, ReportKey, ReportRequest};

/// Cache key for a search-console request on `datapoint`
pub fn report_key(datapoint: &str) -> ReportKey {
    ReportRequest::new(ModuleSlug::SearchConsole, datapoint)
        .param("startDate", "2024-01-01")
        .param("endDate", "2024-01-31")
        .key()
        .unwrap()
}

pub fn module_key(module: ModuleSlug, datapoint: &str) -> ReportKey {
    ReportRequest::new(module, datapoint).key().unwrap()
}

/// Helper to wait for async conditions with timeout
pub async fn wait_for_condition<F>(mut condition: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        if condition() {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
