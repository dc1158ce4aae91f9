//! Test helper utilities for datastore integration tests

use std::time::Duration;
use url::Url;

use datastore::{ClientConfig, Credentials, RealApiFetcher, Registry};
use shared::ModuleSlug;

/// REST path of a datapoint under the plugin namespace
pub fn api_path(kind: &str, identifier: &str, datapoint: &str) -> String {
    format!("/wp-json/google-site-kit/v1/{kind}/{identifier}/data/{datapoint}")
}

pub fn module_path(slug: ModuleSlug, datapoint: &str) -> String {
    api_path("modules", slug.as_str(), datapoint)
}

/// Fetcher pointed at a mock server
pub fn create_fetcher(server_uri: &str) -> RealApiFetcher {
    let mut config = ClientConfig::new(Url::parse(server_uri).unwrap());
    config.timeout = Duration::from_secs(5);
    RealApiFetcher::new(config).unwrap()
}

/// Registry with every module, backed by a mock server
pub fn create_registry(server_uri: &str) -> Registry<RealApiFetcher> {
    Registry::new(create_fetcher(server_uri))
}

pub fn test_credentials() -> Credentials {
    Credentials::new("admin", "abcd efgh ijkl mnop")
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
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
