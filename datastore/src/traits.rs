//! Datastore trait definitions for dependency injection

use async_trait::async_trait;
use serde_json::Value;

use shared::ApiFailure;
use crate::types::ApiRequest;

/// REST transport to the plugin's API; the only I/O seam of the datastore
#[mockall::automock]
#[async_trait]
pub trait ApiFetcher: Send + Sync {
    /// Send a request and return the decoded JSON payload
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiFailure>;
}
