//! Core stores: site, user and UI
//!
//! Site and user data load once through the same deduplicator and cache as
//! module reports. UI state is local only.

use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

use shared::{ReportKey, ReportResult};
use crate::error::{DatastoreError, DatastoreResult};
use crate::services::RequestDeduplicator;
use crate::traits::ApiFetcher;
use crate::types::{ApiRequest, Endpoint, SiteConnection, UserAuthentication};

/// One `core/{store}/data/{datapoint}` value resolved on first access
struct CoreResource<F: ApiFetcher + 'static> {
    store: &'static str,
    datapoint: &'static str,
    fetcher: Arc<F>,
    dedup: Arc<RequestDeduplicator>,
}

impl<F: ApiFetcher + 'static> CoreResource<F> {
    fn new(store: &'static str, datapoint: &'static str, fetcher: Arc<F>, dedup: Arc<RequestDeduplicator>) -> Self {
        Self { store, datapoint, fetcher, dedup }
    }

    fn key(&self) -> ReportKey {
        ReportKey::core(self.store, self.datapoint)
    }

    fn endpoint(&self) -> Endpoint {
        Endpoint::core(self.store, self.datapoint)
    }

    async fn resolve<T: DeserializeOwned>(&self) -> DatastoreResult<T> {
        let fetcher = Arc::clone(&self.fetcher);
        let request = ApiRequest::get(self.endpoint());
        let dispatch = self.dedup.fetch(self.key(), move || async move {
            ReportResult::from(fetcher.send(request).await)
        });
        self.decode(dispatch.result().await)
    }

    fn cached<T: DeserializeOwned>(&self) -> Option<T> {
        self.dedup
            .cache()
            .get(&self.key())
            .and_then(|result| self.decode(result).ok())
    }

    fn invalidate(&self) {
        let key = self.key();
        self.dedup.invalidate(|candidate| candidate == &key);
    }

    fn decode<T: DeserializeOwned>(&self, result: ReportResult) -> DatastoreResult<T> {
        match result {
            ReportResult::Success(payload) => {
                serde_json::from_value(payload).map_err(|e| DatastoreError::UnexpectedResponse {
                    endpoint: self.endpoint().to_string(),
                    message: e.to_string(),
                })
            }
            ReportResult::Error(failure) => Err(DatastoreError::Request(failure)),
            ReportResult::Pending => Err(DatastoreError::UnexpectedResponse {
                endpoint: self.endpoint().to_string(),
                message: "fetch resolved while still pending".to_string(),
            }),
        }
    }
}

/// `core/site`: site connection info
pub struct CoreSiteStore<F: ApiFetcher + 'static> {
    connection: CoreResource<F>,
}

impl<F: ApiFetcher + 'static> CoreSiteStore<F> {
    pub fn new(fetcher: Arc<F>, dedup: Arc<RequestDeduplicator>) -> Self {
        Self {
            connection: CoreResource::new("site", "connection", fetcher, dedup),
        }
    }

    /// Resolver for `core/site/data/connection`
    pub async fn connection(&self) -> DatastoreResult<SiteConnection> {
        self.connection.resolve().await
    }

    /// `None` until the connection has been resolved
    pub fn is_connected(&self) -> Option<bool> {
        self.connection.cached::<SiteConnection>().map(|c| c.connected)
    }

    pub fn is_setup_completed(&self) -> Option<bool> {
        self.connection.cached::<SiteConnection>().map(|c| c.setup_completed)
    }

    pub fn invalidate(&self) {
        self.connection.invalidate();
    }
}

/// `core/user`: authentication and OAuth scopes
pub struct CoreUserStore<F: ApiFetcher + 'static> {
    authentication: CoreResource<F>,
}

impl<F: ApiFetcher + 'static> CoreUserStore<F> {
    pub fn new(fetcher: Arc<F>, dedup: Arc<RequestDeduplicator>) -> Self {
        Self {
            authentication: CoreResource::new("user", "authentication", fetcher, dedup),
        }
    }

    /// Resolver for `core/user/data/authentication`
    pub async fn authentication(&self) -> DatastoreResult<UserAuthentication> {
        self.authentication.resolve().await
    }

    pub fn is_authenticated(&self) -> Option<bool> {
        self.authentication
            .cached::<UserAuthentication>()
            .map(|auth| auth.authenticated)
    }

    pub fn has_scope(&self, scope: &str) -> Option<bool> {
        self.authentication
            .cached::<UserAuthentication>()
            .map(|auth| auth.granted_scopes.iter().any(|granted| granted == scope))
    }

    pub fn invalidate(&self) {
        self.authentication.invalidate();
    }
}

/// `core/ui`: local key/value state
#[derive(Debug, Default)]
pub struct CoreUiStore {
    values: RwLock<HashMap<String, Value>>,
}

impl CoreUiStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&self, key: impl Into<String>, value: Value) {
        self.values.write().insert(key.into(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn reset(&self) {
        self.values.write().clear();
    }
}
