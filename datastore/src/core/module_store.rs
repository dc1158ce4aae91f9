//! Per-module store: connection state machine, settings, report resolvers
//!
//! Connection lifecycle:
//!
//! ```text
//! Disconnected --connect--> Connecting --access granted--> Connected
//!       ^                        |                             |
//!       +----access denied-------+----401/403 on any request---+
//! ```

use std::future::Future;
use std::sync::Arc;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use shared::{store_debug, store_info, store_warn, ApiFailure, ModuleSlug, ReportRequest, ReportResult};
use crate::error::{DatastoreError, DatastoreResult};
use crate::services::RequestDeduplicator;
use crate::state::{create_shared_state, SharedModuleState};
use crate::traits::ApiFetcher;
use crate::types::{ApiRequest, ConnectionState, Credentials, Endpoint, ModuleSettings};

const SETTINGS_DATAPOINT: &str = "settings";

/// Store for one external service
pub struct ModuleStore<F: ApiFetcher + 'static> {
    slug: ModuleSlug,
    namespace: String,
    state: SharedModuleState,
    fetcher: Arc<F>,
    dedup: Arc<RequestDeduplicator>,
    settings_load: Mutex<()>,
}

impl<F: ApiFetcher + 'static> ModuleStore<F> {
    pub fn new(slug: ModuleSlug, fetcher: Arc<F>, dedup: Arc<RequestDeduplicator>) -> Self {
        Self {
            slug,
            namespace: slug.namespace(),
            state: create_shared_state(slug),
            fetcher,
            dedup,
            settings_load: Mutex::new(()),
        }
    }

    pub fn slug(&self) -> ModuleSlug {
        self.slug
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // ----------------------------------------------------------------------
    // Selectors
    // ----------------------------------------------------------------------

    pub async fn connection_state(&self) -> ConnectionState {
        self.state.read().await.connection
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.is_connected()
    }

    pub async fn settings(&self) -> ModuleSettings {
        self.state.read().await.settings.clone()
    }

    pub async fn setting(&self, name: &str) -> Option<Value> {
        self.state.read().await.setting(name).cloned()
    }

    pub async fn have_settings_changed(&self) -> bool {
        self.state.read().await.have_settings_changed()
    }

    /// Current result for `request` without fetching: `Pending` while in
    /// flight, `None` if it was never requested (or was invalidated).
    pub fn report(&self, request: &ReportRequest) -> DatastoreResult<Option<ReportResult>> {
        let key = self.key_for(request)?;
        if let Some(result) = self.dedup.cache().get(&key) {
            return Ok(Some(result));
        }
        Ok(self.dedup.is_in_flight(&key).then_some(ReportResult::Pending))
    }

    pub fn is_resolving(&self, request: &ReportRequest) -> DatastoreResult<bool> {
        let key = self.key_for(request)?;
        Ok(self.dedup.is_in_flight(&key))
    }

    pub fn has_finished_resolution(&self, request: &ReportRequest) -> DatastoreResult<bool> {
        let key = self.key_for(request)?;
        Ok(self.dedup.cache().contains(&key))
    }

    pub fn error_for_report(&self, request: &ReportRequest) -> DatastoreResult<Option<ApiFailure>> {
        Ok(self
            .report(request)?
            .and_then(|result| result.error().cloned()))
    }

    // ----------------------------------------------------------------------
    // Resolvers
    // ----------------------------------------------------------------------

    /// Resolve a report: cached result, joined in-flight fetch, or a new fetch.
    ///
    /// Fetch failures come back as `ReportResult::Error`; only an invalid
    /// request shape is returned as `Err`. Calling again for a settled key
    /// does not touch the network.
    pub async fn get_report(&self, request: ReportRequest) -> DatastoreResult<ReportResult> {
        let key = self.key_for(&request)?;
        let credentials = self.state.read().await.credentials.clone();

        let dispatch = self.dedup.fetch(key.clone(), || self.report_fetch(request, credentials));
        if dispatch.issued() {
            store_debug!(self.namespace, key = %key, "report fetch issued");
        }
        Ok(dispatch.result().await)
    }

    /// Load settings from the server once; later calls return local state
    pub async fn fetch_settings(&self) -> DatastoreResult<ModuleSettings> {
        let _loading = self.settings_load.lock().await;

        let credentials = {
            let state = self.state.read().await;
            if state.saved_settings.is_some() {
                return Ok(state.settings.clone());
            }
            state.credentials.clone()
        };

        let request = ApiRequest::get(Endpoint::module(self.slug, SETTINGS_DATAPOINT))
            .with_credentials(credentials);
        let payload = self.send_checked(request).await?;
        let loaded = self.settings_from_payload(payload)?;

        let mut state = self.state.write().await;
        // local edits made before the first load win over server values
        let edits = std::mem::take(&mut state.settings);
        state.receive_settings(loaded);
        state.merge_settings(edits);
        store_debug!(self.namespace, count = state.settings.len(), "settings loaded");
        Ok(state.settings.clone())
    }

    // ----------------------------------------------------------------------
    // Actions
    // ----------------------------------------------------------------------

    /// Merge `partial` into the settings and drop every cached report of this
    /// module.
    pub async fn update_settings(&self, partial: ModuleSettings) {
        let mut state = self.state.write().await;
        state.merge_settings(partial);
        let cleared = self.invalidate_module_reports();
        store_info!(self.namespace, cleared, "settings updated, module reports invalidated");
    }

    /// Restore the last saved settings, dropping local edits
    pub async fn rollback_settings(&self) {
        let mut state = self.state.write().await;
        let Some(saved) = state.saved_settings.clone() else {
            return;
        };
        if saved == state.settings {
            return;
        }
        state.settings = saved;
        let cleared = self.invalidate_module_reports();
        store_info!(self.namespace, cleared, "settings rolled back, module reports invalidated");
    }

    /// Persist the current settings
    pub async fn save_settings(&self) -> DatastoreResult<ModuleSettings> {
        let (settings, credentials) = {
            let state = self.state.read().await;
            (state.settings.clone(), state.credentials.clone())
        };

        let request = ApiRequest::post(
            Endpoint::module(self.slug, SETTINGS_DATAPOINT),
            Value::Object(settings.clone()),
        )
        .with_credentials(credentials);
        let payload = self.send_checked(request).await?;

        // the server echoes the stored settings; fall back to what was sent
        let saved = match payload {
            Value::Object(map) => map,
            _ => settings,
        };
        let mut state = self.state.write().await;
        state.receive_settings(saved.clone());
        store_info!(self.namespace, "settings saved");
        Ok(saved)
    }

    /// Verify access with `credentials` and move to `Connected` if granted
    pub async fn connect(&self, credentials: Credentials) -> DatastoreResult<ConnectionState> {
        {
            let mut state = self.state.write().await;
            if state.connection == ConnectionState::Connecting {
                return Err(DatastoreError::ConnectionInProgress { module: self.slug });
            }
            state.connection = ConnectionState::Connecting;
            state.credentials = Some(credentials.clone());
        }
        store_info!(self.namespace, "connecting");

        let request = ApiRequest::post(
            Endpoint::core("modules", "check-access"),
            json!({ "slug": self.slug.as_str() }),
        )
        .with_credentials(Some(credentials.clone()));
        let outcome = self.fetcher.send(request).await;

        let mut state = self.state.write().await;
        match outcome {
            Ok(payload) if payload.get("access").and_then(Value::as_bool) == Some(true) => {
                state.connection = ConnectionState::Connected;
                state.credentials = Some(credentials);
                let cleared = self.invalidate_module_reports();
                store_info!(self.namespace, cleared, "connected");
                Ok(ConnectionState::Connected)
            }
            Ok(_) => {
                state.connection = ConnectionState::Disconnected;
                state.credentials = None;
                store_warn!(self.namespace, "access denied, staying disconnected");
                Ok(ConnectionState::Disconnected)
            }
            Err(failure) => {
                state.connection = ConnectionState::Disconnected;
                state.credentials = None;
                store_warn!(self.namespace, error = %failure, "connection check failed");
                Err(DatastoreError::Request(failure))
            }
        }
    }

    /// Drop credentials and move to `Disconnected`
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        state.connection = ConnectionState::Disconnected;
        state.credentials = None;
        let cleared = self.invalidate_module_reports();
        store_info!(self.namespace, cleared, "disconnected");
    }

    /// Drop one cached or in-flight report so the next resolver call refetches
    pub fn invalidate_report(&self, request: &ReportRequest) -> DatastoreResult<()> {
        let key = self.key_for(request)?;
        self.dedup.invalidate(|candidate| candidate == &key);
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Internals
    // ----------------------------------------------------------------------

    fn key_for(&self, request: &ReportRequest) -> DatastoreResult<shared::ReportKey> {
        if request.module != self.slug {
            return Err(DatastoreError::ModuleMismatch {
                store: self.slug,
                requested: request.module,
            });
        }
        Ok(request.key()?)
    }

    fn invalidate_module_reports(&self) -> usize {
        let slug = self.slug;
        self.dedup.invalidate(move |key| key.belongs_to(slug))
    }

    /// Future for a report fetch; runs detached from the caller
    fn report_fetch(
        &self,
        request: ReportRequest,
        credentials: Option<Credentials>,
    ) -> impl Future<Output = ReportResult> + Send + 'static {
        let fetcher = Arc::clone(&self.fetcher);
        let state = Arc::clone(&self.state);
        let namespace = self.namespace.clone();

        async move {
            let api_request = ApiRequest::report(&request).with_credentials(credentials.clone());
            let outcome = fetcher.send(api_request).await;
            if let Err(failure) = &outcome {
                store_warn!(namespace, datapoint = %request.datapoint, error = %failure, "report fetch failed");
                if failure.is_stale_credentials() {
                    revoke_connection(&state, &namespace, credentials.as_ref()).await;
                }
            }
            ReportResult::from(outcome)
        }
    }

    /// Send outside the report cache, applying the stale-credentials transition
    async fn send_checked(&self, request: ApiRequest) -> DatastoreResult<Value> {
        let sent_with = request.credentials.clone();
        match self.fetcher.send(request).await {
            Ok(payload) => Ok(payload),
            Err(failure) => {
                if failure.is_stale_credentials() {
                    revoke_connection(&self.state, &self.namespace, sent_with.as_ref()).await;
                }
                Err(DatastoreError::Request(failure))
            }
        }
    }

    fn settings_from_payload(&self, payload: Value) -> DatastoreResult<ModuleSettings> {
        match payload {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(ModuleSettings::new()),
            other => Err(DatastoreError::UnexpectedResponse {
                endpoint: Endpoint::module(self.slug, SETTINGS_DATAPOINT).to_string(),
                message: format!("expected a settings object, got {other}"),
            }),
        }
    }
}

/// Disconnect after a 401/403, unless the request was sent with credentials
/// that have since been replaced.
async fn revoke_connection(state: &SharedModuleState, namespace: &str, sent_with: Option<&Credentials>) {
    let mut state = state.write().await;
    if state.connection != ConnectionState::Connected || state.credentials.as_ref() != sent_with {
        store_debug!(namespace, "ignoring rejection of superseded credentials");
        return;
    }
    state.connection = ConnectionState::Disconnected;
    state.credentials = None;
    store_warn!(namespace, "credentials rejected, module disconnected");
}
