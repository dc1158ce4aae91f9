//! REST fetcher for the plugin's `google-site-kit/v1` API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use shared::ApiFailure;
use crate::config::ClientConfig;
use crate::error::{DatastoreError, DatastoreResult};
use crate::traits::ApiFetcher;
use crate::types::{ApiRequest, Endpoint, HttpMethod};

const NONCE_HEADER: &str = "X-WP-Nonce";

/// WordPress REST error body: `{code, message, data: {status}}`
#[derive(Debug, Deserialize)]
struct WpErrorBody {
    code: String,
    message: String,
}

/// Real fetcher backed by `reqwest`
#[derive(Clone)]
pub struct RealApiFetcher {
    client: reqwest::Client,
    config: ClientConfig,
}

impl RealApiFetcher {
    pub fn new(config: ClientConfig) -> DatastoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DatastoreError::ConfigError {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for an endpoint
    pub fn url_for(&self, endpoint: &Endpoint) -> Result<Url, ApiFailure> {
        let mut url = self.config.api_root();
        url.path_segments_mut()
            .map_err(|_| ApiFailure::NetworkError {
                status: None,
                message: format!("site URL {} cannot carry a path", self.config.site_url),
            })?
            .extend(endpoint.segments());
        Ok(url)
    }
}

#[async_trait]
impl ApiFetcher for RealApiFetcher {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiFailure> {
        let url = self.url_for(&request.endpoint)?;
        tracing::debug!(endpoint = %request.endpoint, method = ?request.method, "sending request");

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self
                .client
                .post(url)
                .json(&json!({ "data": request.body.clone().unwrap_or(Value::Null) })),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(nonce) = &self.config.nonce {
            builder = builder.header(NONCE_HEADER, nonce);
        }
        if let Some(credentials) = request.credentials.as_ref().or(self.config.credentials.as_ref()) {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.application_password));
        }

        let response = builder.send().await.map_err(transport_failure)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if !status.is_success() {
            let failure = classify_failure(status.as_u16(), &body);
            tracing::debug!(endpoint = %request.endpoint, error = %failure, "request failed");
            return Err(failure);
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ApiFailure::NetworkError {
            status: Some(status.as_u16()),
            message: format!("invalid JSON response: {e}"),
        })
    }
}

fn transport_failure(error: reqwest::Error) -> ApiFailure {
    let message = if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    };
    ApiFailure::NetworkError {
        status: error.status().map(|s| s.as_u16()),
        message,
    }
}

/// Map a non-2xx response onto the failure taxonomy
pub fn classify_failure(status: u16, body: &str) -> ApiFailure {
    let parsed = serde_json::from_str::<WpErrorBody>(body).ok();

    match (status, parsed) {
        (401 | 403, Some(error)) => ApiFailure::StaleCredentials { status, message: error.message },
        (401 | 403, None) => ApiFailure::StaleCredentials {
            status,
            message: format!("HTTP {status}"),
        },
        (_, Some(error)) => ApiFailure::ApiError {
            status,
            code: error.code,
            message: error.message,
        },
        (_, None) => ApiFailure::NetworkError {
            status: Some(status),
            message: format!("HTTP {status}"),
        },
    }
}
