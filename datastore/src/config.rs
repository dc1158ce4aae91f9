//! Client configuration
//!
//! ## Configuration Sources
//! Values are resolved, lowest precedence first, from:
//! 1. Built-in defaults
//! 2. A `.env` file in the current directory or its parents (if present)
//! 3. Process environment variables
//! 4. Command line flags (applied by the binary on top of `from_env`)
//!
//! ## Variables
//! - `SITEKIT_SITE_URL`: WordPress site URL (required)
//! - `SITEKIT_USERNAME`, `SITEKIT_APP_PASSWORD`: application password pair
//! - `SITEKIT_NONCE`: REST nonce sent as `X-WP-Nonce`
//! - `SITEKIT_TIMEOUT_MS`: request timeout in milliseconds

use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{DatastoreError, DatastoreResult};
use crate::types::Credentials;

pub const SITE_URL_VAR: &str = "SITEKIT_SITE_URL";
pub const USERNAME_VAR: &str = "SITEKIT_USERNAME";
pub const APP_PASSWORD_VAR: &str = "SITEKIT_APP_PASSWORD";
pub const NONCE_VAR: &str = "SITEKIT_NONCE";
pub const TIMEOUT_VAR: &str = "SITEKIT_TIMEOUT_MS";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const REST_NAMESPACE: [&str; 3] = ["wp-json", "google-site-kit", "v1"];

/// Connection settings for the REST fetcher
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub site_url: Url,
    pub credentials: Option<Credentials>,
    pub nonce: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(site_url: Url) -> Self {
        Self {
            site_url,
            credentials: None,
            nonce: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn parse_site_url(input: &str) -> DatastoreResult<Url> {
        let url = Url::parse(input).map_err(|e| DatastoreError::ConfigError {
            message: format!("invalid {SITE_URL_VAR} '{input}': {e}"),
        })?;
        if url.cannot_be_a_base() {
            return Err(DatastoreError::ConfigError {
                message: format!("{SITE_URL_VAR} '{input}' cannot be used as a base URL"),
            });
        }
        Ok(url)
    }

    /// Load from the process environment after reading `.env` if present
    pub fn from_env() -> DatastoreResult<Self> {
        // Missing .env is fine; existing variables are never overridden
        let _ = dotenv::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load a specific env file into the process environment, then resolve
    pub fn from_env_file(path: &Path) -> DatastoreResult<Self> {
        dotenv::from_path(path).map_err(|e| DatastoreError::ConfigError {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> DatastoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let site_url = lookup(SITE_URL_VAR).ok_or_else(|| DatastoreError::ConfigError {
            message: format!("{SITE_URL_VAR} must be set"),
        })?;
        let mut config = Self::new(Self::parse_site_url(&site_url)?);

        config.credentials = match (lookup(USERNAME_VAR), lookup(APP_PASSWORD_VAR)) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            (None, None) => None,
            _ => {
                return Err(DatastoreError::ConfigError {
                    message: format!("{USERNAME_VAR} and {APP_PASSWORD_VAR} must be set together"),
                });
            }
        };

        config.nonce = lookup(NONCE_VAR).filter(|nonce| !nonce.is_empty());

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let millis = raw.parse::<u64>().map_err(|_| DatastoreError::ConfigError {
                message: format!("{TIMEOUT_VAR} must be a number of milliseconds, got '{raw}'"),
            })?;
            config.timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// `{site_url}/wp-json/google-site-kit/v1`
    pub fn api_root(&self) -> Url {
        let mut url = self.site_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(REST_NAMESPACE);
        }
        url
    }
}
