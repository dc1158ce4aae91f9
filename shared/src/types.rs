//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::{SharedError, SharedResult};

/// External Google service a module connects to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModuleSlug {
    #[serde(rename = "search-console")]
    SearchConsole,
    #[serde(rename = "analytics-4")]
    Analytics4,
    #[serde(rename = "adsense")]
    AdSense,
    #[serde(rename = "tagmanager")]
    TagManager,
    #[serde(rename = "pagespeed-insights")]
    PageSpeedInsights,
}

impl ModuleSlug {
    /// Every module known to the registry, in registration order
    pub const ALL: [ModuleSlug; 5] = [
        ModuleSlug::SearchConsole,
        ModuleSlug::Analytics4,
        ModuleSlug::AdSense,
        ModuleSlug::TagManager,
        ModuleSlug::PageSpeedInsights,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleSlug::SearchConsole => "search-console",
            ModuleSlug::Analytics4 => "analytics-4",
            ModuleSlug::AdSense => "adsense",
            ModuleSlug::TagManager => "tagmanager",
            ModuleSlug::PageSpeedInsights => "pagespeed-insights",
        }
    }

    /// Datastore namespace, e.g. `modules/search-console`
    pub fn namespace(&self) -> String {
        format!("modules/{}", self.as_str())
    }
}

impl fmt::Display for ModuleSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleSlug {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleSlug::ALL
            .iter()
            .copied()
            .find(|slug| slug.as_str() == s)
            .ok_or_else(|| SharedError::UnknownModule { slug: s.to_string() })
    }
}

/// Request for one report datapoint of a module
///
/// Parameters are kept sorted by name so that the serialized form, and with it
/// the request identity, does not depend on insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub module: ModuleSlug,
    pub datapoint: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl ReportRequest {
    pub fn new(module: ModuleSlug, datapoint: impl Into<String>) -> Self {
        Self {
            module,
            datapoint: datapoint.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Builder-style parameter setter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Stable serialization of the request, used as its identity.
    ///
    /// Fails for an empty datapoint or for any parameter that is not a
    /// primitive (string, number, boolean or null).
    pub fn serialize_key(&self) -> SharedResult<String> {
        if self.datapoint.trim().is_empty() {
            return Err(SharedError::SerializationError {
                message: format!("empty datapoint for module {}", self.module),
            });
        }

        for (name, value) in &self.parameters {
            if name.is_empty() {
                return Err(SharedError::SerializationError {
                    message: "parameter with empty name".to_string(),
                });
            }
            if matches!(value, Value::Array(_) | Value::Object(_)) {
                return Err(SharedError::SerializationError {
                    message: format!("parameter '{name}' is not a primitive value"),
                });
            }
        }

        let parameters = serde_json::to_string(&self.parameters).map_err(|e| {
            SharedError::SerializationError { message: e.to_string() }
        })?;

        Ok(format!("{}::{}::{}", self.module, self.datapoint, parameters))
    }

    /// Cache key for this request
    pub fn key(&self) -> SharedResult<ReportKey> {
        Ok(ReportKey {
            scope: KeyScope::Module(self.module),
            serialized: self.serialize_key()?,
        })
    }

    /// Query string pairs for the REST endpoint
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.parameters
            .iter()
            .map(|(name, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (name.clone(), rendered)
            })
            .collect()
    }
}

/// Owner of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScope {
    Module(ModuleSlug),
    Core,
}

/// Identity of a cached result: owning scope plus serialized request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    pub scope: KeyScope,
    pub serialized: String,
}

impl ReportKey {
    /// Key for a core store datapoint such as `core/site/connection`
    pub fn core(store: &str, datapoint: &str) -> Self {
        Self {
            scope: KeyScope::Core,
            serialized: format!("core/{store}::{datapoint}"),
        }
    }

    pub fn module(&self) -> Option<ModuleSlug> {
        match self.scope {
            KeyScope::Module(slug) => Some(slug),
            KeyScope::Core => None,
        }
    }

    pub fn belongs_to(&self, slug: ModuleSlug) -> bool {
        self.module() == Some(slug)
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized)
    }
}

/// Outcome of a report fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum ReportResult {
    Pending,
    Success(Value),
    Error(ApiFailure),
}

impl ReportResult {
    pub fn is_settled(&self) -> bool {
        !matches!(self, ReportResult::Pending)
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            ReportResult::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiFailure> {
        match self {
            ReportResult::Error(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<Result<Value, ApiFailure>> for ReportResult {
    fn from(result: Result<Value, ApiFailure>) -> Self {
        match result {
            Ok(payload) => ReportResult::Success(payload),
            Err(failure) => ReportResult::Error(failure),
        }
    }
}

/// Failure of a REST request, carried as data inside `ReportResult::Error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiFailure {
    /// Transport failure, or a non-2xx response without a JSON error body
    NetworkError { status: Option<u16>, message: String },
    /// Non-2xx response with a `{code, message, data}` body
    ApiError { status: u16, code: String, message: String },
    /// 401/403: credentials were rejected or revoked
    StaleCredentials { status: u16, message: String },
}

impl ApiFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiFailure::NetworkError { status, .. } => *status,
            ApiFailure::ApiError { status, .. } => Some(*status),
            ApiFailure::StaleCredentials { status, .. } => Some(*status),
        }
    }

    pub fn is_stale_credentials(&self) -> bool {
        matches!(self, ApiFailure::StaleCredentials { .. })
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::NetworkError { status: Some(status), message } => {
                write!(f, "network error (HTTP {status}): {message}")
            }
            ApiFailure::NetworkError { status: None, message } => {
                write!(f, "network error: {message}")
            }
            ApiFailure::ApiError { status, code, message } => {
                write!(f, "API error {code} (HTTP {status}): {message}")
            }
            ApiFailure::StaleCredentials { status, message } => {
                write!(f, "stale credentials (HTTP {status}): {message}")
            }
        }
    }
}

impl std::error::Error for ApiFailure {}
