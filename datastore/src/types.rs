//! Datastore-specific types

use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shared::{ModuleSlug, ReportRequest};

/// Module settings as stored by the plugin
pub type ModuleSettings = Map<String, Value>;

/// Connection lifecycle of a module store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

/// WordPress application password, sent as HTTP basic auth
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub application_password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, application_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            application_password: application_password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("application_password", &"***")
            .finish()
    }
}

/// REST route family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointType {
    Core,
    Modules,
}

impl EndpointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointType::Core => "core",
            EndpointType::Modules => "modules",
        }
    }
}

/// `/{type}/{identifier}/data/{datapoint}` under the plugin's REST namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub kind: EndpointType,
    pub identifier: String,
    pub datapoint: String,
}

impl Endpoint {
    pub fn core(identifier: &str, datapoint: &str) -> Self {
        Self {
            kind: EndpointType::Core,
            identifier: identifier.to_string(),
            datapoint: datapoint.to_string(),
        }
    }

    pub fn module(slug: ModuleSlug, datapoint: &str) -> Self {
        Self {
            kind: EndpointType::Modules,
            identifier: slug.as_str().to_string(),
            datapoint: datapoint.to_string(),
        }
    }

    /// Path segments below `/wp-json/google-site-kit/v1`
    pub fn segments(&self) -> [&str; 4] {
        [self.kind.as_str(), &self.identifier, "data", &self.datapoint]
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/data/{}", self.kind.as_str(), self.identifier, self.datapoint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A single call to the plugin's REST API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub endpoint: Endpoint,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub credentials: Option<Credentials>,
}

impl ApiRequest {
    pub fn get(endpoint: Endpoint) -> Self {
        Self {
            method: HttpMethod::Get,
            endpoint,
            query: Vec::new(),
            body: None,
            credentials: None,
        }
    }

    /// POST; the body is wrapped as `{"data": body}` on the wire
    pub fn post(endpoint: Endpoint, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            endpoint,
            query: Vec::new(),
            body: Some(body),
            credentials: None,
        }
    }

    /// GET for a report datapoint with its parameters as the query string
    pub fn report(request: &ReportRequest) -> Self {
        Self {
            query: request.query_pairs(),
            ..Self::get(Endpoint::module(request.module, &request.datapoint))
        }
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

/// `core/site/data/connection` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConnection {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub resettable: bool,
    #[serde(default)]
    pub setup_completed: bool,
    #[serde(default, rename = "ownerID")]
    pub owner_id: u64,
}

/// `core/user/data/authentication` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAuthentication {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub required_scopes: Vec<String>,
    #[serde(default)]
    pub granted_scopes: Vec<String>,
    #[serde(default)]
    pub unsatisfied_scopes: Vec<String>,
}
