//! Datastore error types

use thiserror::Error;
use shared::{ApiFailure, ModuleSlug, SharedError};

/// Result type for datastore operations
pub type DatastoreResult<T> = Result<T, DatastoreError>;

/// Datastore error types
///
/// Report fetch failures are not errors at this level: they are returned as
/// `ReportResult::Error`. These variants cover caller bugs and actions that
/// cannot complete.
#[derive(Error, Debug)]
pub enum DatastoreError {
    #[error(transparent)]
    Shared(#[from] SharedError),

    #[error("Module {module} is not registered")]
    ModuleNotRegistered { module: ModuleSlug },

    #[error("Request for {requested} sent to the {store} store")]
    ModuleMismatch { store: ModuleSlug, requested: ModuleSlug },

    #[error("Module {module} is already connecting")]
    ConnectionInProgress { module: ModuleSlug },

    #[error("Request failed: {0}")]
    Request(#[from] ApiFailure),

    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}
