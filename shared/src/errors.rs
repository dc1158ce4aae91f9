//! Shared error types for the Site Kit datastore

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Unknown module: {slug}")]
    UnknownModule { slug: String },

    #[error("Invalid date range: {input}")]
    InvalidDateRange { input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
