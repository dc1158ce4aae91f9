//! Shared types for the Site Kit datastore
//!
//! Contains the types every store agrees on: module identifiers, report
//! requests and results, the REST failure taxonomy, date ranges and the
//! logging setup.

pub mod types;
pub mod errors;
pub mod date_range;
pub mod logging;

pub use types::*;
pub use errors::*;
pub use date_range::{DateRange, RangeDates};
