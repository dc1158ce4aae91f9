//! Datastore library for the Site Kit dashboard
//!
//! This library coordinates report fetches against the plugin's REST API:
//! per-module stores with a connection state machine and settings, a shared
//! report cache, request deduplication, and a registry composing them.

pub mod error;
pub mod types;
pub mod traits;
pub mod state;
pub mod config;
pub mod services;
pub mod core;

// Re-export main types
pub use error::{DatastoreError, DatastoreResult};
pub use types::*;
pub use traits::*;
pub use config::ClientConfig;
pub use services::{Dispatch, RealApiFetcher, ReportCache, RequestDeduplicator};
pub use crate::core::{CoreSiteStore, CoreUiStore, CoreUserStore, ModuleStore, Registry};
