//! Datastore services implementations

pub mod report_cache;
pub mod deduplicator;
pub mod rest_client;

#[cfg(test)]
pub mod tests;

pub use report_cache::*;
pub use deduplicator::*;
pub use rest_client::*;
