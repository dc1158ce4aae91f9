//! Stores and the registry composing them

pub mod module_store;
pub mod core_stores;
pub mod registry;

#[cfg(test)]
mod tests;

pub use module_store::ModuleStore;
pub use core_stores::{CoreSiteStore, CoreUiStore, CoreUserStore};
pub use registry::Registry;
