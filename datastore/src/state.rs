//! Module store state management

use std::sync::Arc;
use serde_json::Value;
use tokio::sync::RwLock;

use shared::ModuleSlug;
use crate::types::{ConnectionState, Credentials, ModuleSettings};

/// Per-module state. Report data lives in the registry's shared cache.
#[derive(Debug, Clone)]
pub struct ModuleState {
    pub slug: ModuleSlug,
    pub connection: ConnectionState,
    pub credentials: Option<Credentials>,
    /// Current settings, including unsaved local edits
    pub settings: ModuleSettings,
    /// Settings as last loaded from or saved to the server
    pub saved_settings: Option<ModuleSettings>,
}

impl ModuleState {
    pub fn new(slug: ModuleSlug) -> Self {
        Self {
            slug,
            connection: ConnectionState::Disconnected,
            credentials: None,
            settings: ModuleSettings::new(),
            saved_settings: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Merge `partial` into the current settings, key by key
    pub fn merge_settings(&mut self, partial: ModuleSettings) {
        for (name, value) in partial {
            self.settings.insert(name, value);
        }
    }

    /// Whether local edits differ from the saved settings
    pub fn have_settings_changed(&self) -> bool {
        match &self.saved_settings {
            Some(saved) => saved != &self.settings,
            None => !self.settings.is_empty(),
        }
    }

    /// Record `settings` as both current and saved
    pub fn receive_settings(&mut self, settings: ModuleSettings) {
        self.saved_settings = Some(settings.clone());
        self.settings = settings;
    }

    pub fn setting(&self, name: &str) -> Option<&Value> {
        self.settings.get(name)
    }
}

/// Shared module state wrapper
pub type SharedModuleState = Arc<RwLock<ModuleState>>;

/// Create new shared module state
pub fn create_shared_state(slug: ModuleSlug) -> SharedModuleState {
    Arc::new(RwLock::new(ModuleState::new(slug)))
}
