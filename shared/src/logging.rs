//! Shared logging utilities for consistent tracing across all stores

use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Default filter directives for a given base level
pub fn filter_directives(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    format!("datastore={base_level},sitekit_report={base_level},shared={base_level},reqwest=warn,hyper=warn")
}

/// Initialize tracing subscriber writing to stdout.
///
/// `RUST_LOG` overrides the computed directives when set.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)));

    // try_init: tests and embedders may have installed a subscriber already
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for store-aware info logging
#[macro_export]
macro_rules! store_info {
    ($store:expr, $($arg:tt)*) => {
        tracing::info!(
            store = %$store,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for store-aware warning logging
#[macro_export]
macro_rules! store_warn {
    ($store:expr, $($arg:tt)*) => {
        tracing::warn!(
            store = %$store,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for store-aware error logging
#[macro_export]
macro_rules! store_error {
    ($store:expr, $($arg:tt)*) => {
        tracing::error!(
            store = %$store,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for store-aware debug logging
#[macro_export]
macro_rules! store_debug {
    ($store:expr, $($arg:tt)*) => {
        tracing::debug!(
            store = %$store,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(component: &str, details: &str) {
    info!(
        component = component,
        timestamp = format_timestamp(),
        "Starting {}",
        details
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(component: &str, context: &str, error: &dyn std::fmt::Display) {
    error!(
        component = component,
        timestamp = format_timestamp(),
        error = %error,
        "{} failed: {}",
        context,
        error
    );
}
