//! Shared library for the stackgate reconciler.
//!
//! The crate keeps a cluster component catalog consistent with the active
//! stack version. A stack catalog (components, property tables, config
//! categories, review tree) is loaded once; each version change then disables
//! components the version excludes and restores previously disabled ones it
//! allows again. Public items here form the contract the helper binaries and
//! embedding callers depend on: catalog loading, the reconciler, version
//! classification, role queries, and settings.

pub mod catalog;
pub mod config;
pub mod reconciler;
pub mod registry;
pub mod roles;
pub mod snapshot;
pub mod version;

pub use catalog::{
    CatalogIndex, CatalogKey, CategoryName, ComponentDescriptor, ComponentName,
    ConfigCategoryDescriptor, PropertyDescriptor, PropertyFile, ReviewComponentEntry,
    ReviewServiceEntry, ServiceName, StackCatalog, load_catalog_from_path,
};
pub use config::Settings;
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use registry::{
    ComponentRegistry, ConfigCategoryRegistry, PropertyRegistry, Registries, ReviewRegistry,
    TRACKED_PROPERTY_FILES,
};
pub use roles::{ComponentAction, allowed_actions, is_ha_enabled};
pub use snapshot::{DisabledComponentSnapshot, DisabledSet, RestoreReport};
pub use version::{StackFamily, StackGeneration, StackVersion, compare_versions};

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber used by the helper binaries.
///
/// Filtering comes from `STACKGATE_LOG` (same syntax as `RUST_LOG`) and
/// defaults to `warn`. Calling this twice is harmless.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_env(config::LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Split comma- or whitespace-delimited version lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
