//! Environment-driven settings.
//!
//! Binaries and embedding callers read the same keys: an explicit catalog
//! path, a data root to look for `catalogs/stack_catalog.json` under, the
//! default stack version used before any version is set, and the flag that
//! suppresses reconciliation entirely.

use anyhow::{Result, bail};
use std::env;
use std::path::{Path, PathBuf};

pub const CATALOG_ENV: &str = "STACKGATE_CATALOG";
pub const ROOT_ENV: &str = "STACKGATE_ROOT";
pub const DEFAULT_STACK_ENV: &str = "STACKGATE_DEFAULT_STACK";
pub const SKIP_RECONCILE_ENV: &str = "STACKGATE_SKIP_RECONCILE";
pub const LOG_ENV: &str = "STACKGATE_LOG";

pub const DEFAULT_STACK_VERSION: &str = "HDP-2.0";
const CATALOG_RELATIVE_PATH: &str = "catalogs/stack_catalog.json";

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub catalog_path: Option<PathBuf>,
    pub data_root: Option<PathBuf>,
    pub default_stack_version: String,
    pub skip_reconcile: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: None,
            data_root: None,
            default_stack_version: DEFAULT_STACK_VERSION.to_string(),
            skip_reconcile: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    ///
    /// Empty values count as unset so `FOO= cmd` behaves like no override.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            catalog_path: non_empty(CATALOG_ENV).map(PathBuf::from),
            data_root: non_empty(ROOT_ENV).map(PathBuf::from),
            default_stack_version: non_empty(DEFAULT_STACK_ENV)
                .unwrap_or_else(|| DEFAULT_STACK_VERSION.to_string()),
            skip_reconcile: non_empty(SKIP_RECONCILE_ENV).is_some_and(|value| value != "0"),
        }
    }

    /// Locate the stack catalog.
    ///
    /// Search order: the explicit catalog path, then `<root>/catalogs/` for
    /// the configured root, then the build-time root hint.
    pub fn resolve_catalog_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.catalog_path {
            if path.is_file() {
                return Ok(path.clone());
            }
            bail!("{CATALOG_ENV} points at {}, which is not a file", path.display());
        }

        if let Some(root) = &self.data_root {
            if let Some(path) = catalog_under(root) {
                return Ok(path);
            }
        }

        if let Some(hint) = option_env!("STACKGATE_ROOT_HINT") {
            if let Some(path) = catalog_under(Path::new(hint)) {
                return Ok(path);
            }
        }

        bail!(
            "Unable to locate {CATALOG_RELATIVE_PATH}. Set {CATALOG_ENV} to a catalog file or {ROOT_ENV} to the data root."
        )
    }
}

fn catalog_under(root: &Path) -> Option<PathBuf> {
    let candidate = root.join(CATALOG_RELATIVE_PATH);
    candidate.is_file().then_some(candidate)
}
