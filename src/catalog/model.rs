//! Deserializable representation of the stack catalog document.
//!
//! The catalog is the static data the reconciler consumes: every component
//! known across all stack versions, the property tables for each stack
//! generation, the per-service config categories, and the review tree shown
//! before install. Use `CatalogIndex` for validation; these structs are the
//! raw document surface.
//!
//! Property and review entries keep attributes they do not model in an
//! `extra` map so a disabled entry can be restored exactly as it was loaded.

use crate::catalog::identity::{
    CatalogKey, CategoryName, ComponentName, PropertyFile, ServiceName,
};
use crate::version::{StackGeneration, StackVersion};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Property lists keyed by file name, iterated in file-name order.
pub type PropertyTable = BTreeMap<PropertyFile, Vec<PropertyDescriptor>>;

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Full stack catalog as stored on disk.
pub struct StackCatalog {
    #[serde(rename = "schema_version")]
    pub key: CatalogKey,
    #[serde(default)]
    pub description: Option<String>,
    pub service_components: Vec<ComponentDescriptor>,
    #[serde(default)]
    pub properties: PropertyTables,
    #[serde(default)]
    pub service_configs: Vec<ServiceConfig>,
    #[serde(default)]
    pub review_services: Vec<ReviewServiceEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// One property table per stack generation.
pub struct PropertyTables {
    #[serde(default)]
    pub gen1: PropertyTable,
    #[serde(default)]
    pub gen2: PropertyTable,
}

impl PropertyTables {
    pub fn for_generation(&self, generation: StackGeneration) -> &PropertyTable {
        match generation {
            StackGeneration::One => &self.gen1,
            StackGeneration::Two => &self.gen2,
        }
    }

    pub fn for_generation_mut(&mut self, generation: StackGeneration) -> &mut PropertyTable {
        match generation {
            StackGeneration::One => &mut self.gen1,
            StackGeneration::Two => &mut self.gen2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// A deployable component and the stack versions it is valid for.
pub struct ComponentDescriptor {
    pub component_name: ComponentName,
    pub service_name: ServiceName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_master: bool,
    #[serde(default)]
    pub is_client: bool,
    /// Absent or empty means the component exists in every stack version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_versions: Option<Vec<String>>,
}

impl ComponentDescriptor {
    pub fn is_version_restricted(&self) -> bool {
        self.stack_versions
            .as_ref()
            .is_some_and(|versions| !versions.is_empty())
    }

    /// Whether this component belongs in a cluster running `version`.
    pub fn allows(&self, version: &StackVersion) -> bool {
        match &self.stack_versions {
            Some(versions) if !versions.is_empty() => version.matches_any(versions),
            _ => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// A single configuration property tagged with its config category.
pub struct PropertyDescriptor {
    pub name: String,
    pub category: CategoryName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<ServiceName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Config category of a service, optionally tied to host components.
pub struct ConfigCategoryDescriptor {
    pub name: CategoryName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_component_names: Option<Vec<ComponentName>>,
}

impl ConfigCategoryDescriptor {
    pub fn governs(&self, component: &ComponentName) -> bool {
        self.host_component_names
            .as_ref()
            .is_some_and(|names| names.contains(component))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Config categories declared for one service.
pub struct ServiceConfig {
    pub service_name: ServiceName,
    #[serde(default)]
    pub config_categories: Vec<ConfigCategoryDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Component summary row on the pre-install review screen.
pub struct ReviewComponentEntry {
    pub component_name: ComponentName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Review screen section for one service.
pub struct ReviewServiceEntry {
    pub service_name: ServiceName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub service_components: Vec<ReviewComponentEntry>,
}

/// Read and parse a stack catalog from disk without additional validation.
pub fn load_catalog_from_path(path: &Path) -> Result<StackCatalog> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let catalog: StackCatalog =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(catalog)
}
