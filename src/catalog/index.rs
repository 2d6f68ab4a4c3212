//! Validated, indexed view of a stack catalog.
//!
//! The index enforces the expected catalog schema version and provides fast
//! lookup by component name. It is strict about duplicates because the
//! reconciler keys every registry by name; two entries with the same name
//! would make restoration ambiguous.

use crate::catalog::load_catalog_from_path;
use crate::catalog::{CatalogKey, ComponentDescriptor, ComponentName, StackCatalog};
use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// Only one catalog layout exists; reject anything else rather than guess at
// field meanings.
pub const CATALOG_SCHEMA_VERSION: &str = "stack_catalog_v1";

const CATALOG_SCHEMA: &str = include_str!("../../schema/stack_catalog.schema.json");

#[derive(Debug)]
/// Stack catalog plus a derived index keyed by component name.
pub struct CatalogIndex {
    catalog: StackCatalog,
    by_name: BTreeMap<ComponentName, usize>,
}

impl CatalogIndex {
    /// Load and validate the catalog from disk.
    ///
    /// Validates the document against the bundled JSON Schema before the
    /// semantic checks in `from_catalog`.
    pub fn load(path: &Path) -> Result<Self> {
        validate_against_schema(path)?;
        let catalog =
            load_catalog_from_path(path).with_context(|| format!("loading {}", path.display()))?;
        Self::from_catalog(catalog).with_context(|| format!("validating {}", path.display()))
    }

    /// Validate an in-memory catalog and build the name index.
    pub fn from_catalog(catalog: StackCatalog) -> Result<Self> {
        validate_schema_version(&catalog.key)?;
        let by_name = build_index(&catalog)?;
        validate_properties(&catalog)?;
        validate_review_services(&catalog)?;
        warn_on_unknown_category_components(&catalog, &by_name);
        Ok(Self { catalog, by_name })
    }

    pub fn key(&self) -> &CatalogKey {
        &self.catalog.key
    }

    /// Resolve a component by name.
    pub fn component(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.by_name
            .get(name)
            .and_then(|idx| self.catalog.service_components.get(*idx))
    }

    /// Component names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &ComponentName> {
        self.catalog
            .service_components
            .iter()
            .map(|component| &component.component_name)
    }

    pub fn catalog(&self) -> &StackCatalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> StackCatalog {
        self.catalog
    }
}

fn validate_schema_version(key: &CatalogKey) -> Result<()> {
    if key.0 != CATALOG_SCHEMA_VERSION {
        bail!(
            "schema_version '{}' not supported; expected {}",
            key.0,
            CATALOG_SCHEMA_VERSION
        );
    }
    Ok(())
}

fn build_index(catalog: &StackCatalog) -> Result<BTreeMap<ComponentName, usize>> {
    if catalog.service_components.is_empty() {
        bail!("catalog contains no service components");
    }

    let mut map = BTreeMap::new();
    for (idx, component) in catalog.service_components.iter().enumerate() {
        if component.component_name.0.trim().is_empty() {
            bail!("encountered component with no name");
        }
        if component.service_name.0.trim().is_empty() {
            bail!(
                "component {} has no service_name",
                component.component_name
            );
        }
        if map.insert(component.component_name.clone(), idx).is_some() {
            bail!("duplicate component name {}", component.component_name);
        }
    }
    Ok(map)
}

fn validate_properties(catalog: &StackCatalog) -> Result<()> {
    let tables = [
        ("gen1", &catalog.properties.gen1),
        ("gen2", &catalog.properties.gen2),
    ];
    for (generation, table) in tables {
        for (file, properties) in table {
            for property in properties {
                if property.name.trim().is_empty() {
                    bail!("{generation}/{file} contains a property with no name");
                }
                if property.category.0.trim().is_empty() {
                    bail!(
                        "{generation}/{file} property {} has no category",
                        property.name
                    );
                }
            }
        }
    }
    Ok(())
}

fn validate_review_services(catalog: &StackCatalog) -> Result<()> {
    let mut services = BTreeSet::new();
    for service in &catalog.review_services {
        if !services.insert(&service.service_name) {
            bail!("duplicate review service {}", service.service_name);
        }
        let mut seen = BTreeSet::new();
        for entry in &service.service_components {
            if !seen.insert(&entry.component_name) {
                bail!(
                    "review service {} lists {} more than once",
                    service.service_name,
                    entry.component_name
                );
            }
        }
    }
    Ok(())
}

fn warn_on_unknown_category_components(
    catalog: &StackCatalog,
    by_name: &BTreeMap<ComponentName, usize>,
) {
    for service in &catalog.service_configs {
        for category in &service.config_categories {
            let Some(names) = &category.host_component_names else {
                continue;
            };
            for name in names.iter().filter(|name| !by_name.contains_key(*name)) {
                tracing::warn!(
                    service = %service.service_name,
                    category = %category.name,
                    component = %name,
                    "config category references a component missing from the catalog"
                );
            }
        }
    }
}

fn validate_against_schema(catalog_path: &Path) -> Result<()> {
    let catalog_file = File::open(catalog_path)
        .with_context(|| format!("opening catalog {}", catalog_path.display()))?;
    let catalog_value: Value = serde_json::from_reader(BufReader::new(catalog_file))
        .with_context(|| format!("parsing catalog {}", catalog_path.display()))?;

    let schema_value: Value =
        serde_json::from_str(CATALOG_SCHEMA).context("parsing bundled catalog schema")?;
    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|err| anyhow!("compiling bundled catalog schema: {err}"))?;

    if let Err(errors) = compiled.validate(&catalog_value) {
        let details = errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "stack catalog {} failed schema validation:\n{}",
            catalog_path.display(),
            details
        );
    }
    Ok(())
}
