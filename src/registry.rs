//! Live, mutable registries built from a stack catalog.
//!
//! The reconciler moves entries out of and back into four collections: the
//! component registry, the property tables, the per-service config
//! categories, and the review tree. Each is keyed by name so lookups match
//! the catalog's string identities without linear scans; insertion order is
//! kept so readers see catalog order until something is disabled.

use crate::catalog::{
    CategoryName, ComponentDescriptor, ComponentName, ConfigCategoryDescriptor,
    PropertyDescriptor, PropertyFile, PropertyTables, ReviewComponentEntry, ReviewServiceEntry,
    ServiceName, StackCatalog,
};
use crate::version::StackGeneration;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Property files whose entries follow their component in and out of the
/// live tables.
pub const TRACKED_PROPERTY_FILES: &[&str] = &["global_properties", "site_properties"];

/// Tracked property files as typed names.
pub fn tracked_property_files() -> impl Iterator<Item = PropertyFile> {
    TRACKED_PROPERTY_FILES.iter().map(|file| PropertyFile::from(*file))
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Components currently valid for the active stack, keyed by name.
pub struct ComponentRegistry {
    components: IndexMap<ComponentName, ComponentDescriptor>,
}

impl ComponentRegistry {
    pub fn get(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Remove a component, keeping the relative order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<ComponentDescriptor> {
        self.components.shift_remove(name)
    }

    /// Insert or replace a component; new names go to the end.
    pub fn insert(&mut self, component: ComponentDescriptor) {
        self.components
            .insert(component.component_name.clone(), component);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &ComponentName> {
        self.components.keys()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl FromIterator<ComponentDescriptor> for ComponentRegistry {
    fn from_iter<I: IntoIterator<Item = ComponentDescriptor>>(iter: I) -> Self {
        let mut registry = Self::default();
        for component in iter {
            registry.insert(component);
        }
        registry
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Live property tables, one set per stack generation.
pub struct PropertyRegistry {
    tables: PropertyTables,
}

impl PropertyRegistry {
    pub fn new(tables: PropertyTables) -> Self {
        Self { tables }
    }

    pub fn file(&self, generation: StackGeneration, file: &str) -> &[PropertyDescriptor] {
        self.tables
            .for_generation(generation)
            .get(file)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Move every property tagged with `category` out of one file.
    pub fn take_category(
        &mut self,
        generation: StackGeneration,
        file: &str,
        category: &CategoryName,
    ) -> Vec<PropertyDescriptor> {
        let Some(properties) = self.tables.for_generation_mut(generation).get_mut(file) else {
            return Vec::new();
        };
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(properties)
            .into_iter()
            .partition(|property| &property.category == category);
        *properties = kept;
        taken
    }

    /// Append properties to the end of a file, exactly as given. Returns
    /// how many were added; an empty list leaves the tables untouched.
    pub fn restore(
        &mut self,
        generation: StackGeneration,
        file: &PropertyFile,
        properties: Vec<PropertyDescriptor>,
    ) -> usize {
        if properties.is_empty() {
            return 0;
        }
        let added = properties.len();
        self.tables
            .for_generation_mut(generation)
            .entry(file.clone())
            .or_default()
            .extend(properties);
        added
    }

    pub fn tables(&self) -> &PropertyTables {
        &self.tables
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Config categories per service. Entries are located, never removed.
pub struct ConfigCategoryRegistry {
    services: IndexMap<ServiceName, Vec<ConfigCategoryDescriptor>>,
}

impl ConfigCategoryRegistry {
    pub fn categories(&self, service: &str) -> &[ConfigCategoryDescriptor] {
        self.services
            .get(service)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Find the category of `service` whose host components include
    /// `component`.
    pub fn locate(
        &self,
        service: &str,
        component: &ComponentName,
    ) -> Option<&ConfigCategoryDescriptor> {
        self.categories(service)
            .iter()
            .find(|category| category.governs(component))
    }

    pub fn insert(&mut self, service: ServiceName, category: ConfigCategoryDescriptor) {
        self.services.entry(service).or_default().push(category);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Review-screen tree: service name to its ordered component rows.
pub struct ReviewRegistry {
    services: IndexMap<ServiceName, ReviewServiceEntry>,
}

impl ReviewRegistry {
    pub fn service(&self, service: &str) -> Option<&ReviewServiceEntry> {
        self.services.get(service)
    }

    pub fn contains(&self, service: &str, component: &str) -> bool {
        self.service(service).is_some_and(|entry| {
            entry
                .service_components
                .iter()
                .any(|row| row.component_name.as_str() == component)
        })
    }

    pub fn remove(&mut self, service: &str, component: &str) -> Option<ReviewComponentEntry> {
        let entry = self.services.get_mut(service)?;
        let position = entry
            .service_components
            .iter()
            .position(|row| row.component_name.as_str() == component)?;
        Some(entry.service_components.remove(position))
    }

    /// Append a row under `service` unless the component is already listed.
    /// Returns whether the row was added.
    pub fn insert(&mut self, service: &ServiceName, row: ReviewComponentEntry) -> bool {
        if self.contains(service.as_str(), row.component_name.as_str()) {
            return false;
        }
        self.services
            .entry(service.clone())
            .or_insert_with(|| ReviewServiceEntry {
                service_name: service.clone(),
                display_name: None,
                service_components: Vec::new(),
            })
            .service_components
            .push(row);
        true
    }

    pub fn services(&self) -> impl Iterator<Item = &ReviewServiceEntry> {
        self.services.values()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// The four live registries the reconciler keeps consistent.
pub struct Registries {
    pub components: ComponentRegistry,
    pub properties: PropertyRegistry,
    pub config_categories: ConfigCategoryRegistry,
    pub review: ReviewRegistry,
}

impl Registries {
    /// Populate live registries from a catalog, taking ownership of its data.
    pub fn from_catalog(catalog: StackCatalog) -> Self {
        let components = catalog.service_components.into_iter().collect();

        let mut config_categories = ConfigCategoryRegistry::default();
        for service in catalog.service_configs {
            for category in service.config_categories {
                config_categories.insert(service.service_name.clone(), category);
            }
        }

        let mut review = ReviewRegistry::default();
        for service in catalog.review_services {
            review.services.insert(service.service_name.clone(), service);
        }

        Self {
            components,
            properties: PropertyRegistry::new(catalog.properties),
            config_categories,
            review,
        }
    }

    /// Property counts per file for a generation, for summaries and tests.
    pub fn property_counts(&self, generation: StackGeneration) -> BTreeMap<PropertyFile, usize> {
        self.properties
            .tables()
            .for_generation(generation)
            .iter()
            .map(|(file, properties)| (file.clone(), properties.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn property(name: &str, category: &str) -> PropertyDescriptor {
        serde_json::from_value(json!({"name": name, "category": category})).unwrap()
    }

    fn review_row(name: &str) -> ReviewComponentEntry {
        serde_json::from_value(json!({"component_name": name})).unwrap()
    }

    #[test]
    fn component_registry_keeps_order_after_removal() {
        let mut registry: ComponentRegistry = ["A", "B", "C"]
            .into_iter()
            .map(|name| {
                serde_json::from_value::<ComponentDescriptor>(
                    json!({"component_name": name, "service_name": "SVC"}),
                )
                .unwrap()
            })
            .collect();
        let removed = registry.remove("B").expect("B present");
        assert_eq!(removed.component_name.as_str(), "B");
        assert!(registry.remove("B").is_none());
        let names: Vec<_> = registry.names().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        registry.insert(removed);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("B"));
    }

    #[test]
    fn take_category_moves_matching_properties_only() {
        let mut tables = PropertyTables::default();
        tables.gen2.insert(
            PropertyFile::from("global_properties"),
            vec![
                property("storm_user", "Supervisor"),
                property("hdfs_user", "General"),
                property("supervisor_port", "Supervisor"),
            ],
        );
        let mut registry = PropertyRegistry::new(tables);
        let taken = registry.take_category(
            StackGeneration::Two,
            "global_properties",
            &CategoryName::from("Supervisor"),
        );
        assert_eq!(taken.len(), 2);
        let left = registry.file(StackGeneration::Two, "global_properties");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "hdfs_user");

        let missing = registry.take_category(
            StackGeneration::One,
            "global_properties",
            &CategoryName::from("Supervisor"),
        );
        assert!(missing.is_empty());
    }

    #[test]
    fn restore_appends_every_entry() {
        let mut registry = PropertyRegistry::default();
        let file = PropertyFile::from("site_properties");
        assert_eq!(registry.restore(StackGeneration::One, &file, Vec::new()), 0);
        assert!(registry.tables().gen1.is_empty());

        let added = registry.restore(
            StackGeneration::One,
            &file,
            vec![property("a", "X"), property("b", "X")],
        );
        assert_eq!(added, 2);
        let added_again = registry.restore(StackGeneration::One, &file, vec![property("a", "X")]);
        assert_eq!(added_again, 1);
        let names: Vec<_> = registry
            .file(StackGeneration::One, "site_properties")
            .iter()
            .map(|property| property.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn review_registry_moves_rows() {
        let mut review = ReviewRegistry::default();
        let storm = ServiceName::from("STORM");
        assert!(review.insert(&storm, review_row("NIMBUS")));
        assert!(review.insert(&storm, review_row("SUPERVISOR")));
        assert!(!review.insert(&storm, review_row("SUPERVISOR")));

        let row = review.remove("STORM", "SUPERVISOR").expect("row present");
        assert_eq!(row.component_name.as_str(), "SUPERVISOR");
        assert!(!review.contains("STORM", "SUPERVISOR"));
        assert!(review.remove("STORM", "SUPERVISOR").is_none());
        assert!(review.remove("HDFS", "DATANODE").is_none());
    }

    #[test]
    fn from_catalog_merges_categories_per_service() {
        let catalog: StackCatalog = serde_json::from_value(json!({
            "schema_version": "stack_catalog_v1",
            "service_components": [
                {"component_name": "NIMBUS", "service_name": "STORM"}
            ],
            "service_configs": [
                {"service_name": "STORM", "config_categories": [{"name": "General"}]},
                {"service_name": "STORM", "config_categories": [
                    {"name": "Nimbus", "host_component_names": ["NIMBUS"]}
                ]}
            ]
        }))
        .unwrap();
        let registries = Registries::from_catalog(catalog);
        let names: Vec<_> = registries
            .config_categories
            .categories("STORM")
            .iter()
            .map(|category| category.name.as_str())
            .collect();
        assert_eq!(names, vec!["General", "Nimbus"]);
        assert!(
            registries
                .config_categories
                .locate("STORM", &ComponentName::from("NIMBUS"))
                .is_some()
        );
    }

    #[test]
    fn config_categories_are_located_not_removed() {
        let mut categories = ConfigCategoryRegistry::default();
        let category: ConfigCategoryDescriptor = serde_json::from_value(json!({
            "name": "Supervisor",
            "host_component_names": ["SUPERVISOR"]
        }))
        .unwrap();
        categories.insert(ServiceName::from("STORM"), category);
        let found = categories
            .locate("STORM", &ComponentName::from("SUPERVISOR"))
            .expect("category found");
        assert_eq!(found.name.as_str(), "Supervisor");
        assert_eq!(categories.categories("STORM").len(), 1);
        assert!(
            categories
                .locate("STORM", &ComponentName::from("NIMBUS"))
                .is_none()
        );
    }
}
