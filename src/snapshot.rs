//! Archived state of disabled components.
//!
//! A snapshot holds everything a component owned in the live registries at
//! the moment it was disabled: its descriptor, the properties of its config
//! category from both generations' tables, its review row, and the category
//! it was resolved through. Restoring a snapshot puts each artifact back where
//! it came from, so gen1 properties return to gen1 tables and gen2 properties
//! to gen2 tables whatever stack is active at restore time.

use crate::catalog::{
    CategoryName, ComponentDescriptor, ComponentName, ConfigCategoryDescriptor, PropertyTables,
    ReviewComponentEntry,
};
use crate::registry::{Registries, tracked_property_files};
use crate::version::{StackGeneration, StackVersion};
use indexmap::IndexMap;
use serde::Serialize;

const GENERATIONS: [StackGeneration; 2] = [StackGeneration::One, StackGeneration::Two];

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Everything removed from the live registries for one disabled component.
pub struct DisabledComponentSnapshot {
    pub component_name: ComponentName,
    /// Generation of the stack that was active when the component was disabled.
    pub generation: StackGeneration,
    /// Properties taken from each generation's tables; only non-empty files
    /// are kept.
    pub properties: PropertyTables,
    pub review_entry: Option<ReviewComponentEntry>,
    /// Category located through `host_component_names`; it stays registered.
    pub config_category: Option<ConfigCategoryDescriptor>,
    pub component: ComponentDescriptor,
}

/// Counts of artifacts put back by `DisabledComponentSnapshot::restore`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RestoreReport {
    pub properties: usize,
    pub review_entry: bool,
}

impl DisabledComponentSnapshot {
    /// Pull a component and its artifacts out of the live registries.
    ///
    /// Returns `None` when the component is not registered; that is the
    /// steady state for anything already disabled. A missing config category
    /// or review row is not an error: nothing is taken for it.
    pub fn capture(
        registries: &mut Registries,
        name: &str,
        generation: StackGeneration,
    ) -> Option<Self> {
        let component = registries.components.remove(name)?;
        let component_name = component.component_name.clone();

        let config_category = registries
            .config_categories
            .locate(component.service_name.as_str(), &component_name)
            .cloned();

        let properties = match &config_category {
            Some(category) => take_properties(registries, &component_name, &category.name),
            None => PropertyTables::default(),
        };

        let review_entry = registries
            .review
            .remove(component.service_name.as_str(), component_name.as_str());
        if review_entry.is_none() {
            tracing::debug!(
                component = %component_name,
                service = %component.service_name,
                "no review entry to extract"
            );
        }

        Some(Self {
            component_name,
            generation,
            properties,
            review_entry,
            config_category,
            component,
        })
    }

    /// Put every captured artifact back into the live registries.
    pub fn restore(self, registries: &mut Registries) -> RestoreReport {
        let mut report = RestoreReport::default();
        let service = self.component.service_name.clone();

        registries.components.insert(self.component);

        let PropertyTables { gen1, gen2 } = self.properties;
        for (generation, table) in GENERATIONS.into_iter().zip([gen1, gen2]) {
            for (file, properties) in table {
                report.properties += registries
                    .properties
                    .restore(generation, &file, properties);
            }
        }

        if let Some(row) = self.review_entry {
            report.review_entry = registries.review.insert(&service, row);
        }

        tracing::debug!(
            component = %self.component_name,
            properties = report.properties,
            review_entry = report.review_entry,
            "restored component"
        );
        report
    }

    pub fn is_allowed_for(&self, version: &StackVersion) -> bool {
        self.component.allows(version)
    }

    /// Total number of archived properties across both generations.
    pub fn property_count(&self) -> usize {
        GENERATIONS
            .into_iter()
            .flat_map(|generation| self.properties.for_generation(generation).values())
            .map(Vec::len)
            .sum()
    }
}

fn take_properties(
    registries: &mut Registries,
    component: &ComponentName,
    category: &CategoryName,
) -> PropertyTables {
    let mut taken_tables = PropertyTables::default();
    for generation in GENERATIONS {
        for file in tracked_property_files() {
            let taken = registries
                .properties
                .take_category(generation, file.as_str(), category);
            tracing::debug!(
                component = %component,
                generation = %generation,
                file = %file,
                count = taken.len(),
                "extracted properties"
            );
            if !taken.is_empty() {
                taken_tables.for_generation_mut(generation).insert(file, taken);
            }
        }
    }
    taken_tables
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Currently disabled components, unique by name, in disable order.
pub struct DisabledSet {
    snapshots: IndexMap<ComponentName, DisabledComponentSnapshot>,
}

impl DisabledSet {
    /// Add a snapshot. A snapshot for a name that is already disabled is
    /// handed back untouched.
    pub fn insert(
        &mut self,
        snapshot: DisabledComponentSnapshot,
    ) -> Result<(), DisabledComponentSnapshot> {
        if self.snapshots.contains_key(&snapshot.component_name) {
            return Err(snapshot);
        }
        self.snapshots
            .insert(snapshot.component_name.clone(), snapshot);
        Ok(())
    }

    /// Remove and return every snapshot whose component is valid for
    /// `version`, preserving order among the rest.
    pub fn take_allowed(&mut self, version: &StackVersion) -> Vec<DisabledComponentSnapshot> {
        let names: Vec<ComponentName> = self
            .snapshots
            .values()
            .filter(|snapshot| snapshot.is_allowed_for(version))
            .map(|snapshot| snapshot.component_name.clone())
            .collect();
        names
            .iter()
            .filter_map(|name| self.snapshots.shift_remove(name))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&DisabledComponentSnapshot> {
        self.snapshots.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshots.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &ComponentName> {
        self.snapshots.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisabledComponentSnapshot> {
        self.snapshots.values()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
