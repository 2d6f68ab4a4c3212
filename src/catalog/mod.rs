//! Stack catalog wiring.
//!
//! This module wraps the JSON catalog under `catalogs/stack_catalog.json` so
//! the reconciler can load a validated snapshot of every component, property
//! table, config category and review entry. Types here mirror the schema
//! fields; callers use `CatalogIndex` for validation and lookups.

pub mod identity;
pub mod index;
pub mod model;

pub use identity::{CatalogKey, CategoryName, ComponentName, PropertyFile, ServiceName};
pub use index::CatalogIndex;
pub use model::{
    ComponentDescriptor, ConfigCategoryDescriptor, PropertyDescriptor, PropertyTable,
    PropertyTables, ReviewComponentEntry, ReviewServiceEntry, ServiceConfig, StackCatalog,
};

pub use model::load_catalog_from_path;
