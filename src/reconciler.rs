//! Stack-version component reconciliation.
//!
//! Every time the active stack version changes, components whose catalog
//! entry restricts them to other versions are pulled out of the live
//! registries and archived, and archived components that are valid again are
//! put back. One call to `set_stack_version` runs both passes to completion;
//! callers sharing a reconciler across threads serialize on a single lock
//! around it.

use crate::catalog::{CatalogIndex, ComponentName, StackCatalog};
use crate::config::Settings;
use crate::registry::Registries;
use crate::snapshot::{DisabledComponentSnapshot, DisabledSet};
use crate::version::{StackGeneration, StackVersion};
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
/// What a single reconciliation changed.
pub struct ReconcileOutcome {
    pub version: String,
    pub number: String,
    pub generation: StackGeneration,
    /// True when the suppression flag short-circuited the run.
    pub skipped: bool,
    pub disabled: Vec<ComponentName>,
    pub enabled: Vec<ComponentName>,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.disabled.is_empty() && self.enabled.is_empty()
    }
}

#[derive(Debug)]
/// Owns the live registries and the disabled set for one catalog.
pub struct Reconciler {
    registries: Registries,
    disabled: DisabledSet,
    current: Option<StackVersion>,
    default_version: StackVersion,
    suppressed: bool,
}

impl Reconciler {
    /// Start with every catalog entry live and nothing disabled.
    ///
    /// No reconciliation runs until a version is set.
    pub fn new(catalog: StackCatalog) -> Self {
        Self {
            registries: Registries::from_catalog(catalog),
            disabled: DisabledSet::default(),
            current: None,
            default_version: StackVersion::parse(crate::config::DEFAULT_STACK_VERSION),
            suppressed: false,
        }
    }

    pub fn from_index(index: CatalogIndex) -> Self {
        Self::new(index.into_catalog())
    }

    /// Load the catalog named by `settings` and apply its defaults.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let path = settings.resolve_catalog_path()?;
        let index = CatalogIndex::load(&path)
            .with_context(|| format!("loading stack catalog {}", path.display()))?;
        tracing::info!(
            catalog = %path.display(),
            components = index.names().count(),
            "loaded stack catalog"
        );
        let mut reconciler =
            Self::from_index(index).with_default_version(&settings.default_stack_version);
        reconciler.set_suppressed(settings.skip_reconcile);
        Ok(reconciler)
    }

    pub fn with_default_version(mut self, raw: &str) -> Self {
        self.default_version = StackVersion::parse(raw);
        self
    }

    /// Skip reconciliation on version changes. The version is still recorded.
    pub fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Record a new stack version and reconcile the registries against it.
    pub fn set_stack_version(&mut self, raw: &str) -> ReconcileOutcome {
        self.current = Some(StackVersion::parse(raw));
        self.reconcile()
    }

    /// Reconcile against the current version (or the default when unset).
    pub fn reconcile(&mut self) -> ReconcileOutcome {
        let version = self.effective_version().clone();
        let mut outcome = ReconcileOutcome {
            version: version.raw().to_string(),
            number: version.number().to_string(),
            generation: version.generation(),
            skipped: false,
            disabled: Vec::new(),
            enabled: Vec::new(),
        };

        if self.suppressed {
            tracing::debug!(version = %version, "reconciliation suppressed");
            outcome.skipped = true;
            return outcome;
        }

        let newly_disabled = self.disable_pass(&version);
        outcome.enabled = self.enable_pass(&version);

        for snapshot in newly_disabled {
            let name = snapshot.component_name.clone();
            match self.disabled.insert(snapshot) {
                Ok(()) => outcome.disabled.push(name),
                Err(rejected) => {
                    // Registries are only reachable through `self`, so a
                    // second snapshot means a bug; keep its artifacts live.
                    tracing::warn!(component = %name, "component already disabled");
                    rejected.restore(&mut self.registries);
                }
            }
        }

        tracing::info!(
            version = %version,
            generation = %outcome.generation,
            disabled = outcome.disabled.len(),
            enabled = outcome.enabled.len(),
            total_disabled = self.disabled.len(),
            "reconciled stack components"
        );
        outcome
    }

    fn disable_pass(&mut self, version: &StackVersion) -> Vec<DisabledComponentSnapshot> {
        let excluded: Vec<ComponentName> = self
            .registries
            .components
            .iter()
            .filter(|component| component.is_version_restricted() && !component.allows(version))
            .map(|component| component.component_name.clone())
            .collect();

        let generation = version.generation();
        excluded
            .iter()
            .filter_map(|name| {
                let snapshot = DisabledComponentSnapshot::capture(
                    &mut self.registries,
                    name.as_str(),
                    generation,
                );
                if snapshot.is_some() {
                    tracing::debug!(component = %name, version = %version, "disabled component");
                }
                snapshot
            })
            .collect()
    }

    fn enable_pass(&mut self, version: &StackVersion) -> Vec<ComponentName> {
        self.disabled
            .take_allowed(version)
            .into_iter()
            .map(|snapshot| {
                let name = snapshot.component_name.clone();
                snapshot.restore(&mut self.registries);
                tracing::debug!(component = %name, version = %version, "enabled component");
                name
            })
            .collect()
    }

    pub fn current_version(&self) -> Option<&StackVersion> {
        self.current.as_ref()
    }

    /// The current version, falling back to the configured default.
    pub fn effective_version(&self) -> &StackVersion {
        self.current.as_ref().unwrap_or(&self.default_version)
    }

    pub fn is_generation_two(&self) -> bool {
        self.effective_version().is_generation_two()
    }

    pub fn stack_version_url(&self) -> String {
        self.effective_version().stack_version_url()
    }

    pub fn stack2_version_url(&self) -> String {
        self.effective_version().stack2_version_url()
    }

    /// Whether a component is part of the active stack.
    pub fn is_component_enabled(&self, name: &str) -> bool {
        self.registries.components.contains(name)
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn disabled(&self) -> &DisabledSet {
        &self.disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reconciler() -> Reconciler {
        let catalog: StackCatalog = serde_json::from_value(json!({
            "schema_version": "stack_catalog_v1",
            "service_components": [
                {"component_name": "NAMENODE", "service_name": "HDFS", "is_master": true},
                {"component_name": "JOBTRACKER", "service_name": "MAPREDUCE", "is_master": true, "stack_versions": ["1.3"]},
                {"component_name": "RESOURCEMANAGER", "service_name": "YARN", "is_master": true, "stack_versions": ["2.0", "2.1"]}
            ]
        }))
        .unwrap();
        Reconciler::new(catalog)
    }

    #[test]
    fn disables_and_reenables_across_versions() {
        let mut reconciler = reconciler();
        let outcome = reconciler.set_stack_version("HDP-2.0");
        assert_eq!(outcome.disabled, vec![ComponentName::from("JOBTRACKER")]);
        assert!(outcome.enabled.is_empty());
        assert_eq!(outcome.generation, StackGeneration::Two);
        assert!(!reconciler.is_component_enabled("JOBTRACKER"));
        assert!(reconciler.is_component_enabled("RESOURCEMANAGER"));

        let outcome = reconciler.set_stack_version("HDP-1.3");
        assert_eq!(outcome.disabled, vec![ComponentName::from("RESOURCEMANAGER")]);
        assert_eq!(outcome.enabled, vec![ComponentName::from("JOBTRACKER")]);
        assert!(reconciler.is_component_enabled("JOBTRACKER"));
        assert!(reconciler.disabled().contains("RESOURCEMANAGER"));
        assert_eq!(reconciler.disabled().len(), 1);
    }

    #[test]
    fn repeating_a_version_changes_nothing() {
        let mut reconciler = reconciler();
        reconciler.set_stack_version("HDP-2.1");
        let disabled_once = reconciler.disabled().clone();
        let outcome = reconciler.set_stack_version("HDP-2.1");
        assert!(outcome.is_noop());
        assert_eq!(reconciler.disabled(), &disabled_once);
    }

    #[test]
    fn suppression_records_version_without_reconciling() {
        let mut reconciler = reconciler();
        reconciler.set_suppressed(true);
        let outcome = reconciler.set_stack_version("HDP-2.0");
        assert!(outcome.skipped);
        assert!(outcome.is_noop());
        assert!(reconciler.is_component_enabled("JOBTRACKER"));
        assert_eq!(reconciler.current_version().map(|v| v.number()), Some("2.0"));
    }

    #[test]
    fn urls_fall_back_to_default_version() {
        let reconciler = reconciler().with_default_version("HDPLocal-1.3");
        assert!(reconciler.current_version().is_none());
        assert_eq!(reconciler.stack_version_url(), "/stacks/HDPLocal/version/1.3");
        assert_eq!(
            reconciler.stack2_version_url(),
            "/stacks2/HDPLocal/versions/1.3"
        );
        assert!(!reconciler.is_generation_two());
    }

    #[test]
    fn outcome_serializes_names() {
        let mut reconciler = reconciler();
        let outcome = reconciler.set_stack_version("HDP-2.0");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["version"], "HDP-2.0");
        assert_eq!(value["generation"], "gen2");
        assert_eq!(value["disabled"], json!(["JOBTRACKER"]));
    }
}
