//! Component role and action queries.
//!
//! Role lists are derived from the live component registry, so a component
//! disabled for the current stack drops out of `masters`/`slaves`/`clients`
//! until it is enabled again. Action lists are fixed per component name.

use crate::catalog::ComponentName;
use crate::registry::ComponentRegistry;
use crate::version::StackVersion;
use std::collections::BTreeSet;

// Dashboards run alongside slaves but are not host-level slave components.
const SLAVE_EXCLUSIONS: &[&str] = &["DASHBOARD"];

const SECONDARY_NAMENODE: &str = "SECONDARY_NAMENODE";

/// Operator actions gated per component.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ComponentAction {
    Reassign,
    Restart,
    Delete,
    RollingRestart,
    Decommission,
    AddToHost,
}

impl ComponentAction {
    pub const ALL: [ComponentAction; 6] = [
        ComponentAction::Reassign,
        ComponentAction::Restart,
        ComponentAction::Delete,
        ComponentAction::RollingRestart,
        ComponentAction::Decommission,
        ComponentAction::AddToHost,
    ];

    /// Component names the action applies to.
    pub fn components(self) -> &'static [&'static str] {
        match self {
            ComponentAction::Reassign => {
                &["NAMENODE", "SECONDARY_NAMENODE", "JOBTRACKER", "RESOURCEMANAGER"]
            }
            ComponentAction::Restart => &["APP_TIMELINE_SERVER"],
            ComponentAction::Delete => &[
                "SUPERVISOR",
                "HBASE_MASTER",
                "DATANODE",
                "TASKTRACKER",
                "NODEMANAGER",
                "HBASE_REGIONSERVER",
            ],
            ComponentAction::RollingRestart => &[
                "DATANODE",
                "TASKTRACKER",
                "NODEMANAGER",
                "HBASE_REGIONSERVER",
                "SUPERVISOR",
            ],
            ComponentAction::Decommission => {
                &["DATANODE", "TASKTRACKER", "NODEMANAGER", "HBASE_REGIONSERVER"]
            }
            ComponentAction::AddToHost => &[
                "DATANODE",
                "TASKTRACKER",
                "NODEMANAGER",
                "HBASE_REGIONSERVER",
                "HBASE_MASTER",
                "ZOOKEEPER_SERVER",
                "SUPERVISOR",
            ],
        }
    }

    pub fn allows(self, component: &str) -> bool {
        self.components().contains(&component)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentAction::Reassign => "reassignable",
            ComponentAction::Restart => "restartable",
            ComponentAction::Delete => "deletable",
            ComponentAction::RollingRestart => "rolling_restart_allowed",
            ComponentAction::Decommission => "decommission_allowed",
            ComponentAction::AddToHost => "addable_to_host",
        }
    }
}

/// Actions available for `component`, in declaration order.
pub fn allowed_actions(component: &str) -> Vec<ComponentAction> {
    ComponentAction::ALL
        .into_iter()
        .filter(|action| action.allows(component))
        .collect()
}

pub fn masters(registry: &ComponentRegistry) -> Vec<ComponentName> {
    unique_names(registry, |component| component.is_master)
}

pub fn clients(registry: &ComponentRegistry) -> Vec<ComponentName> {
    unique_names(registry, |component| component.is_client)
}

/// Components that are neither masters nor clients.
pub fn slaves(registry: &ComponentRegistry) -> Vec<ComponentName> {
    unique_names(registry, |component| {
        !component.is_master
            && !component.is_client
            && !SLAVE_EXCLUSIONS.contains(&component.component_name.as_str())
    })
}

/// HA is only possible on generation-two stacks, and is in effect once the
/// secondary namenode is gone from the installed host components.
pub fn is_ha_enabled<'a, I>(version: &StackVersion, installed_host_components: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    if !version.is_generation_two() {
        return false;
    }
    !installed_host_components
        .into_iter()
        .any(|name| name == SECONDARY_NAMENODE)
}

fn unique_names<F>(registry: &ComponentRegistry, keep: F) -> Vec<ComponentName>
where
    F: Fn(&crate::catalog::ComponentDescriptor) -> bool,
{
    let mut seen = BTreeSet::new();
    registry
        .iter()
        .filter(|component| keep(component))
        .filter(|component| seen.insert(component.component_name.clone()))
        .map(|component| component.component_name.clone())
        .collect()
}
