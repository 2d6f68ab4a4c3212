use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use stackgate::{Registries, StackCatalog, StackGeneration};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::NamedTempFile;

/// Catalog used across the suite: SUPERVISOR is limited to HDP-1.3,
/// RESOURCEMANAGER to the 2.x line, everything else is unrestricted.
pub fn fixture_catalog_value() -> Value {
    json!({
        "schema_version": "stack_catalog_v1",
        "service_components": [
            {"component_name": "NAMENODE", "service_name": "HDFS", "is_master": true},
            {"component_name": "DATANODE", "service_name": "HDFS"},
            {"component_name": "HDFS_CLIENT", "service_name": "HDFS", "is_client": true},
            {"component_name": "NIMBUS", "service_name": "STORM", "is_master": true},
            {"component_name": "SUPERVISOR", "service_name": "STORM", "stack_versions": ["HDP-1.3"]},
            {"component_name": "RESOURCEMANAGER", "service_name": "YARN", "is_master": true, "stack_versions": ["2.0", "2.1"]}
        ],
        "properties": {
            "gen1": {
                "global_properties": [
                    {"name": "namenode_heapsize", "category": "NameNode"},
                    {"name": "supervisor_childopts", "category": "Supervisor", "default_value": "-Xmx256m"}
                ],
                "site_properties": [
                    {"name": "supervisor.slots.ports", "category": "Supervisor", "default_value": "[6700]"}
                ]
            },
            "gen2": {
                "global_properties": [
                    {"name": "namenode_heapsize", "category": "NameNode"},
                    {"name": "supervisor_log_dir", "category": "Supervisor", "is_overridable": false},
                    {"name": "rm_heapsize", "category": "ResourceManager"}
                ],
                "site_properties": [
                    {"name": "supervisor.slots.ports", "category": "Supervisor", "default_value": "[6700, 6701]"},
                    {"name": "nimbus.host", "category": "Nimbus"},
                    {"name": "yarn.resourcemanager.address", "category": "ResourceManager"}
                ]
            }
        },
        "service_configs": [
            {"service_name": "HDFS", "config_categories": [
                {"name": "NameNode", "host_component_names": ["NAMENODE"]},
                {"name": "General"}
            ]},
            {"service_name": "STORM", "config_categories": [
                {"name": "Nimbus", "host_component_names": ["NIMBUS"]},
                {"name": "Supervisor", "host_component_names": ["SUPERVISOR"]},
                {"name": "General"}
            ]},
            {"service_name": "YARN", "config_categories": [
                {"name": "ResourceManager", "host_component_names": ["RESOURCEMANAGER"]}
            ]}
        ],
        "review_services": [
            {"service_name": "HDFS", "service_components": [
                {"component_name": "NAMENODE"},
                {"component_name": "DATANODE"}
            ]},
            {"service_name": "STORM", "service_components": [
                {"component_name": "NIMBUS", "display_name": "Nimbus"},
                {"component_name": "SUPERVISOR", "display_name": "Supervisor", "component_value": "host1"}
            ]},
            {"service_name": "YARN", "service_components": [
                {"component_name": "RESOURCEMANAGER"}
            ]}
        ]
    })
}

pub fn fixture_catalog() -> StackCatalog {
    serde_json::from_value(fixture_catalog_value()).expect("fixture catalog parses")
}

pub fn write_catalog(value: &Value) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("failed to allocate catalog file")?;
    serde_json::to_writer(&mut file, value)?;
    file.flush()?;
    Ok(file)
}

pub fn all_component_names() -> BTreeSet<String> {
    fixture_catalog()
        .service_components
        .into_iter()
        .map(|component| component.component_name.0)
        .collect()
}

/// Order-insensitive view of the live registries, serialized so that every
/// attribute (including unmodelled ones) takes part in comparisons.
#[derive(Debug, PartialEq, Eq)]
pub struct RegistryView {
    pub components: BTreeSet<String>,
    pub properties: BTreeSet<String>,
    pub review: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

impl RegistryView {
    pub fn of(registries: &Registries) -> Self {
        let components = registries
            .components
            .iter()
            .map(|component| serde_json::to_string(component).unwrap())
            .collect();

        let mut properties = BTreeSet::new();
        for generation in [StackGeneration::One, StackGeneration::Two] {
            let table = registries.properties.tables().for_generation(generation);
            for (file, entries) in table {
                for property in entries {
                    properties.insert(format!(
                        "{generation}/{file}/{}",
                        serde_json::to_string(property).unwrap()
                    ));
                }
            }
        }

        let review = registries
            .review
            .services()
            .flat_map(|service| {
                service.service_components.iter().map(move |row| {
                    format!(
                        "{}/{}",
                        service.service_name,
                        serde_json::to_string(row).unwrap()
                    )
                })
            })
            .collect();

        let mut categories = BTreeSet::new();
        for service in ["HDFS", "STORM", "YARN"] {
            for category in registries.config_categories.categories(service) {
                categories.insert(format!(
                    "{service}/{}",
                    serde_json::to_string(category).unwrap()
                ));
            }
        }

        Self {
            components,
            properties,
            review,
            categories,
        }
    }
}

pub fn bin_path(name: &str) -> PathBuf {
    let path = match name {
        "stack-reconcile" => PathBuf::from(env!("CARGO_BIN_EXE_stack-reconcile")),
        "stack-version" => PathBuf::from(env!("CARGO_BIN_EXE_stack-version")),
        other => panic!("unknown helper {other}"),
    };
    assert!(path.is_file(), "missing helper {}", path.display());
    path
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

pub fn repo_root() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}
