//! Replays a sequence of stack versions against a catalog.
//!
//! Loads the stack catalog (`--catalog`, `STACKGATE_CATALOG`, or the data
//! root), applies each requested version in order, and prints one
//! `ReconcileOutcome` per line as NDJSON followed by a summary object with the
//! components left enabled and disabled.

use anyhow::{Result, anyhow, bail};
use serde::Serialize;
use serde_json::json;
use stackgate::roles::{clients, masters, slaves};
use stackgate::{ComponentName, Reconciler, Settings, init_logging, split_list};
use std::{env, path::PathBuf};

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    let mut settings = Settings::from_env();
    if let Some(path) = cli.catalog_path {
        settings.catalog_path = Some(path);
    }
    if cli.ignore_skip {
        settings.skip_reconcile = false;
    }

    let versions = resolve_versions(cli.versions)?;
    let mut reconciler = Reconciler::from_settings(&settings)?;

    for version in &versions {
        let outcome = reconciler.set_stack_version(version);
        println!("{}", serde_json::to_string(&outcome)?);
    }

    let registries = reconciler.registries();
    let summary = Summary {
        version: reconciler.effective_version().raw().to_string(),
        stack_version_url: reconciler.stack_version_url(),
        enabled: registries.components.names().cloned().collect(),
        disabled: reconciler.disabled().names().cloned().collect(),
        masters: masters(&registries.components),
        slaves: slaves(&registries.components),
        clients: clients(&registries.components),
    };
    println!("{}", json!({ "summary": summary }));
    Ok(())
}

#[derive(Serialize)]
struct Summary {
    version: String,
    stack_version_url: String,
    enabled: Vec<ComponentName>,
    disabled: Vec<ComponentName>,
    masters: Vec<ComponentName>,
    slaves: Vec<ComponentName>,
    clients: Vec<ComponentName>,
}

fn resolve_versions(from_args: Vec<String>) -> Result<Vec<String>> {
    let versions = if from_args.is_empty() {
        env::var("STACK_VERSIONS")
            .ok()
            .map(|raw| split_list(&raw))
            .unwrap_or_default()
    } else {
        from_args
    };
    if versions.is_empty() {
        bail!("No stack versions given; pass them as arguments or set STACK_VERSIONS");
    }
    Ok(versions)
}

struct Cli {
    catalog_path: Option<PathBuf>,
    ignore_skip: bool,
    versions: Vec<String>,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args_os();
        let _program = args.next();
        let mut catalog_path = None;
        let mut ignore_skip = false;
        let mut versions = Vec::new();

        while let Some(arg) = args.next() {
            let arg_str = arg
                .to_str()
                .ok_or_else(|| anyhow!("invalid UTF-8 in argument"))?;
            match arg_str {
                "--catalog" => catalog_path = Some(next_path("--catalog", &mut args)?),
                "--ignore-skip" => ignore_skip = true,
                "--help" | "-h" => usage(0),
                other if other.starts_with("--") => bail!("unknown argument: {other}"),
                other => versions.extend(split_list(other)),
            }
        }

        Ok(Self {
            catalog_path,
            ignore_skip,
            versions,
        })
    }
}

fn next_path(flag: &str, args: &mut env::ArgsOs) -> Result<PathBuf> {
    let value = args
        .next()
        .ok_or_else(|| anyhow!("{flag} requires a value"))?;
    let path = PathBuf::from(
        value
            .into_string()
            .map_err(|_| anyhow!("{flag} must be valid UTF-8"))?,
    );
    if path.as_os_str().is_empty() {
        bail!("{flag} must not be empty");
    }
    Ok(path)
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: stack-reconcile [--catalog PATH] [--ignore-skip] VERSION...\n\nOptions:\n  --catalog PATH            Override stack catalog path (or set STACKGATE_CATALOG).\n  --ignore-skip             Reconcile even when STACKGATE_SKIP_RECONCILE is set.\n  --help                    Show this help text.\n\nVersions may also come from STACK_VERSIONS (comma or space separated)."
    );
    std::process::exit(code);
}
