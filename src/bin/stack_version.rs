//! Classifies a stack version and prints the result as JSON.
//!
//! With one argument the output describes the version (family, number,
//! generation, stack URLs). With two it also reports how the first compares
//! to the second as `-1`, `0` or `1`.

use anyhow::{Result, bail};
use serde::Serialize;
use stackgate::{StackVersion, compare_versions, init_logging};
use std::cmp::Ordering;
use std::env;

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|arg| matches!(arg.as_str(), "-h" | "--help")) {
        usage_and_exit(0);
    }
    let (raw, other) = match args.as_slice() {
        [raw] => (raw.as_str(), None),
        [raw, other] => (raw.as_str(), Some(other.as_str())),
        _ => usage_and_exit(1),
    };
    if raw.trim().is_empty() {
        bail!("stack version must not be empty");
    }

    let version = StackVersion::parse(raw);
    let report = Classification {
        generation_two: version.is_generation_two(),
        generation: version.generation().as_str(),
        stack_version_url: version.stack_version_url(),
        stack2_version_url: version.stack2_version_url(),
        compare: other.map(|other| ordering_code(compare_versions(raw, other))),
        version,
    };

    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

#[derive(Serialize)]
struct Classification {
    #[serde(flatten)]
    version: StackVersion,
    generation: &'static str,
    generation_two: bool,
    stack_version_url: String,
    stack2_version_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    compare: Option<i8>,
}

fn ordering_code(ordering: Ordering) -> i8 {
    match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!("Usage: stack-version VERSION [OTHER_VERSION]");
    std::process::exit(code);
}
