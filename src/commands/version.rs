use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::pkgconfig::QueryEnvironment;
use crate::runtime::Runtime;
use crate::version::{self, RecipeVersion, VersionGate, VersionRequirement};

use super::{pkg_config_tool, print_json};

/// Print the parts of a `<version>-<branch>-<commit>` recipe version
pub fn parse_version(value: &str) -> Result<()> {
    let parsed: RecipeVersion = value.parse()?;
    print_json(&parsed)
}

fn gate(requirement: &str, pattern: Option<&str>) -> Result<VersionGate> {
    let requirement: VersionRequirement = requirement.parse()?;
    Ok(match pattern {
        Some(pattern) => VersionGate::with_pattern(requirement, pattern)?,
        None => VersionGate::new(requirement),
    })
}

/// Check the version a command prints against `requirement`
#[tracing::instrument(skip(runtime))]
pub fn check_version<R: Runtime>(
    runtime: R,
    command: &str,
    requirement: &str,
    version_args: &[String],
    pattern: Option<&str>,
) -> Result<bool> {
    let gate = gate(requirement, pattern)?;
    let args: Vec<&str> = if version_args.is_empty() {
        vec!["--version"]
    } else {
        version_args.iter().map(String::as_str).collect()
    };
    debug!("Checking {} {:?} against {}", command, args, requirement);

    let ok = version::check_cmd_version(&runtime, command, &args, &gate)?;
    println!("{}", ok);
    Ok(ok)
}

/// Check a package's `--modversion` against `requirement`
#[tracing::instrument(skip(runtime))]
pub fn check_pkg_version<R: Runtime>(
    runtime: R,
    pkg_config: Option<String>,
    package: &str,
    requirement: &str,
    pattern: Option<&str>,
    pkgconfig_dir: Option<PathBuf>,
) -> Result<bool> {
    let gate = gate(requirement, pattern)?;
    let tool = pkg_config_tool(&runtime, pkg_config);
    let env = match pkgconfig_dir {
        Some(dir) => QueryEnvironment::new().with_search_dir(&runtime, &dir),
        None => QueryEnvironment::new(),
    };

    let ok = version::check_pkg_version(tool.as_ref(), package, &env, &gate)?;
    println!("{}", ok);
    Ok(ok)
}
