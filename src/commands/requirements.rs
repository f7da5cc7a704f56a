use anyhow::Result;
use log::{error, info};
use std::path::Path;

use crate::recipe::{
    ConanData, Field, HostOs, RequirementsReport, SystemPackageInstaller, build_requirements,
    system_requirements,
};
use crate::runtime::Runtime;

use super::{pkg_config_tool, print_json};

fn load<R: Runtime>(
    runtime: &R,
    conandata: &Path,
    field: Field,
    host: Option<HostOs>,
) -> Result<crate::recipe::SelectedRequirements> {
    let data = ConanData::load(runtime, conandata)?;
    let host = host.unwrap_or_else(|| HostOs::detect(runtime));
    info!("Resolving {} for {}", field.key(), host);
    Ok(data.required_os_field(field, host))
}

fn finish(report: &RequirementsReport) -> Result<bool> {
    print_json(report)?;
    let unresolved: Vec<&str> = report.unresolved().collect();
    if !unresolved.is_empty() {
        error!("Unresolved requirements: {}", unresolved.join(", "));
    }
    Ok(unresolved.is_empty())
}

/// Resolve the `system-packages` of `conandata` and print the report.
///
/// Returns whether every library was resolved.
#[tracing::instrument(skip(runtime))]
pub fn sysreqs<R: Runtime>(
    runtime: R,
    pkg_config: Option<String>,
    conandata: &Path,
    exclude: &[String],
    host: Option<HostOs>,
) -> Result<bool> {
    let selected = load(&runtime, conandata, Field::SystemPackages, host)?;
    let installer = SystemPackageInstaller::from_env(&runtime)?;
    let tool = pkg_config_tool(&runtime, pkg_config);

    let report = system_requirements(&selected, exclude, tool.as_ref(), &installer)?;
    finish(&report)
}

/// Resolve the `required-commands` of `conandata` and print the report.
#[tracing::instrument(skip(runtime))]
pub fn buildreqs<R: Runtime>(runtime: R, conandata: &Path, host: Option<HostOs>) -> Result<bool> {
    let selected = load(&runtime, conandata, Field::RequiredCommands, host)?;
    let installer = SystemPackageInstaller::from_env(&runtime)?;

    let report = build_requirements(&runtime, &selected, &installer)?;
    finish(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{configure_mock_runtime_basics, expect_freedesktop_pkg_config};
    use std::path::PathBuf;

    const CONANDATA: &str = "required-commands:\n  ubuntu:\n    meson: meson\n    nasm:\n  fallback:\n    nasm: nasm/2.15.05\n";

    fn runtime() -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok(CONANDATA.to_string()));
        configure_mock_runtime_basics(&mut runtime);
        runtime
    }

    #[test]
    fn test_buildreqs_uses_fallback_for_missing_command() {
        let mut runtime = runtime();
        runtime.expect_which().returning(|cmd| match cmd {
            "meson" => Some(PathBuf::from("/usr/bin/meson")),
            _ => None,
        });

        let complete =
            buildreqs(runtime, Path::new("conandata.yml"), Some(HostOs::Ubuntu)).unwrap();
        assert!(complete);
    }

    #[test]
    fn test_buildreqs_other_host_selects_nothing() {
        let mut runtime = runtime();
        runtime.expect_which().returning(|_| None);

        assert!(buildreqs(runtime, Path::new("conandata.yml"), Some(HostOs::Other)).unwrap());
    }

    #[test]
    fn test_sysreqs_without_section_is_complete() {
        let mut runtime = runtime();
        runtime.expect_which().returning(|_| None);
        expect_freedesktop_pkg_config(&mut runtime);

        let complete = sysreqs(
            runtime,
            Some("pkg-config".into()),
            Path::new("conandata.yml"),
            &[],
            Some(HostOs::Fedora),
        )
        .unwrap();
        assert!(complete);
    }
}
