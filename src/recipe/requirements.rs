//! Resolution of system libraries and build commands.
//!
//! Each requirement is checked on the host first, then installed from the
//! system package manager, then replaced by a Conan fallback reference. A
//! requirement that none of these satisfy is reported, not raised.

use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

use super::conandata::SelectedRequirements;
use super::installer::PackageInstaller;
use crate::error::InstallError;
use crate::pkgconfig::{PkgConfigTool, QueryEnvironment};
use crate::runtime::Runtime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Resolution {
    /// Already available on the host
    Present,
    /// Installed from the named system package
    Installed { package: String },
    /// Provided by a Conan reference instead
    Fallback { reference: String },
    /// Neither the host nor Conan can provide it
    Unresolved,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequirementsReport {
    pub resolutions: BTreeMap<String, Resolution>,
    /// References to add with `requires`
    pub requires: Vec<String>,
    /// References to add with `build_requires`
    pub build_requires: Vec<String>,
}

impl RequirementsReport {
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.resolutions
            .iter()
            .filter(|(_, r)| **r == Resolution::Unresolved)
            .map(|(name, _)| name.as_str())
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved().next().is_none()
    }
}

/// Whether pkg-config knows `name`. Failures to run pkg-config count as
/// absent.
pub fn libpkg_exists(tool: &dyn PkgConfigTool, name: &str) -> bool {
    match tool.exists(name, &QueryEnvironment::new()) {
        Ok(true) => {
            info!("{} exists", name);
            true
        }
        Ok(false) => {
            warn!("Package {} was not found in the pkg-config search path", name);
            false
        }
        Err(e) => {
            warn!("{}", e);
            false
        }
    }
}

/// Resolve the `system-packages` section.
///
/// Libraries are probed with pkg-config before and after installing their
/// system package. Fallbacks go to [`RequirementsReport::requires`].
#[tracing::instrument(skip(selected, tool, installer))]
pub fn system_requirements<S: AsRef<str> + std::fmt::Debug>(
    selected: &SelectedRequirements,
    exclude: &[S],
    tool: &dyn PkgConfigTool,
    installer: &dyn PackageInstaller,
) -> Result<RequirementsReport, InstallError> {
    let selected = selected.clone().exclude(exclude);
    debug!("packages={:?}", selected.packages);

    let mut report = RequirementsReport::default();
    for (lib, package) in &selected.packages {
        if libpkg_exists(tool, lib) {
            report.resolutions.insert(lib.clone(), Resolution::Present);
            continue;
        }

        if let Some(package) = package.as_deref() {
            try_install(installer, package, false)?;
            if libpkg_exists(tool, lib) {
                report.resolutions.insert(
                    lib.clone(),
                    Resolution::Installed {
                        package: package.to_string(),
                    },
                );
                continue;
            }
        }

        match selected.fallback(lib) {
            Some(reference) => {
                warn!(
                    "cannot find/install system lib {}, requires {}",
                    lib, reference
                );
                report.requires.push(reference.to_string());
                report.resolutions.insert(
                    lib.clone(),
                    Resolution::Fallback {
                        reference: reference.to_string(),
                    },
                );
            }
            None => {
                error!("{} does not exist in system nor in conan", lib);
                report.resolutions.insert(lib.clone(), Resolution::Unresolved);
            }
        }
    }
    Ok(report)
}

/// Resolve the `required-commands` section.
///
/// Commands are looked up on `PATH`; an installed system package counts as
/// providing its command. Fallbacks go to
/// [`RequirementsReport::build_requires`].
#[tracing::instrument(skip(runtime, selected, installer))]
pub fn build_requirements<R: Runtime>(
    runtime: &R,
    selected: &SelectedRequirements,
    installer: &dyn PackageInstaller,
) -> Result<RequirementsReport, InstallError> {
    let mut report = RequirementsReport::default();
    for (cmd, package) in &selected.packages {
        if let Some(path) = runtime.which(cmd) {
            debug!("{} found at {:?}", cmd, path);
            report.resolutions.insert(cmd.clone(), Resolution::Present);
            continue;
        }

        if let Some(package) = package.as_deref() {
            warn!("install {} for cmd `{}`", package, cmd);
            try_install(installer, package, true)?;
            if installer.installed(package) {
                report.resolutions.insert(
                    cmd.clone(),
                    Resolution::Installed {
                        package: package.to_string(),
                    },
                );
                continue;
            }
        }

        match selected.fallback(cmd) {
            Some(reference) => {
                warn!("requires {} for cmd `{}`", reference, cmd);
                report.build_requires.push(reference.to_string());
                report.resolutions.insert(
                    cmd.clone(),
                    Resolution::Fallback {
                        reference: reference.to_string(),
                    },
                );
            }
            None => {
                error!("cannot install/find {}", cmd);
                report.resolutions.insert(cmd.clone(), Resolution::Unresolved);
            }
        }
    }
    Ok(report)
}

/// Install through `installer`. Only a refusal in verify mode stops the
/// resolution; other failures fall through to the fallbacks.
fn try_install(
    installer: &dyn PackageInstaller,
    package: &str,
    update: bool,
) -> Result<(), InstallError> {
    match installer.install(package, update) {
        Ok(()) => {
            if installer.installed(package) {
                info!("installed {}", package);
            } else {
                error!("fail to install {}", package);
            }
            Ok(())
        }
        Err(e @ InstallError::MissingInVerifyMode { .. }) => Err(e),
        Err(e) => {
            error!("{:#}", anyhow::Error::new(e));
            Ok(())
        }
    }
}
