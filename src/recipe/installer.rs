//! System package installation.
//!
//! What the installer may do is controlled by `CONAN_SYSREQUIRES_MODE`:
//!
//! - `enabled` - install missing packages
//! - `verify` - fail when a package is missing
//! - `disabled` - only report missing packages (the default)

use log::{debug, info, warn};
use std::fmt;
use std::str::FromStr;

use crate::error::{InstallError, ToolError};
use crate::runtime::{Invocation, Runtime, check_output};

pub const MODE_ENV: &str = "CONAN_SYSREQUIRES_MODE";
pub const SUDO_ENV: &str = "CONAN_SYSREQUIRES_SUDO";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallMode {
    Enabled,
    Verify,
    #[default]
    Disabled,
}

impl FromStr for InstallMode {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" => Ok(InstallMode::Enabled),
            "verify" => Ok(InstallMode::Verify),
            "disabled" => Ok(InstallMode::Disabled),
            _ => Err(InstallError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstallMode::Enabled => "enabled",
            InstallMode::Verify => "verify",
            InstallMode::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
    Pacman,
    Brew,
}

impl PackageManager {
    /// Probe order when several managers are on `PATH`
    const ALL: [PackageManager; 5] = [
        PackageManager::Apt,
        PackageManager::Dnf,
        PackageManager::Yum,
        PackageManager::Pacman,
        PackageManager::Brew,
    ];

    pub fn detect<R: Runtime>(runtime: &R) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| runtime.which(m.program()).is_some())
    }

    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Pacman => "pacman",
            PackageManager::Brew => "brew",
        }
    }

    /// Homebrew refuses to run as root
    fn uses_sudo(&self) -> bool {
        !matches!(self, PackageManager::Brew)
    }

    fn query(&self, package: &str) -> Invocation {
        match self {
            PackageManager::Apt => {
                Invocation::new("dpkg-query").args(["-W", "-f=${Status}", package])
            }
            PackageManager::Dnf | PackageManager::Yum => Invocation::new("rpm").args(["-q", package]),
            PackageManager::Pacman => Invocation::new("pacman").args(["-Qi", package]),
            PackageManager::Brew => Invocation::new("brew").args(["ls", "--versions", package]),
        }
    }

    fn is_installed_output(&self, stdout: &str) -> bool {
        match self {
            PackageManager::Apt => stdout.contains("install ok installed"),
            PackageManager::Brew => !stdout.trim().is_empty(),
            _ => true,
        }
    }

    fn update_args(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Apt => &["update"],
            PackageManager::Dnf | PackageManager::Yum => &["check-update", "-y"],
            PackageManager::Pacman => &["-Syy", "--noconfirm"],
            PackageManager::Brew => &["update"],
        }
    }

    /// `check-update` exits 100 when updates are available
    fn update_succeeded(&self, status: Option<i32>) -> bool {
        match self {
            PackageManager::Dnf | PackageManager::Yum => matches!(status, Some(0) | Some(100)),
            _ => status == Some(0),
        }
    }

    fn install_args(&self, package: &str) -> Vec<String> {
        let args: &[&str] = match self {
            PackageManager::Apt => &["install", "-y", "--no-install-recommends"],
            PackageManager::Dnf | PackageManager::Yum => &["install", "-y"],
            PackageManager::Pacman => &["-S", "--noconfirm"],
            PackageManager::Brew => &["install"],
        };
        args.iter()
            .copied()
            .chain(std::iter::once(package))
            .map(String::from)
            .collect()
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait PackageInstaller {
    fn installed(&self, package: &str) -> bool;

    /// Make sure `package` is installed, as far as the mode allows.
    ///
    /// With `update` the package index is refreshed first.
    fn install(&self, package: &str, update: bool) -> Result<(), InstallError>;
}

pub struct SystemPackageInstaller<'a, R: Runtime> {
    runtime: &'a R,
    manager: Option<PackageManager>,
    mode: InstallMode,
    sudo: bool,
}

impl<'a, R: Runtime> SystemPackageInstaller<'a, R> {
    pub fn new(
        runtime: &'a R,
        manager: Option<PackageManager>,
        mode: InstallMode,
        sudo: bool,
    ) -> Self {
        Self {
            runtime,
            manager,
            mode,
            sudo,
        }
    }

    /// Configure from `CONAN_SYSREQUIRES_MODE` and `CONAN_SYSREQUIRES_SUDO`.
    #[tracing::instrument(skip(runtime))]
    pub fn from_env(runtime: &'a R) -> Result<Self, InstallError> {
        let mode = match runtime.env_var(MODE_ENV) {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => InstallMode::default(),
        };
        let sudo_requested = match runtime.env_var(SUDO_ENV) {
            Ok(value) => !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false"),
            Err(_) => true,
        };
        let sudo = sudo_requested && !runtime.is_privileged();
        let manager = PackageManager::detect(runtime);
        debug!(
            "System package installer: manager={:?}, mode={}, sudo={}",
            manager, mode, sudo
        );
        Ok(Self::new(runtime, manager, mode, sudo))
    }

    pub fn mode(&self) -> InstallMode {
        self.mode
    }

    pub fn manager(&self) -> Option<PackageManager> {
        self.manager
    }

    fn privileged(&self, manager: PackageManager, args: &[String]) -> Invocation {
        if self.sudo && manager.uses_sudo() {
            Invocation::new("sudo")
                .arg("-A")
                .arg(manager.program())
                .args(args.iter().cloned())
        } else {
            Invocation::new(manager.program()).args(args.iter().cloned())
        }
    }

    fn update(&self, manager: PackageManager) -> Result<(), ToolError> {
        let args: Vec<String> = manager.update_args().iter().map(|a| a.to_string()).collect();
        let invocation = self.privileged(manager, &args);
        let output = self
            .runtime
            .run(&invocation)
            .map_err(|e| ToolError::not_found(invocation.to_string(), e))?;
        if !manager.update_succeeded(output.status) {
            return Err(ToolError::invocation(
                invocation.to_string(),
                output.status_text(),
                output.stderr.trim(),
            ));
        }
        Ok(())
    }
}

impl<R: Runtime> PackageInstaller for SystemPackageInstaller<'_, R> {
    fn installed(&self, package: &str) -> bool {
        let Some(manager) = self.manager else {
            return false;
        };
        match self.runtime.run(&manager.query(package)) {
            Ok(output) => output.success() && manager.is_installed_output(&output.stdout),
            Err(e) => {
                debug!("Cannot query {} for {}: {}", manager.program(), package, e);
                false
            }
        }
    }

    #[tracing::instrument(skip(self))]
    fn install(&self, package: &str, update: bool) -> Result<(), InstallError> {
        let Some(manager) = self.manager else {
            warn!(
                "No supported package manager (apt-get, dnf, yum, pacman, brew) found; cannot install {}",
                package
            );
            return Ok(());
        };
        if self.installed(package) {
            debug!("{} is already installed", package);
            return Ok(());
        }

        match self.mode {
            InstallMode::Disabled => {
                warn!(
                    "The following package needs to be installed: {} ({}={})",
                    package, MODE_ENV, self.mode
                );
                Ok(())
            }
            InstallMode::Verify => Err(InstallError::MissingInVerifyMode {
                package: package.to_string(),
            }),
            InstallMode::Enabled => {
                if update {
                    self.update(manager)
                        .map_err(|e| InstallError::tool(package, e))?;
                }
                info!("Installing {} with {}", package, manager.program());
                let invocation = self.privileged(manager, &manager.install_args(package));
                check_output(self.runtime, &invocation)
                    .map_err(|e| InstallError::tool(package, e))?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, ProcessOutput};
    use mockall::predicate::eq;
    use std::path::PathBuf;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("enabled".parse::<InstallMode>().unwrap(), InstallMode::Enabled);
        assert_eq!("Verify".parse::<InstallMode>().unwrap(), InstallMode::Verify);
        assert_eq!(InstallMode::default(), InstallMode::Disabled);
        assert!(matches!(
            "always".parse::<InstallMode>(),
            Err(InstallError::InvalidMode { .. })
        ));
    }

    #[test]
    fn test_detect_manager_order() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_which()
            .returning(|p| (p == "yum" || p == "dnf").then(|| PathBuf::from("/usr/bin").join(p)));
        assert_eq!(PackageManager::detect(&runtime), Some(PackageManager::Dnf));

        let mut runtime = MockRuntime::new();
        runtime.expect_which().returning(|_| None);
        assert_eq!(PackageManager::detect(&runtime), None);
    }

    fn env_runtime(mode: Option<&'static str>, sudo: Option<&'static str>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(MODE_ENV))
            .returning(move |_| mode.map(String::from).ok_or(std::env::VarError::NotPresent));
        runtime
            .expect_env_var()
            .with(eq(SUDO_ENV))
            .returning(move |_| sudo.map(String::from).ok_or(std::env::VarError::NotPresent));
        runtime
            .expect_which()
            .returning(|p| (p == "apt-get").then(|| PathBuf::from("/usr/bin/apt-get")));
        runtime
    }

    #[test]
    fn test_from_env_defaults() {
        let mut runtime = env_runtime(None, None);
        runtime.expect_is_privileged().returning(|| false);

        let installer = SystemPackageInstaller::from_env(&runtime).unwrap();
        assert_eq!(installer.mode(), InstallMode::Disabled);
        assert_eq!(installer.manager(), Some(PackageManager::Apt));
        assert!(installer.sudo);
    }

    #[test]
    fn test_from_env_sudo_disabled_or_privileged() {
        let mut runtime = env_runtime(Some("enabled"), Some("False"));
        runtime.expect_is_privileged().returning(|| false);
        assert!(!SystemPackageInstaller::from_env(&runtime).unwrap().sudo);

        let mut runtime = env_runtime(Some("enabled"), None);
        runtime.expect_is_privileged().returning(|| true);
        assert!(!SystemPackageInstaller::from_env(&runtime).unwrap().sudo);
    }

    #[test]
    fn test_from_env_rejects_unknown_mode() {
        let runtime = env_runtime(Some("sometimes"), None);
        assert!(SystemPackageInstaller::from_env(&runtime).is_err());
    }

    #[test]
    fn test_installed_apt() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|inv| inv.program == "dpkg-query")
            .returning(|inv| {
                if inv.args.last().map(String::as_str) == Some("nasm") {
                    Ok(ProcessOutput::ok("install ok installed"))
                } else {
                    Ok(ProcessOutput::failed(1, "no packages found"))
                }
            });

        let installer = SystemPackageInstaller::new(
            &runtime,
            Some(PackageManager::Apt),
            InstallMode::Disabled,
            false,
        );
        assert!(installer.installed("nasm"));
        assert!(!installer.installed("yasm"));
    }

    #[test_log::test]
    fn test_disabled_mode_never_installs() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|inv| inv.program == "rpm")
            .times(1)
            .returning(|_| Ok(ProcessOutput::failed(1, "")));

        let installer = SystemPackageInstaller::new(
            &runtime,
            Some(PackageManager::Dnf),
            InstallMode::Disabled,
            true,
        );
        assert!(installer.install("nasm", true).is_ok());
    }

    #[test]
    fn test_verify_mode_fails_on_missing_package() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .returning(|_| Ok(ProcessOutput::failed(1, "")));

        let installer = SystemPackageInstaller::new(
            &runtime,
            Some(PackageManager::Pacman),
            InstallMode::Verify,
            false,
        );
        assert!(matches!(
            installer.install("nasm", false),
            Err(InstallError::MissingInVerifyMode { .. })
        ));
    }

    #[test]
    fn test_enabled_mode_updates_and_installs_with_sudo() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|inv| inv.program == "dpkg-query")
            .returning(|_| Ok(ProcessOutput::failed(1, "")));
        runtime
            .expect_run()
            .withf(|inv| inv.program == "sudo" && inv.args == ["-A", "apt-get", "update"])
            .times(1)
            .returning(|_| Ok(ProcessOutput::ok("")));
        runtime
            .expect_run()
            .withf(|inv| {
                inv.program == "sudo"
                    && inv.args
                        == ["-A", "apt-get", "install", "-y", "--no-install-recommends", "nasm"]
            })
            .times(1)
            .returning(|_| Ok(ProcessOutput::ok("")));

        let installer = SystemPackageInstaller::new(
            &runtime,
            Some(PackageManager::Apt),
            InstallMode::Enabled,
            true,
        );
        installer.install("nasm", true).unwrap();
    }

    #[test]
    fn test_enabled_mode_reports_install_failure() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|inv| inv.program == "brew" && inv.args[0] == "ls")
            .returning(|_| Ok(ProcessOutput::ok("")));
        runtime
            .expect_run()
            .withf(|inv| inv.program == "brew" && inv.args == ["install", "nasm"])
            .returning(|_| Ok(ProcessOutput::failed(1, "Error: No available formula")));

        let installer = SystemPackageInstaller::new(
            &runtime,
            Some(PackageManager::Brew),
            InstallMode::Enabled,
            true,
        );
        assert!(matches!(
            installer.install("nasm", false),
            Err(InstallError::Tool { .. })
        ));
    }

    #[test]
    fn test_yum_check_update_exit_100_is_success() {
        assert!(PackageManager::Yum.update_succeeded(Some(100)));
        assert!(!PackageManager::Apt.update_succeeded(Some(100)));
    }

    #[test]
    fn test_without_manager() {
        let runtime = MockRuntime::new();
        let installer = SystemPackageInstaller::new(&runtime, None, InstallMode::Enabled, false);
        assert!(!installer.installed("nasm"));
        assert!(installer.install("nasm", false).is_ok());
    }
}
