//! The pkg-config executables.
//!
//! Freedesktop `pkg-config` and `pkgconf` accept mostly the same options but
//! differ in how they list packages and in whether they honour
//! `PKG_CONFIG_<PKG>_PREFIX`. Each variant implements [`PkgConfigTool`] on top
//! of the shared [`Executable`] wrapper.

use log::debug;
use std::path::Path;

use super::env::{PKG_CONFIG_LIBDIR, QueryEnvironment};
use crate::error::ToolError;
use crate::runtime::{Invocation, Runtime, check_output};

pub const DEFAULT_EXECUTABLE: &str = "pkg-config";

/// Unparsed flag output of one package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFlags {
    pub cflags_only_i: String,
    pub cflags_only_other: String,
    pub libs: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait PkgConfigTool {
    /// Path or name of the executable
    fn executable(&self) -> &str;

    /// Whether this is the pkgconf implementation
    fn is_pkgconf(&self) -> bool;

    fn version(&self) -> Result<String, ToolError>;

    /// Names of all packages on the search path
    fn list_package_names(&self) -> Result<Vec<String>, ToolError>;

    /// Names of the packages whose `.pc` files are in `dir`
    fn list_package_names_in(&self, dir: &Path) -> Result<Vec<String>, ToolError>;

    fn query_flags(&self, package: &str, env: &QueryEnvironment) -> Result<RawFlags, ToolError>;

    fn modversion(&self, package: &str, env: &QueryEnvironment) -> Result<String, ToolError>;

    fn variable(
        &self,
        package: &str,
        name: &str,
        env: &QueryEnvironment,
    ) -> Result<String, ToolError>;

    /// `Ok(false)` when the package is unknown; errors only when the tool
    /// cannot run.
    fn exists(&self, package: &str, env: &QueryEnvironment) -> Result<bool, ToolError>;
}

/// `$PKG_CONFIG` when set, `pkg-config` otherwise.
pub fn executable_path<R: Runtime>(runtime: &R) -> String {
    runtime
        .env_var("PKG_CONFIG")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EXECUTABLE.to_string())
}

/// Pick the variant behind the configured executable.
pub fn detect<'a, R: Runtime>(runtime: &'a R) -> Box<dyn PkgConfigTool + 'a> {
    detect_executable(runtime, executable_path(runtime))
}

/// Pick the variant behind `path`.
#[tracing::instrument(skip(runtime))]
pub fn detect_executable<'a, R: Runtime>(
    runtime: &'a R,
    path: String,
) -> Box<dyn PkgConfigTool + 'a> {
    let exe = Executable::new(runtime, path);
    if exe.answers_about() {
        debug!("{} is pkgconf", exe.path());
        Box::new(Pkgconf { exe })
    } else {
        debug!("{} is freedesktop pkg-config", exe.path());
        Box::new(FreedesktopPkgConfig { exe })
    }
}

/// Shared invocation logic of both variants
pub struct Executable<'a, R: Runtime> {
    runtime: &'a R,
    path: String,
}

impl<'a, R: Runtime> Executable<'a, R> {
    pub fn new(runtime: &'a R, path: impl Into<String>) -> Self {
        Self {
            runtime,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn invocation(&self, args: &[&str], env: &QueryEnvironment) -> Invocation {
        env.apply(Invocation::new(&self.path).args(args.iter().copied()))
    }

    pub fn output(&self, args: &[&str], env: &QueryEnvironment) -> Result<String, ToolError> {
        check_output(self.runtime, &self.invocation(args, env))
    }

    /// Run for the exit status only.
    pub fn probe(&self, args: &[&str], env: &QueryEnvironment) -> Result<bool, ToolError> {
        let invocation = self.invocation(args, env);
        let output = self
            .runtime
            .run(&invocation)
            .map_err(|e| ToolError::not_found(invocation.to_string(), e))?;
        if !output.success() {
            debug!("`{}` failed: {}", invocation, output.stderr.trim());
        }
        Ok(output.success())
    }

    /// pkgconf prints a banner for `--about`; freedesktop pkg-config rejects
    /// the option.
    fn answers_about(&self) -> bool {
        match self.output(&["--about"], &QueryEnvironment::new()) {
            Ok(out) => !out.trim().is_empty(),
            Err(e) => {
                debug!("{} --about: {}", self.path, e);
                false
            }
        }
    }

    fn version(&self) -> Result<String, ToolError> {
        Ok(self
            .output(&["--version"], &QueryEnvironment::new())?
            .trim()
            .to_string())
    }

    fn list(&self, arg: &str, only_in_dir: Option<&Path>) -> Result<String, ToolError> {
        let env = match only_in_dir {
            Some(dir) => QueryEnvironment::new().with(PKG_CONFIG_LIBDIR, dir.display().to_string()),
            None => QueryEnvironment::new(),
        };
        debug!("Listing packages with {:?}", env.vars());
        self.output(&[arg], &env)
    }

    fn query_flags(&self, package: &str, env: &QueryEnvironment) -> Result<RawFlags, ToolError> {
        Ok(RawFlags {
            cflags_only_i: self.output(&["--cflags-only-I", package], env)?,
            cflags_only_other: self.output(&["--cflags-only-other", package], env)?,
            libs: self.output(&["--libs", package], env)?,
        })
    }

    fn modversion(&self, package: &str, env: &QueryEnvironment) -> Result<String, ToolError> {
        Ok(self
            .output(&["--modversion", package], env)?
            .trim()
            .to_string())
    }

    fn variable(
        &self,
        package: &str,
        name: &str,
        env: &QueryEnvironment,
    ) -> Result<String, ToolError> {
        let arg = format!("--variable={}", name);
        Ok(self.output(&[&arg, package], env)?.trim().to_string())
    }

    fn exists(&self, package: &str, env: &QueryEnvironment) -> Result<bool, ToolError> {
        self.probe(&["--exists", package], env)
    }
}

/// freedesktop.org pkg-config
pub struct FreedesktopPkgConfig<'a, R: Runtime> {
    exe: Executable<'a, R>,
}

impl<'a, R: Runtime> FreedesktopPkgConfig<'a, R> {
    pub fn new(exe: Executable<'a, R>) -> Self {
        Self { exe }
    }
}

impl<R: Runtime> PkgConfigTool for FreedesktopPkgConfig<'_, R> {
    fn executable(&self) -> &str {
        self.exe.path()
    }

    fn is_pkgconf(&self) -> bool {
        false
    }

    fn version(&self) -> Result<String, ToolError> {
        self.exe.version()
    }

    fn list_package_names(&self) -> Result<Vec<String>, ToolError> {
        Ok(first_words(&self.exe.list("--list-all", None)?))
    }

    fn list_package_names_in(&self, dir: &Path) -> Result<Vec<String>, ToolError> {
        Ok(first_words(&self.exe.list("--list-all", Some(dir))?))
    }

    fn query_flags(&self, package: &str, env: &QueryEnvironment) -> Result<RawFlags, ToolError> {
        self.exe.query_flags(package, env)
    }

    fn modversion(&self, package: &str, env: &QueryEnvironment) -> Result<String, ToolError> {
        self.exe.modversion(package, env)
    }

    fn variable(
        &self,
        package: &str,
        name: &str,
        env: &QueryEnvironment,
    ) -> Result<String, ToolError> {
        self.exe.variable(package, name, env)
    }

    fn exists(&self, package: &str, env: &QueryEnvironment) -> Result<bool, ToolError> {
        self.exe.exists(package, env)
    }
}

/// pkgconf
pub struct Pkgconf<'a, R: Runtime> {
    exe: Executable<'a, R>,
}

impl<'a, R: Runtime> Pkgconf<'a, R> {
    pub fn new(exe: Executable<'a, R>) -> Self {
        Self { exe }
    }
}

impl<R: Runtime> PkgConfigTool for Pkgconf<'_, R> {
    fn executable(&self) -> &str {
        self.exe.path()
    }

    fn is_pkgconf(&self) -> bool {
        true
    }

    fn version(&self) -> Result<String, ToolError> {
        self.exe.version()
    }

    fn list_package_names(&self) -> Result<Vec<String>, ToolError> {
        Ok(non_empty_lines(&self.exe.list("--list-package-names", None)?))
    }

    fn list_package_names_in(&self, dir: &Path) -> Result<Vec<String>, ToolError> {
        Ok(non_empty_lines(&self.exe.list("--list-package-names", Some(dir))?))
    }

    fn query_flags(&self, package: &str, env: &QueryEnvironment) -> Result<RawFlags, ToolError> {
        self.exe.query_flags(package, env)
    }

    fn modversion(&self, package: &str, env: &QueryEnvironment) -> Result<String, ToolError> {
        self.exe.modversion(package, env)
    }

    fn variable(
        &self,
        package: &str,
        name: &str,
        env: &QueryEnvironment,
    ) -> Result<String, ToolError> {
        self.exe.variable(package, name, env)
    }

    fn exists(&self, package: &str, env: &QueryEnvironment) -> Result<bool, ToolError> {
        self.exe.exists(package, env)
    }
}

/// `--list-all` prints `name description`; keep the name.
fn first_words(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

fn non_empty_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
