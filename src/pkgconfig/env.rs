//! Environment overlays for pkg-config invocations.
//!
//! The overlay is handed to each invocation instead of being exported into
//! the current process, so it cannot leak past the query that needs it.

use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;

use crate::runtime::{Invocation, Runtime};

pub const PKG_CONFIG_PATH: &str = "PKG_CONFIG_PATH";
pub const PKG_CONFIG_LIBDIR: &str = "PKG_CONFIG_LIBDIR";

const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryEnvironment {
    vars: BTreeMap<String, String>,
}

impl QueryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Search `dir` before whatever `PKG_CONFIG_PATH` the host already has.
    pub fn with_search_dir<R: Runtime>(self, runtime: &R, dir: &Path) -> Self {
        let dir = dir.display().to_string();
        let path = match runtime.env_var(PKG_CONFIG_PATH) {
            Ok(existing) if !existing.is_empty() => {
                format!("{}{}{}", dir, PATH_SEPARATOR, existing)
            }
            _ => dir,
        };
        info!("{}={}", PKG_CONFIG_PATH, path);
        self.with(PKG_CONFIG_PATH, path)
    }

    /// Point the `prefix` variable of every package at `package_folder`.
    ///
    /// Only freedesktop pkg-config honours these variables.
    pub fn with_prefix_overrides<S: AsRef<str>>(
        mut self,
        packages: &[S],
        package_folder: &Path,
    ) -> Self {
        for package in packages {
            let var = prefix_variable_name(package.as_ref());
            debug!("{}={}", var, package_folder.display());
            self.vars
                .insert(var, package_folder.display().to_string());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Attach the overlay to `invocation`.
    pub fn apply(&self, invocation: Invocation) -> Invocation {
        invocation.envs(&self.vars)
    }
}

/// `PKG_CONFIG_<NAME>_PREFIX` for a package, with every character outside
/// `[A-Za-z0-9]` replaced by `_`.
pub fn prefix_variable_name(package: &str) -> String {
    let name: String = package
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("PKG_CONFIG_{}_PREFIX", name)
}
