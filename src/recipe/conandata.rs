//! The `conandata.yml` sections describing external requirements.
//!
//! ```yaml
//! system-packages:
//!   ubuntu:
//!     gl: libgl-dev
//!   fedora:
//!     gl: mesa-libGL-devel
//!   osx: {}
//!   fallback:
//!     gl: opengl/system
//! required-commands:
//!   ubuntu:
//!     nasm: nasm
//!   fallback:
//!     nasm: nasm/2.15.05
//! ```
//!
//! An empty value means there is no package (or reference) for that name.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::host::HostOs;
use crate::runtime::Runtime;

/// `name -> package`; `None` when the entry is left empty
pub type PackageMap = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConanData {
    #[serde(rename = "system-packages", default)]
    pub system_packages: Option<RequirementSection>,
    #[serde(rename = "required-commands", default)]
    pub required_commands: Option<RequirementSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RequirementSection {
    pub ubuntu: PackageMap,
    pub fedora: PackageMap,
    pub osx: PackageMap,
    pub fallback: PackageMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SystemPackages,
    RequiredCommands,
}

impl Field {
    pub fn key(&self) -> &'static str {
        match self {
            Field::SystemPackages => "system-packages",
            Field::RequiredCommands => "required-commands",
        }
    }
}

/// Requirements of one section that apply to the current host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectedRequirements {
    pub packages: PackageMap,
    pub fallbacks: PackageMap,
}

impl SelectedRequirements {
    /// Drop `names` from both the packages and the fallbacks.
    pub fn exclude<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        for name in names {
            self.packages.remove(name.as_ref());
            self.fallbacks.remove(name.as_ref());
        }
        self
    }

    /// The fallback reference for `name`, if one is given.
    pub fn fallback(&self, name: &str) -> Option<&str> {
        self.fallbacks.get(name).and_then(|r| r.as_deref())
    }
}

impl ConanData {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    pub fn section(&self, field: Field) -> Option<&RequirementSection> {
        match field {
            Field::SystemPackages => self.system_packages.as_ref(),
            Field::RequiredCommands => self.required_commands.as_ref(),
        }
    }

    /// Pick the map for `host` plus the fallbacks of `field`.
    ///
    /// Hosts without a map get an empty one; a missing section selects
    /// nothing.
    pub fn required_os_field(&self, field: Field, host: HostOs) -> SelectedRequirements {
        let Some(section) = self.section(field) else {
            debug!("conandata has no {} section", field.key());
            return SelectedRequirements::default();
        };
        let packages = match host {
            HostOs::Ubuntu => section.ubuntu.clone(),
            HostOs::Fedora => section.fedora.clone(),
            HostOs::MacOs => section.osx.clone(),
            HostOs::Other => PackageMap::new(),
        };
        SelectedRequirements {
            packages,
            fallbacks: section.fallback.clone(),
        }
    }
}
