use log::debug;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::runtime::Runtime;

const OS_RELEASE: &str = "/etc/os-release";

/// Host flavours that `conandata.yml` can carry requirements for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    Ubuntu,
    Fedora,
    MacOs,
    Other,
}

impl HostOs {
    #[tracing::instrument(skip(runtime))]
    pub fn detect<R: Runtime>(runtime: &R) -> Self {
        if cfg!(target_os = "macos") {
            return HostOs::MacOs;
        }
        if !cfg!(target_os = "linux") {
            return HostOs::Other;
        }
        match runtime.read_to_string(Path::new(OS_RELEASE)) {
            Ok(content) => Self::from_os_release(&content),
            Err(e) => {
                debug!("Cannot read {}: {}", OS_RELEASE, e);
                HostOs::Other
            }
        }
    }

    /// Read the distribution from the `ID=` line of an os-release file.
    pub fn from_os_release(content: &str) -> Self {
        let id = content
            .lines()
            .filter_map(|line| line.trim().strip_prefix("ID="))
            .map(|value| value.trim().trim_matches(|c| c == '"' || c == '\''))
            .next()
            .unwrap_or_default();
        debug!("Linux distribution: {:?}", id);
        match id.to_ascii_lowercase().as_str() {
            "ubuntu" => HostOs::Ubuntu,
            "fedora" => HostOs::Fedora,
            _ => HostOs::Other,
        }
    }

    /// Key of this host's map in a `conandata.yml` section
    pub fn conandata_key(&self) -> Option<&'static str> {
        match self {
            HostOs::Ubuntu => Some("ubuntu"),
            HostOs::Fedora => Some("fedora"),
            HostOs::MacOs => Some("osx"),
            HostOs::Other => None,
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.conandata_key().unwrap_or("other"))
    }
}

impl FromStr for HostOs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ubuntu" => Ok(HostOs::Ubuntu),
            "fedora" => Ok(HostOs::Fedora),
            "osx" | "macos" => Ok(HostOs::MacOs),
            "other" => Ok(HostOs::Other),
            other => Err(format!(
                "unknown host '{}', expected ubuntu, fedora, osx or other",
                other
            )),
        }
    }
}
