//! Default search directories of the system linker.

use log::debug;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::error::ToolError;
use crate::runtime::{Invocation, Runtime, check_output};

// SEARCH_DIR("=/usr/local/lib64"); SEARCH_DIR("/usr/lib")
static SEARCH_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"SEARCH_DIR\("=?([^"]*)"\)"#).expect("valid SEARCH_DIR regex"));

/// Directories the linker searches without any `-L`.
///
/// Discovered once and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultLibPathSet {
    dirs: BTreeSet<String>,
}

impl DefaultLibPathSet {
    /// Ask `ld --verbose` for its built-in search directories.
    #[tracing::instrument(skip(runtime))]
    pub fn discover<R: Runtime>(runtime: &R) -> Result<Self, ToolError> {
        let output = check_output(runtime, &Invocation::new("ld").arg("--verbose"))?;
        let set = Self::parse(&output);
        debug!("Default linker search directories: {:?}", set.dirs);
        Ok(set)
    }

    /// Extract the `SEARCH_DIR` entries of a linker script.
    pub fn parse(ld_verbose: &str) -> Self {
        Self::from_dirs(
            SEARCH_DIR
                .captures_iter(ld_verbose)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str()),
        )
    }

    pub fn from_dirs<I, S>(dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            dirs: dirs
                .into_iter()
                .map(|d| normalize(d.as_ref()).to_string())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, dir: &str) -> bool {
        self.dirs.contains(normalize(dir))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

fn normalize(dir: &str) -> &str {
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() && dir.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}
