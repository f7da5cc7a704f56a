//! Versions of git-sourced recipes.
//!
//! A recipe version encodes where its sources come from:
//! `1.18.0-master-3f2a9c1` is upstream version `1.18.0` built from branch
//! `master` at commit `3f2a9c1`.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::VersionError;

pub const VERSION_PATTERN: &str = r"([0-9.]+)-(.+)-([a-z0-9]+)";

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}", VERSION_PATTERN)).expect("valid version regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeVersion {
    pub version: String,
    pub branch: String,
    pub commit: String,
}

impl RecipeVersion {
    pub fn parse(value: &str) -> Result<Self, VersionError> {
        let caps =
            VERSION_REGEX
                .captures(value)
                .ok_or_else(|| VersionError::InvalidRecipeVersion {
                    value: value.to_string(),
                    pattern: VERSION_PATTERN.to_string(),
                })?;

        Ok(Self {
            version: caps[1].to_string(),
            branch: caps[2].to_string(),
            commit: caps[3].to_string(),
        })
    }
}

impl FromStr for RecipeVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RecipeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.version, self.branch, self.commit)
    }
}
