//! Version requirements: an inclusive minimum and an optional inclusive
//! maximum.
//!
//! Tool versions seldom follow semver, so versions are read leniently before
//! comparison (see [`parse_lenient`]).

use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;
use std::str::FromStr;

use crate::error::VersionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequirement {
    pub min: Version,
    pub max: Option<Version>,
}

impl VersionRequirement {
    pub fn new(min: Version, max: Option<Version>) -> Self {
        Self { min, max }
    }

    /// Requirement satisfied by `min` and anything newer
    pub fn at_least(min: Version) -> Self {
        Self { min, max: None }
    }

    /// `min <= version <= max`, or `min <= version` when there is no max.
    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        if *version < self.min {
            return false;
        }
        match &self.max {
            Some(max) => version <= max,
            None => true,
        }
    }

    /// Parse `version` leniently and check it against this requirement.
    pub fn matches(&self, version: &str) -> Result<bool, VersionError> {
        Ok(self.is_satisfied_by(&parse_lenient(version)?))
    }

    /// Parse a requirement expression.
    ///
    /// Accepted forms: `1.2`, `>=1.2`, `>=1.2 <=2.0`, `>=1.2, <=2.0` and any of
    /// them wrapped in brackets (`[>=1.2 <=2.0]`).
    pub fn parse(expr: &str) -> Result<Self, VersionError> {
        let inner = expr.trim();
        let inner = inner
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(inner);

        let mut min = None;
        let mut max = None;

        for term in inner
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            if let Some(v) = term.strip_prefix("<=") {
                if max.is_some() {
                    return Err(VersionError::invalid_requirement(expr, "duplicate maximum"));
                }
                max = Some(parse_lenient(v)?);
            } else {
                let v = term.strip_prefix(">=").unwrap_or(term);
                if v.starts_with(['<', '>', '=', '~', '^']) {
                    return Err(VersionError::invalid_requirement(
                        expr,
                        format!("unsupported operator in `{}`", term),
                    ));
                }
                if min.is_some() {
                    return Err(VersionError::invalid_requirement(expr, "duplicate minimum"));
                }
                min = Some(parse_lenient(v)?);
            }
        }

        let min =
            min.ok_or_else(|| VersionError::invalid_requirement(expr, "missing minimum version"))?;
        if let Some(max) = &max {
            if *max < min {
                return Err(VersionError::invalid_requirement(
                    expr,
                    "maximum is lower than minimum",
                ));
            }
        }
        Ok(Self { min, max })
    }
}

impl FromStr for VersionRequirement {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">={}", self.min)?;
        if let Some(max) = &self.max {
            write!(f, " <={}", max)?;
        }
        Ok(())
    }
}

/// Read a version the way tools print them.
///
/// - a leading `v` is ignored
/// - missing components are zero (`1.2` is `1.2.0`)
/// - components past the third are kept as build metadata (`1.2.3.4` is
///   `1.2.3+4`) and still take part in ordering, numerically
/// - anything after the numeric part becomes the pre-release (`2.0rc1` is
///   `2.0.0-rc1`), with characters semver does not allow replaced by `-`
pub fn parse_lenient(value: &str) -> Result<Version, VersionError> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let numeric_end = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (numeric, rest) = trimmed.split_at(numeric_end);

    let components: Vec<&str> = numeric.split('.').filter(|c| !c.is_empty()).collect();
    if components.is_empty() {
        return Err(VersionError::invalid_version(value, "no numeric component"));
    }

    let mut parts = [0u64; 3];
    for (slot, component) in parts.iter_mut().zip(&components) {
        *slot = component
            .parse()
            .map_err(|e| VersionError::invalid_version(value, format!("{}", e)))?;
    }

    let mut version = Version::new(parts[0], parts[1], parts[2]);

    if components.len() > 3 {
        let extra = components[3..].join(".");
        version.build = BuildMetadata::new(&extra)
            .map_err(|e| VersionError::invalid_version(value, e.to_string()))?;
    }

    let pre = sanitize_prerelease(rest);
    if !pre.is_empty() {
        version.pre = Prerelease::new(&pre)
            .map_err(|e| VersionError::invalid_version(value, e.to_string()))?;
    }

    Ok(version)
}

fn sanitize_prerelease(rest: &str) -> String {
    let cleaned: String = rest
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();

    cleaned
        .trim_start_matches(['-', '.'])
        .split('.')
        .map(|ident| ident.trim_matches('-'))
        .filter(|ident| !ident.is_empty())
        .map(|ident| {
            // Numeric identifiers must not carry leading zeros
            if ident.chars().all(|c| c.is_ascii_digit()) {
                let stripped = ident.trim_start_matches('0');
                if stripped.is_empty() { "0" } else { stripped }.to_string()
            } else {
                ident.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
