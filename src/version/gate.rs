//! Version gates for command-line tools and pkg-config packages.
//!
//! A gate never fails on a version mismatch: it logs what it found and
//! returns `false`, leaving the caller to decide whether that is fatal. Only a
//! tool that cannot be run at all is an error.

use log::{info, warn};
use regex::Regex;
use std::sync::LazyLock;

use super::VersionRequirement;
use crate::error::{ToolError, VersionError};
use crate::pkgconfig::{PkgConfigTool, QueryEnvironment};
use crate::runtime::{Invocation, Runtime};

/// Skips any leading text and captures the first token starting with a digit
pub const DEFAULT_VERSION_PATTERN: &str = r".*?([0-9][.0-9a-zA-Z\-_]+)";

static DEFAULT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^(?:{})", DEFAULT_VERSION_PATTERN)).expect("valid default pattern")
});

#[derive(Debug, Clone)]
pub struct VersionGate {
    requirement: VersionRequirement,
    pattern: Regex,
    pattern_source: String,
}

impl VersionGate {
    pub fn new(requirement: VersionRequirement) -> Self {
        Self {
            requirement,
            pattern: DEFAULT_REGEX.clone(),
            pattern_source: DEFAULT_VERSION_PATTERN.to_string(),
        }
    }

    /// Use a custom pattern. Its first capture group is the version; the
    /// pattern is anchored at the start of the output.
    pub fn with_pattern(
        requirement: VersionRequirement,
        pattern: &str,
    ) -> Result<Self, VersionError> {
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|source| {
            VersionError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        if regex.captures_len() < 2 {
            return Err(VersionError::PatternWithoutCapture {
                pattern: pattern.to_string(),
            });
        }
        Ok(Self {
            requirement,
            pattern: regex,
            pattern_source: pattern.to_string(),
        })
    }

    pub fn requirement(&self) -> &VersionRequirement {
        &self.requirement
    }

    /// Pull the version string out of tool output.
    pub fn extract<'a>(&self, output: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(output)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Check the version printed by `subject`.
    pub fn check(&self, subject: &str, output: &str) -> bool {
        let output = output.trim();
        if output.is_empty() {
            warn!("no output from {}", subject);
            return false;
        }

        let Some(found) = self.extract(output) else {
            warn!(
                "output from {} is {}, which does not match version pattern `{}`",
                subject, output, self.pattern_source
            );
            return false;
        };

        info!("{} version = {}", subject, found);
        match self.requirement.matches(found) {
            Ok(true) => {
                info!("{} version {} satisfies {}", subject, found, self.requirement);
                true
            }
            Ok(false) => {
                info!(
                    "{} version does not meet requirement {}",
                    subject, self.requirement
                );
                false
            }
            Err(e) => {
                warn!("{} reported an unreadable version: {}", subject, e);
                false
            }
        }
    }
}

/// Run `cmd` with `version_args` and check the version it prints.
///
/// Tools that print their version on stderr are supported when stdout is
/// empty.
#[tracing::instrument(skip(runtime, gate))]
pub fn check_cmd_version<R: Runtime>(
    runtime: &R,
    cmd: &str,
    version_args: &[&str],
    gate: &VersionGate,
) -> Result<bool, ToolError> {
    let invocation = Invocation::new(cmd).args(version_args.iter().copied());
    let output = runtime
        .run(&invocation)
        .map_err(|e| ToolError::not_found(invocation.to_string(), e))?;

    if !output.success() {
        return Err(ToolError::invocation(
            invocation.to_string(),
            output.status_text(),
            output.stderr.trim(),
        ));
    }

    let text = if output.stdout.trim().is_empty() {
        &output.stderr
    } else {
        &output.stdout
    };
    Ok(gate.check(&invocation.to_string(), text))
}

/// Check the `--modversion` of a pkg-config package.
#[tracing::instrument(skip(tool, env, gate))]
pub fn check_pkg_version(
    tool: &dyn PkgConfigTool,
    package: &str,
    env: &QueryEnvironment,
    gate: &VersionGate,
) -> Result<bool, ToolError> {
    let output = tool.modversion(package, env)?;
    Ok(gate.check(package, &output))
}
