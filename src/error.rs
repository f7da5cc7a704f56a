//! Error types using thiserror
//!
//! Error hierarchy:
//! - ToolError: an external tool did not behave as expected (failed to
//!   start, exited non-zero, or printed output that cannot be classified)
//! - VersionError: a version string or version requirement could not be parsed
//! - InstallError: the system package installer refused or failed

use thiserror::Error;

/// Failure of an external tool to honour its expected contract.
///
/// Process failures and unparseable pkg-config output share this type: both
/// mean the environment does not match what the helpers expect.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The command ran but exited unsuccessfully
    #[error("command `{command}` failed with {status}: {stderr}")]
    Invocation {
        command: String,
        status: String,
        stderr: String,
    },

    /// The command could not be started at all
    #[error("failed to run `{command}`: {source}")]
    NotFound {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// pkg-config printed a token the classifier does not understand
    #[error("unsupported pkg-config output for '{package}': unexpected token `{token}`")]
    UnsupportedOutput { package: String, token: String },
}

/// Errors related to version strings and requirements
#[derive(Error, Debug)]
pub enum VersionError {
    /// Recipe version does not look like `<version>-<branch>-<commit>`
    #[error("'{value}' does not match version pattern: {pattern}")]
    InvalidRecipeVersion { value: String, pattern: String },

    /// Version string cannot be read as a version
    #[error("invalid version '{value}': {message}")]
    InvalidVersion { value: String, message: String },

    /// Requirement expression cannot be parsed
    #[error("invalid version requirement '{value}': {message}")]
    InvalidRequirement { value: String, message: String },

    /// Version output pattern is not a valid regex
    #[error("invalid version pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Version output pattern has no group to capture the version with
    #[error("version pattern `{pattern}` has no capture group")]
    PatternWithoutCapture { pattern: String },
}

/// Errors from installing system packages
#[derive(Error, Debug)]
pub enum InstallError {
    /// `CONAN_SYSREQUIRES_MODE` holds an unknown value
    #[error("CONAN_SYSREQUIRES_MODE={value} is not allowed, use one of: enabled, verify, disabled")]
    InvalidMode { value: String },

    /// A package is missing while only verification is allowed
    #[error("aborted due to CONAN_SYSREQUIRES_MODE=verify: '{package}' is not installed")]
    MissingInVerifyMode { package: String },

    /// The package manager ran but failed
    #[error("failed to install '{package}'")]
    Tool {
        package: String,
        #[source]
        source: ToolError,
    },
}

impl ToolError {
    /// Creates a new Invocation error
    pub fn invocation(
        command: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        ToolError::Invocation {
            command: command.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    /// Creates a new NotFound error
    pub fn not_found(command: impl Into<String>, source: std::io::Error) -> Self {
        ToolError::NotFound {
            command: command.into(),
            source,
        }
    }

    /// Creates a new UnsupportedOutput error
    pub fn unsupported_output(package: impl Into<String>, token: impl Into<String>) -> Self {
        ToolError::UnsupportedOutput {
            package: package.into(),
            token: token.into(),
        }
    }
}

impl VersionError {
    /// Creates a new InvalidVersion error
    pub fn invalid_version(value: impl Into<String>, message: impl Into<String>) -> Self {
        VersionError::InvalidVersion {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidRequirement error
    pub fn invalid_requirement(value: impl Into<String>, message: impl Into<String>) -> Self {
        VersionError::InvalidRequirement {
            value: value.into(),
            message: message.into(),
        }
    }
}

impl InstallError {
    /// Creates a new Tool error
    pub fn tool(package: impl Into<String>, source: ToolError) -> Self {
        InstallError::Tool {
            package: package.into(),
            source,
        }
    }
}
