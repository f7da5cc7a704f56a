//! Runtime abstraction for host operations.
//!
//! Every helper reaches the host (environment, executables, file system)
//! through the [`Runtime`] trait so recipes can be exercised against a
//! mocked host in tests.
//!
//! # Structure
//!
//! - `env` - Environment variables, executable lookup and privilege checks
//! - `fs` - File system operations (read, write, copy, glob)
//! - `process` - External process invocation with explicit environment overlays

mod env;
mod fs;
mod process;

use anyhow::Result;
use std::env as std_env;
use std::path::{Path, PathBuf};

pub use fs::glob_in;
pub use process::{Invocation, ProcessOutput, check_output};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    /// Look up an executable on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;

    /// Whether the current process runs with administrator rights.
    fn is_privileged(&self) -> bool;

    // Processes
    /// Run an external program to completion and capture its output.
    ///
    /// Only a failure to spawn is an error; a non-zero exit is reported
    /// through [`ProcessOutput::status`].
    fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput>;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn copy(&self, from: &Path, to: &Path) -> Result<u64>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Expand a glob pattern. Results are sorted.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.which_impl(program)
    }

    fn is_privileged(&self) -> bool {
        self.is_privileged_impl()
    }

    fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput> {
        self.run_impl(invocation)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<u64> {
        self.copy_impl(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        self.glob_impl(pattern)
    }
}
