//! External process invocation.
//!
//! An [`Invocation`] carries its own environment overlay and working
//! directory. The overlay only applies to the spawned child; the current
//! process environment is never touched.

use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{RealRuntime, Runtime};
use crate::error::ToolError;

/// A fully described command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Variables added to (or overriding) the inherited environment
    pub env: BTreeMap<String, String>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs<'a, I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// A successful run printing `stdout`
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and `stderr`
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.status {
            Some(code) => format!("exit status: {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

/// Run `invocation` and return its stdout, failing on spawn errors and
/// non-zero exits.
pub fn check_output<R: Runtime + ?Sized>(
    runtime: &R,
    invocation: &Invocation,
) -> Result<String, ToolError> {
    let command = invocation.to_string();
    let output = runtime
        .run(invocation)
        .map_err(|e| ToolError::not_found(command.clone(), e))?;

    if !output.success() {
        return Err(ToolError::invocation(
            command,
            output.status_text(),
            output.stderr.trim(),
        ));
    }
    Ok(output.stdout)
}

impl RealRuntime {
    #[tracing::instrument(skip(self), fields(command = %invocation))]
    pub(crate) fn run_impl(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).envs(&invocation.env);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }
        if !invocation.env.is_empty() {
            debug!("Environment overlay for `{}`: {:?}", invocation, invocation.env);
        }

        let output = command.output()?;
        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
