//! File system operations (read, write, copy, glob).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    #[tracing::instrument(skip(self, contents))]
    pub(crate) fn write_impl(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn copy_impl(&self, from: &Path, to: &Path) -> Result<u64> {
        fs::copy(from, to).with_context(|| {
            format!("Failed to copy {} to {}", from.display(), to.display())
        })
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn create_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context("Failed to create directory")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn glob_impl(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let mut paths = glob::glob(pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read glob match")?;
        paths.sort();
        Ok(paths)
    }
}

/// Glob pattern matching `file_pattern` inside `dir`. Glob metacharacters in
/// `dir` are escaped so they match literally.
pub fn glob_in(dir: &Path, file_pattern: &str) -> String {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    Path::new(&escaped)
        .join(file_pattern)
        .to_string_lossy()
        .into_owned()
}
