//! Editing of generated `.pc` files and other text files.

use anyhow::{Context, Result, bail};
use log::{info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::runtime::{Runtime, glob_in};

const PREFIX_LINE: &str = "prefix=";

/// Copy the `.pc` files of a dependency installed at `root` into `dest` and
/// point their `prefix` at `root`.
///
/// Files are taken from `<root>/lib/pkgconfig`, or from `<root>` itself when
/// that directory has none.
#[tracing::instrument(skip(runtime))]
pub fn copy_pkg_config<R: Runtime>(
    runtime: &R,
    root: &Path,
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    info!("prefix in pc file will be replaced with {}", root.display());

    let pc_dir = root.join("lib").join("pkgconfig");
    let mut pc_files = runtime.glob(&glob_in(&pc_dir, "*.pc"))?;
    if pc_files.is_empty() {
        pc_files = runtime.glob(&glob_in(root, "*.pc"))?;
    }

    runtime.create_dir_all(dest)?;
    let mut copied = Vec::with_capacity(pc_files.len());
    for pc_file in pc_files {
        let Some(name) = pc_file.file_name() else {
            continue;
        };
        let target = dest.join(name);
        warn!("copy and modify .pc file {}", pc_file.display());
        runtime.copy(&pc_file, &target)?;
        replace_prefix_in_pc_file(runtime, &target, &root.display().to_string())?;
        copied.push(target);
    }
    Ok(copied)
}

/// Replace the value of every `prefix=` line.
pub fn replace_prefix_in_pc_file<R: Runtime>(
    runtime: &R,
    pc_file: &Path,
    prefix: &str,
) -> Result<()> {
    let content = runtime.read_to_string(pc_file)?;
    let rewritten = replace_prefix_line(&content, prefix);
    runtime.write(pc_file, rewritten.as_bytes())
}

fn replace_prefix_line(content: &str, prefix: &str) -> String {
    let mut out: Vec<String> = content
        .lines()
        .map(|line| {
            if line.starts_with(PREFIX_LINE) {
                format!("{}{}", PREFIX_LINE, prefix)
            } else {
                line.to_string()
            }
        })
        .collect();
    if content.ends_with('\n') {
        out.push(String::new());
    }
    out.join("\n")
}

/// Regex substitution over a whole file. The replacement may refer to
/// groups as `$1` or `${name}`.
///
/// Returns the number of replacements. When nothing matches the file is left
/// as is; with `strict` that is an error, otherwise a warning.
#[tracing::instrument(skip(runtime, replacement))]
pub fn replace_regex_in_file<R: Runtime>(
    runtime: &R,
    path: &Path,
    pattern: &str,
    replacement: &str,
    strict: bool,
) -> Result<usize> {
    let regex = Regex::new(pattern).with_context(|| format!("Invalid pattern `{}`", pattern))?;
    let content = runtime.read_to_string(path)?;

    let count = regex.find_iter(&content).count();
    if count == 0 {
        if strict {
            bail!(
                "replace_regex_in_file didn't find pattern `{}` in {}",
                pattern,
                path.display()
            );
        }
        warn!(
            "replace_regex_in_file didn't find pattern `{}` in {}",
            pattern,
            path.display()
        );
        return Ok(0);
    }

    let replaced = regex.replace_all(&content, replacement);
    runtime.write(path, replaced.as_bytes())?;
    Ok(count)
}
