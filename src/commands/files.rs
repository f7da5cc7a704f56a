use anyhow::Result;
use std::path::Path;

use crate::recipe::{copy_pkg_config, replace_regex_in_file};
use crate::runtime::Runtime;

/// Copy a dependency's `.pc` files into `dest` with their prefix set to
/// `root`
pub fn copy_pc<R: Runtime>(runtime: R, root: &Path, dest: &Path) -> Result<()> {
    let copied = copy_pkg_config(&runtime, root, dest)?;
    if copied.is_empty() {
        println!("No .pc files found under {}", root.display());
    }
    for path in copied {
        println!("{}", path.display());
    }
    Ok(())
}

/// Regex replacement in a file, printing the number of replacements
pub fn replace<R: Runtime>(
    runtime: R,
    path: &Path,
    pattern: &str,
    replacement: &str,
    strict: bool,
) -> Result<()> {
    let count = replace_regex_in_file(&runtime, path, pattern, replacement, strict)?;
    println!("{}", count);
    Ok(())
}
