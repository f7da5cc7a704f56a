use anyhow::Result;
use std::path::Path;

use crate::recipe;
use crate::runtime::Runtime;

use super::print_json;

/// Check out the sources of a recipe version and print what was checked out
pub fn git_source<R: Runtime>(runtime: R, url: &str, version: &str, folder: &Path) -> Result<()> {
    let checkout = recipe::git_source(&runtime, url, version, folder)?;
    print_json(&checkout)
}

/// Apply the patches of a recipe, printing each applied file
pub fn patch<R: Runtime>(runtime: R, patches_dir: &Path, source_folder: &Path) -> Result<()> {
    for applied in recipe::apply_patches(&runtime, patches_dir, source_folder)? {
        println!("{}", applied.display());
    }
    Ok(())
}
