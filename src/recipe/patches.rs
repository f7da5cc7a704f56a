use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::runtime::{Invocation, Runtime, check_output, glob_in};

/// Apply every `*.diff` in `patches_dir` to `source_folder`, in file name
/// order, with `patch -p1`.
#[tracing::instrument(skip(runtime))]
pub fn apply_patches<R: Runtime>(
    runtime: &R,
    patches_dir: &Path,
    source_folder: &Path,
) -> Result<Vec<PathBuf>> {
    let patches = runtime.glob(&glob_in(patches_dir, "*.diff"))?;

    for patch in &patches {
        info!("applying patch {:?}", patch);
        let patch_file = std::path::absolute(patch)
            .with_context(|| format!("Failed to resolve {:?}", patch))?;
        let invocation = Invocation::new("patch")
            .args(["-p1", "-i"])
            .arg(patch_file.display().to_string())
            .current_dir(source_folder);
        check_output(runtime, &invocation)
            .with_context(|| format!("Failed to apply patch {:?}", patch))?;
    }
    Ok(patches)
}
