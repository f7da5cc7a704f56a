use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use std::path::Path;

use crate::runtime::{Invocation, Runtime, check_output};
use crate::version::RecipeVersion;

/// Result of checking out a recipe's sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitCheckout {
    pub version: RecipeVersion,
    pub head: String,
    /// Whether the history had to be fetched to reach the commit
    pub unshallowed: bool,
}

/// Check out the sources a recipe version points at.
///
/// The branch named in `version` is cloned shallowly into `folder`. When the
/// branch tip is not the wanted commit, the full history is fetched and the
/// commit checked out.
#[tracing::instrument(skip(runtime))]
pub fn git_source<R: Runtime>(
    runtime: &R,
    url: &str,
    version: &str,
    folder: &Path,
) -> Result<GitCheckout> {
    let version: RecipeVersion = version.parse()?;
    info!(
        "Cloning {} branch {} into {:?}",
        url, version.branch, folder
    );

    let clone = Invocation::new("git").args([
        "clone",
        "--branch",
        version.branch.as_str(),
        "--depth",
        "1",
        url,
    ]);
    check_output(runtime, &clone.arg(folder.display().to_string()))
        .with_context(|| format!("Failed to clone {}", url))?;

    let git = |args: &[&str]| -> Result<String> {
        let invocation = Invocation::new("git")
            .args(args.iter().copied())
            .current_dir(folder);
        Ok(check_output(runtime, &invocation)?.trim().to_string())
    };

    let mut head = git(&["rev-parse", "HEAD"])?;
    debug!("HEAD of {} is {}", version.branch, head);

    let mut unshallowed = false;
    if !head.starts_with(&version.commit) {
        info!(
            "Commit {} is not the tip of {}, fetching full history",
            version.commit, version.branch
        );
        git(&["fetch", "--unshallow"])?;
        git(&["checkout", version.commit.as_str()])
            .with_context(|| format!("Failed to check out {}", version.commit))?;
        head = git(&["rev-parse", "HEAD"])?;
        unshallowed = true;
    }

    Ok(GitCheckout {
        version,
        head,
        unshallowed,
    })
}
