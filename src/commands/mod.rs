use anyhow::Result;
use serde::Serialize;

use crate::pkgconfig::{PkgConfigTool, detect, detect_executable};
use crate::runtime::Runtime;

mod files;
mod pkgconfig;
mod requirements;
mod source;
mod version;

pub use files::{copy_pc, replace};
pub use pkgconfig::{collect, default_lib_dirs, exists, list, query};
pub use requirements::{buildreqs, sysreqs};
pub use source::{git_source, patch};
pub use version::{check_pkg_version, check_version, parse_version};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The tool named on the command line, or the one from `$PKG_CONFIG`.
fn pkg_config_tool<'a, R: Runtime>(
    runtime: &'a R,
    executable: Option<String>,
) -> Box<dyn PkgConfigTool + 'a> {
    match executable {
        Some(path) => detect_executable(runtime, path),
        None => detect(runtime),
    }
}
