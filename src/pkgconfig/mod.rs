//! pkg-config queries and their normalization into build metadata.
//!
//! - `tool` - the `pkg-config` / `pkgconf` executables behind one interface
//! - `env` - per-query environment overlays (`PKG_CONFIG_PATH`, prefix overrides)
//! - `flags` - classification of cflags and linker flags
//! - `linker` - default linker search directories
//! - `prefix` - relocation of declared install prefixes
//! - `query` - the per-package query tying all of the above together

mod env;
mod flags;
mod linker;
mod prefix;
mod query;
mod tool;

pub use env::{QueryEnvironment, prefix_variable_name};
pub use flags::{
    INCLUDE_MARKER, LIB_NAME_MARKER, LIB_PATH_MARKER, LINKER_PASSTHROUGH_MARKER,
    PackageLinkFlags, classify_link_flags, parse_package_flags, split_flags,
};
pub use linker::DefaultLibPathSet;
pub use prefix::PrefixRewrite;
pub use query::PkgConfigQuery;
pub use tool::{
    DEFAULT_EXECUTABLE, Executable, FreedesktopPkgConfig, PkgConfigTool, Pkgconf, RawFlags, detect,
    detect_executable, executable_path,
};

#[cfg(test)]
pub use tool::MockPkgConfigTool;
