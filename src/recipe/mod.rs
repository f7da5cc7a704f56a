//! Helpers for writing Conan recipes of native libraries.
//!
//! - `host` - which distribution the recipe is built on
//! - `conandata` - per-host requirement sections of `conandata.yml`
//! - `installer` - system package managers
//! - `requirements` - resolving system libraries and build commands
//! - `git` - checking out the sources a recipe version points at
//! - `patches` - applying `patches/*.diff`
//! - `pc_files` - copying and editing `.pc` and other text files
//! - `cpp_info` - exported build metadata collected from `.pc` files

mod conandata;
mod cpp_info;
mod git;
mod host;
mod installer;
mod patches;
mod pc_files;
mod requirements;

pub use conandata::{ConanData, Field, PackageMap, RequirementSection, SelectedRequirements};
pub use cpp_info::{CppInfo, PcCollector};
pub use git::{GitCheckout, git_source};
pub use host::HostOs;
pub use installer::{
    InstallMode, MODE_ENV, PackageInstaller, PackageManager, SUDO_ENV, SystemPackageInstaller,
};
pub use patches::apply_patches;
pub use pc_files::{copy_pkg_config, replace_prefix_in_pc_file, replace_regex_in_file};
pub use requirements::{
    RequirementsReport, Resolution, build_requirements, libpkg_exists, system_requirements,
};
