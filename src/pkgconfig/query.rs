use log::{debug, info};
use std::path::PathBuf;

use super::env::QueryEnvironment;
use super::flags::{PackageLinkFlags, parse_package_flags};
use super::linker::DefaultLibPathSet;
use super::prefix::PrefixRewrite;
use super::tool::PkgConfigTool;
use crate::error::ToolError;

/// Queries packages through one pkg-config tool.
///
/// When a package folder is set and the tool is pkgconf, paths are moved
/// from the prefix declared in the `.pc` file to the package folder, since
/// pkgconf ignores `PKG_CONFIG_<PKG>_PREFIX`.
pub struct PkgConfigQuery<'a> {
    tool: &'a dyn PkgConfigTool,
    default_paths: &'a DefaultLibPathSet,
    env: QueryEnvironment,
    package_folder: Option<PathBuf>,
}

impl<'a> PkgConfigQuery<'a> {
    pub fn new(tool: &'a dyn PkgConfigTool, default_paths: &'a DefaultLibPathSet) -> Self {
        Self {
            tool,
            default_paths,
            env: QueryEnvironment::new(),
            package_folder: None,
        }
    }

    pub fn with_environment(mut self, env: QueryEnvironment) -> Self {
        self.env = env;
        self
    }

    pub fn relocated_to(mut self, package_folder: impl Into<PathBuf>) -> Self {
        self.package_folder = Some(package_folder.into());
        self
    }

    #[tracing::instrument(skip(self))]
    pub fn query(&self, package: &str) -> Result<PackageLinkFlags, ToolError> {
        let raw = self.tool.query_flags(package, &self.env)?;
        debug!("{}: {:?}", package, raw);
        let flags = parse_package_flags(package, &raw, self.default_paths)?;

        match self.relocation(package)? {
            Some(rewrite) => {
                info!(
                    "{}: replacing prefix {} with {}",
                    package,
                    rewrite.old(),
                    rewrite.new_prefix()
                );
                Ok(rewrite.apply(flags))
            }
            None => Ok(flags),
        }
    }

    fn relocation(&self, package: &str) -> Result<Option<PrefixRewrite>, ToolError> {
        let Some(folder) = &self.package_folder else {
            return Ok(None);
        };
        if !self.tool.is_pkgconf() {
            return Ok(None);
        }

        let declared = self.tool.variable(package, "prefix", &self.env)?;
        let rewrite = PrefixRewrite::new(&declared, folder.display().to_string());
        if rewrite.is_noop() {
            Ok(None)
        } else {
            Ok(Some(rewrite))
        }
    }
}
