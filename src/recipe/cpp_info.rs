//! Build metadata exported by a package.
//!
//! [`PcCollector`] turns every `.pc` file of a pkgconfig directory into
//! either one component per package or a single merged [`CppInfo`].

use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ToolError;
use crate::pkgconfig::{
    DefaultLibPathSet, PackageLinkFlags, PkgConfigQuery, PkgConfigTool, QueryEnvironment,
};
use crate::runtime::Runtime;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CppInfo {
    pub includedirs: Vec<String>,
    pub libdirs: Vec<String>,
    pub libs: Vec<String>,
    pub system_libs: Vec<String>,
    pub cflags: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, CppInfo>,
}

impl CppInfo {
    /// Add the fields of `flags`, skipping values already present.
    ///
    /// A library keeps the classification it was first merged with, so a
    /// name is never in both `libs` and `system_libs`.
    pub fn merge(&mut self, flags: &PackageLinkFlags) {
        extend_unique(&mut self.includedirs, &flags.include_dirs);
        extend_unique(&mut self.libdirs, &flags.lib_dirs);
        for lib in &flags.libs {
            if self.system_libs.contains(lib) {
                debug!("{} already merged as a system library", lib);
                continue;
            }
            extend_unique(&mut self.libs, std::slice::from_ref(lib));
        }
        for lib in &flags.system_libs {
            if self.libs.contains(lib) {
                debug!("{} already merged as a project library", lib);
                continue;
            }
            extend_unique(&mut self.system_libs, std::slice::from_ref(lib));
        }
        extend_unique(&mut self.cflags, &flags.cflags);
    }
}

impl From<&PackageLinkFlags> for CppInfo {
    fn from(flags: &PackageLinkFlags) -> Self {
        let mut info = CppInfo::default();
        info.merge(flags);
        info
    }
}

fn extend_unique(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

/// Collects `cpp_info` from the `.pc` files a package installed.
pub struct PcCollector<'a, R: Runtime> {
    runtime: &'a R,
    tool: &'a dyn PkgConfigTool,
    default_paths: &'a DefaultLibPathSet,
    package_folder: PathBuf,
}

impl<'a, R: Runtime> PcCollector<'a, R> {
    pub fn new(
        runtime: &'a R,
        tool: &'a dyn PkgConfigTool,
        default_paths: &'a DefaultLibPathSet,
        package_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            tool,
            default_paths,
            package_folder: package_folder.into(),
        }
    }

    /// One component per package found in `pkgconfig_dir`.
    #[tracing::instrument(skip(self))]
    pub fn collect_components(&self, pkgconfig_dir: &Path) -> Result<CppInfo, ToolError> {
        let mut cpp_info = CppInfo::default();
        for (name, flags) in self.query_dir(pkgconfig_dir)? {
            let component = CppInfo::from(&flags);
            info!(
                "{} LIBRARIES: {:?}, SYSTEM: {:?}",
                name, component.libs, component.system_libs
            );
            cpp_info.components.insert(name, component);
        }
        Ok(cpp_info)
    }

    /// All packages found in `pkgconfig_dir` merged into one set of fields.
    #[tracing::instrument(skip(self))]
    pub fn collect_libs(&self, pkgconfig_dir: &Path) -> Result<CppInfo, ToolError> {
        let mut cpp_info = CppInfo::default();
        for (_, flags) in self.query_dir(pkgconfig_dir)? {
            cpp_info.merge(&flags);
        }
        info!(
            "INCLUDES: {:?}; LIBRARIES: {:?} {:?}; DEFINES={:?}",
            cpp_info.includedirs, cpp_info.libdirs, cpp_info.libs, cpp_info.cflags
        );
        Ok(cpp_info)
    }

    fn query_dir(
        &self,
        pkgconfig_dir: &Path,
    ) -> Result<Vec<(String, PackageLinkFlags)>, ToolError> {
        let names = self.tool.list_package_names_in(pkgconfig_dir)?;
        if self.tool.is_pkgconf() {
            warn!(
                "pkg-config is provided by pkgconf. It does not support PKG_CONFIG_$PKGNAME_$VARIABLE; prefixes are rewritten instead"
            );
        }

        let env = QueryEnvironment::new()
            .with_prefix_overrides(&names, &self.package_folder)
            .with_search_dir(self.runtime, pkgconfig_dir);
        let query = PkgConfigQuery::new(self.tool, self.default_paths)
            .with_environment(env)
            .relocated_to(&self.package_folder);

        names
            .into_iter()
            .map(|name| {
                let flags = query.query(&name)?;
                Ok((name, flags))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkgconfig::{MockPkgConfigTool, RawFlags};
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn runtime() -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq("PKG_CONFIG_PATH"))
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
    }

    fn tool(is_pkgconf: bool) -> MockPkgConfigTool {
        let mut tool = MockPkgConfigTool::new();
        tool.expect_list_package_names_in()
            .withf(|dir| dir.ends_with("lib/pkgconfig"))
            .returning(|_| Ok(vec!["gstreamer-1.0".into(), "gstreamer-base-1.0".into()]));
        tool.expect_is_pkgconf().return_const(is_pkgconf);
        tool.expect_query_flags()
            .withf(|_, env| {
                env.get("PKG_CONFIG_PATH") == Some("/conan/p/gst/lib/pkgconfig")
                    && env.get("PKG_CONFIG_GSTREAMER_BASE_1_0_PREFIX") == Some("/conan/p/gst")
            })
            .returning(|name, _| {
                Ok(match name {
                    "gstreamer-1.0" => RawFlags {
                        cflags_only_i: "-I/conan/p/gst/include/gstreamer-1.0 -I/usr/include/glib-2.0"
                            .into(),
                        cflags_only_other: "-pthread".into(),
                        libs: "-L/conan/p/gst/lib -lgstreamer-1.0 -L/usr/lib -lglib-2.0".into(),
                    },
                    _ => RawFlags {
                        cflags_only_i: "-I/conan/p/gst/include/gstreamer-1.0".into(),
                        cflags_only_other: "-pthread".into(),
                        libs: "-L/conan/p/gst/lib -lgstbase-1.0 -lgstreamer-1.0 -L/usr/lib -lglib-2.0"
                            .into(),
                    },
                })
            });
        tool
    }

    fn defaults() -> DefaultLibPathSet {
        DefaultLibPathSet::from_dirs(["/usr/lib"])
    }

    #[test]
    fn test_collect_components() {
        let runtime = runtime();
        let tool = tool(false);
        let defaults = defaults();
        let collector = PcCollector::new(&runtime, &tool, &defaults, "/conan/p/gst");

        let info = collector
            .collect_components(Path::new("/conan/p/gst/lib/pkgconfig"))
            .unwrap();
        assert_eq!(info.components.len(), 2);
        assert!(info.libs.is_empty());

        let base = &info.components["gstreamer-base-1.0"];
        assert_eq!(base.libs, vec!["gstbase-1.0", "gstreamer-1.0"]);
        assert_eq!(base.system_libs, vec!["glib-2.0"]);
        assert_eq!(base.libdirs, vec!["/conan/p/gst/lib"]);
    }

    #[test]
    fn test_collect_libs_merges_without_duplicates() {
        let runtime = runtime();
        let tool = tool(false);
        let defaults = defaults();
        let collector = PcCollector::new(&runtime, &tool, &defaults, "/conan/p/gst");

        let info = collector
            .collect_libs(Path::new("/conan/p/gst/lib/pkgconfig"))
            .unwrap();
        assert!(info.components.is_empty());
        assert_eq!(info.libs, vec!["gstreamer-1.0", "gstbase-1.0"]);
        assert_eq!(info.system_libs, vec!["glib-2.0"]);
        assert_eq!(
            info.includedirs,
            vec!["/conan/p/gst/include/gstreamer-1.0", "/usr/include/glib-2.0"]
        );
        assert_eq!(info.cflags, vec!["-pthread"]);
    }

    #[test_log::test]
    fn test_collect_with_pkgconf_relocates_declared_prefix() {
        let runtime = runtime();
        let mut tool = MockPkgConfigTool::new();
        tool.expect_list_package_names_in()
            .returning(|_| Ok(vec!["gstreamer-1.0".into()]));
        tool.expect_is_pkgconf().return_const(true);
        tool.expect_query_flags().returning(|_, _| {
            Ok(RawFlags {
                cflags_only_i: "-I/build/gst/include/gstreamer-1.0 -I/usr/include/glib-2.0".into(),
                cflags_only_other: String::new(),
                libs: "-L/build/gst/lib -lgstreamer-1.0 -L/usr/lib -lglib-2.0".into(),
            })
        });
        tool.expect_variable()
            .withf(|pkg, name, _| pkg == "gstreamer-1.0" && name == "prefix")
            .returning(|_, _, _| Ok("/build/gst".into()));
        let defaults = defaults();
        let collector = PcCollector::new(&runtime, &tool, &defaults, "/conan/p/gst");

        let info = collector
            .collect_libs(Path::new("/conan/p/gst/lib/pkgconfig"))
            .unwrap();
        assert_eq!(info.libdirs, vec!["/conan/p/gst/lib"]);
        assert_eq!(
            info.includedirs,
            vec!["/conan/p/gst/include/gstreamer-1.0", "/usr/include/glib-2.0"]
        );
        assert_eq!(info.libs, vec!["gstreamer-1.0"]);
        assert_eq!(info.system_libs, vec!["glib-2.0"]);
    }

    #[test]
    fn test_collect_libs_keeps_first_classification() {
        let runtime = runtime();
        let mut tool = MockPkgConfigTool::new();
        tool.expect_list_package_names_in()
            .returning(|_| Ok(vec!["a".into(), "b".into()]));
        tool.expect_is_pkgconf().return_const(false);
        tool.expect_query_flags().returning(|name, _| {
            Ok(RawFlags {
                libs: match name {
                    "a" => "-L/usr/lib -lfoo",
                    _ => "-L/opt/b/lib -lfoo -lbar",
                }
                .into(),
                ..Default::default()
            })
        });
        let defaults = defaults();
        let collector = PcCollector::new(&runtime, &tool, &defaults, "/opt/b");

        let info = collector.collect_libs(Path::new("/opt/b/lib/pkgconfig")).unwrap();
        assert_eq!(info.system_libs, vec!["foo"]);
        assert_eq!(info.libs, vec!["bar"]);
    }

    #[test]
    fn test_merge_never_puts_a_name_in_both_lists() {
        let mut info = CppInfo::default();
        info.merge(&PackageLinkFlags {
            libs: vec!["z".into()],
            system_libs: vec!["m".into()],
            ..Default::default()
        });
        info.merge(&PackageLinkFlags {
            libs: vec!["m".into(), "png".into()],
            system_libs: vec!["z".into(), "dl".into()],
            ..Default::default()
        });
        assert_eq!(info.libs, vec!["z", "png"]);
        assert_eq!(info.system_libs, vec!["m", "dl"]);
    }

    #[test]
    fn test_collect_stops_on_unsupported_output() {
        let runtime = runtime();
        let mut tool = MockPkgConfigTool::new();
        tool.expect_list_package_names_in()
            .returning(|_| Ok(vec!["odd".into()]));
        tool.expect_is_pkgconf().return_const(false);
        tool.expect_query_flags().returning(|_, _| {
            Ok(RawFlags {
                libs: "/usr/lib/libodd.a".into(),
                ..Default::default()
            })
        });
        let defaults = defaults();
        let collector = PcCollector::new(&runtime, &tool, &defaults, "/pkg");

        let err = collector.collect_libs(Path::new("/pkg/lib/pkgconfig")).unwrap_err();
        assert!(matches!(err, ToolError::UnsupportedOutput { .. }));
    }

    #[test]
    fn test_serialize_skips_empty_components() {
        let info = CppInfo {
            libs: vec!["z".into()],
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("components").is_none());
        assert_eq!(json["libs"][0], "z");
    }
}
