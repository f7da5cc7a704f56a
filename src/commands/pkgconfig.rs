use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::pkgconfig::{DefaultLibPathSet, PackageLinkFlags, PkgConfigQuery, QueryEnvironment};
use crate::recipe::{PcCollector, libpkg_exists};
use crate::runtime::Runtime;

use super::{pkg_config_tool, print_json};

/// Query packages and print their classified flags as JSON
#[tracing::instrument(skip(runtime))]
pub fn query<R: Runtime>(
    runtime: R,
    pkg_config: Option<String>,
    packages: &[String],
    pkgconfig_dir: Option<PathBuf>,
    package_folder: Option<PathBuf>,
) -> Result<()> {
    let default_paths = DefaultLibPathSet::discover(&runtime)
        .context("Failed to read the default linker search directories")?;
    let tool = pkg_config_tool(&runtime, pkg_config);
    info!("Using {} ({})", tool.executable(), tool.version()?);

    let mut env = QueryEnvironment::new();
    if let Some(dir) = &pkgconfig_dir {
        env = env.with_search_dir(&runtime, dir);
    }
    if let Some(folder) = &package_folder {
        env = env.with_prefix_overrides(packages, folder);
    }

    let mut query = PkgConfigQuery::new(tool.as_ref(), &default_paths).with_environment(env);
    if let Some(folder) = package_folder {
        query = query.relocated_to(folder);
    }

    let mut results: BTreeMap<&str, PackageLinkFlags> = BTreeMap::new();
    for package in packages {
        let flags = query
            .query(package)
            .with_context(|| format!("Failed to query {}", package))?;
        results.insert(package.as_str(), flags);
    }
    print_json(&results)
}

/// Print the package names known to pkg-config, optionally only those in
/// `dir`
#[tracing::instrument(skip(runtime))]
pub fn list<R: Runtime>(
    runtime: R,
    pkg_config: Option<String>,
    dir: Option<PathBuf>,
) -> Result<()> {
    let tool = pkg_config_tool(&runtime, pkg_config);
    let names = match &dir {
        Some(dir) => tool.list_package_names_in(dir)?,
        None => tool.list_package_names()?,
    };
    debug!("Found {} package(s)", names.len());
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

/// Whether pkg-config knows `package`
pub fn exists<R: Runtime>(runtime: R, pkg_config: Option<String>, package: &str) -> Result<bool> {
    let tool = pkg_config_tool(&runtime, pkg_config);
    Ok(libpkg_exists(tool.as_ref(), package))
}

/// Print the `cpp_info` collected from a pkgconfig directory as JSON
#[tracing::instrument(skip(runtime))]
pub fn collect<R: Runtime>(
    runtime: R,
    pkg_config: Option<String>,
    pkgconfig_dir: &Path,
    package_folder: &Path,
    components: bool,
) -> Result<()> {
    let default_paths = DefaultLibPathSet::discover(&runtime)
        .context("Failed to read the default linker search directories")?;
    let tool = pkg_config_tool(&runtime, pkg_config);
    let collector = PcCollector::new(&runtime, tool.as_ref(), &default_paths, package_folder);

    let cpp_info = if components {
        collector.collect_components(pkgconfig_dir)?
    } else {
        collector.collect_libs(pkgconfig_dir)?
    };
    print_json(&cpp_info)
}

/// Print the linker's default search directories
pub fn default_lib_dirs<R: Runtime>(runtime: R) -> Result<()> {
    let dirs = DefaultLibPathSet::discover(&runtime)?;
    for dir in dirs.iter() {
        println!("{}", dir);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, ProcessOutput};
    use crate::test_utils::expect_freedesktop_pkg_config;
    use mockall::predicate::eq;

    const LD: &str = r#"SEARCH_DIR("=/usr/lib"); SEARCH_DIR("=/lib");"#;

    fn runtime_with_pkg_config() -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|inv| inv.program == "ld")
            .returning(|_| Ok(ProcessOutput::ok(LD)));
        expect_freedesktop_pkg_config(&mut runtime);
        runtime
            .expect_run()
            .withf(|inv| inv.program == "pkg-config" && inv.args == ["--version"])
            .returning(|_| Ok(ProcessOutput::ok("0.29.2\n")));
        runtime
    }

    #[test]
    fn test_query_with_overrides() {
        let mut runtime = runtime_with_pkg_config();
        runtime
            .expect_env_var()
            .with(eq("PKG_CONFIG_PATH"))
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
            .expect_run()
            .withf(|inv| {
                inv.program == "pkg-config"
                    && inv.env.get("PKG_CONFIG_ZLIB_PREFIX").map(String::as_str)
                        == Some("/conan/p/zlib")
                    && inv.env.get("PKG_CONFIG_PATH").map(String::as_str)
                        == Some("/conan/p/zlib/lib/pkgconfig")
            })
            .returning(|inv| {
                Ok(ProcessOutput::ok(match inv.args[0].as_str() {
                    "--cflags-only-I" => "-I/conan/p/zlib/include",
                    "--libs" => "-L/conan/p/zlib/lib -lz",
                    _ => "",
                }))
            });

        query(
            runtime,
            Some("pkg-config".into()),
            &["zlib".to_string()],
            Some(PathBuf::from("/conan/p/zlib/lib/pkgconfig")),
            Some(PathBuf::from("/conan/p/zlib")),
        )
        .unwrap();
    }

    #[test]
    fn test_query_missing_package_fails() {
        let mut runtime = runtime_with_pkg_config();
        runtime
            .expect_run()
            .withf(|inv| inv.args.last().map(String::as_str) == Some("nope"))
            .returning(|_| Ok(ProcessOutput::failed(1, "Package nope was not found")));

        let err = query(
            runtime,
            Some("pkg-config".into()),
            &["nope".to_string()],
            None,
            None,
        )
        .unwrap_err();
        assert!(format!("{}", err).contains("Failed to query nope"));
    }

    #[test]
    fn test_exists() {
        let mut runtime = MockRuntime::new();
        expect_freedesktop_pkg_config(&mut runtime);
        runtime
            .expect_run()
            .withf(|inv| inv.args == ["--exists", "zlib"])
            .returning(|_| Ok(ProcessOutput::ok("")));

        assert!(exists(runtime, Some("pkg-config".into()), "zlib").unwrap());
    }

    #[test]
    fn test_default_lib_dirs_requires_ld() {
        let mut runtime = MockRuntime::new();
        runtime.expect_run().returning(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "ld"))
        });
        assert!(default_lib_dirs(runtime).is_err());
    }
}
