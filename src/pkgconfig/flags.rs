//! Classification of pkg-config flag output.
//!
//! Linker flags are read in order: each `-L` directory decides whether the
//! `-l` names after it are linked from this build ("project" libraries) or
//! found by the linker on its own ("system" libraries).

use log::{debug, warn};
use serde::Serialize;

use super::linker::DefaultLibPathSet;
use super::tool::RawFlags;
use crate::error::ToolError;

pub const INCLUDE_MARKER: &str = "-I";
pub const LIB_PATH_MARKER: &str = "-L";
pub const LIB_NAME_MARKER: &str = "-l";
pub const LINKER_PASSTHROUGH_MARKER: &str = "-Wl";

/// Parsed flags of one package.
///
/// Library names are kept in link order without duplicates, and a name is
/// never in both `libs` and `system_libs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageLinkFlags {
    pub include_dirs: Vec<String>,
    pub lib_dirs: Vec<String>,
    pub libs: Vec<String>,
    pub system_libs: Vec<String>,
    pub cflags: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Project,
    System,
}

/// Split pkg-config output into tokens.
///
/// Tokens are separated by whitespace; a backslash makes the next character
/// literal, which is how pkg-config prints paths containing spaces.
pub fn split_flags(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Classify the tokens of a `--libs` output into `flags`.
pub fn classify_link_flags(
    package: &str,
    libs_output: &str,
    default_paths: &DefaultLibPathSet,
    flags: &mut PackageLinkFlags,
) -> Result<(), ToolError> {
    let mut target = Target::Project;

    for token in split_flags(libs_output) {
        if let Some(dir) = token.strip_prefix(LIB_PATH_MARKER) {
            if default_paths.contains(dir) {
                debug!("{}: {} is a default linker directory", package, dir);
                target = Target::System;
            } else {
                push_unique(&mut flags.lib_dirs, dir);
                target = Target::Project;
            }
        } else if token.starts_with(LINKER_PASSTHROUGH_MARKER) {
            debug!("{}: ignoring linker flag {}", package, token);
        } else if let Some(name) = token.strip_prefix(LIB_NAME_MARKER) {
            // First classification of a name wins
            if flags.libs.iter().any(|l| l == name) || flags.system_libs.iter().any(|l| l == name)
            {
                continue;
            }
            match target {
                Target::Project => flags.libs.push(name.to_string()),
                Target::System => flags.system_libs.push(name.to_string()),
            }
        } else {
            return Err(ToolError::unsupported_output(package, token));
        }
    }

    if let Some(message) = shadowing_warning(package, flags) {
        warn!("{}", message);
    }
    Ok(())
}

/// The warning to log when project libraries come from more than one
/// directory.
fn shadowing_warning(package: &str, flags: &PackageLinkFlags) -> Option<String> {
    (flags.lib_dirs.len() > 1).then(|| {
        format!(
            "{} has libraries in several directories {:?}; a library in one may shadow a same-named one in another",
            package, flags.lib_dirs
        )
    })
}

/// Build [`PackageLinkFlags`] from the raw outputs of one package.
pub fn parse_package_flags(
    package: &str,
    raw: &RawFlags,
    default_paths: &DefaultLibPathSet,
) -> Result<PackageLinkFlags, ToolError> {
    let mut flags = PackageLinkFlags::default();

    for token in split_flags(&raw.cflags_only_i) {
        match token.strip_prefix(INCLUDE_MARKER) {
            Some(dir) => push_unique(&mut flags.include_dirs, dir),
            None => return Err(ToolError::unsupported_output(package, token)),
        }
    }
    flags.cflags = split_flags(&raw.cflags_only_other);

    classify_link_flags(package, &raw.libs, default_paths, &mut flags)?;
    Ok(flags)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> DefaultLibPathSet {
        DefaultLibPathSet::from_dirs(["/usr/lib", "/lib", "/usr/lib/x86_64-linux-gnu"])
    }

    fn classify(libs: &str) -> Result<PackageLinkFlags, ToolError> {
        let mut flags = PackageLinkFlags::default();
        classify_link_flags("pkg", libs, &defaults(), &mut flags)?;
        Ok(flags)
    }

    #[test]
    fn test_split_flags_whitespace_and_escapes() {
        assert_eq!(
            split_flags("  -I/usr/include\t-DFOO=1\n"),
            vec!["-I/usr/include", "-DFOO=1"]
        );
        assert_eq!(
            split_flags(r"-L/opt/my\ libs -lfoo"),
            vec!["-L/opt/my libs", "-lfoo"]
        );
        assert!(split_flags("   ").is_empty());
    }

    #[test]
    fn test_system_then_project() {
        let flags = classify("-L/usr/lib -lA -L/opt/proj/lib -lB").unwrap();
        assert_eq!(flags.system_libs, vec!["A"]);
        assert_eq!(flags.libs, vec!["B"]);
        assert_eq!(flags.lib_dirs, vec!["/opt/proj/lib"]);
    }

    #[test]
    fn test_passthrough_is_ignored() {
        let flags = classify("-L/usr/lib -lfoo -L/opt/pkg/lib -lbar -Wl,--as-needed").unwrap();
        assert_eq!(flags.system_libs, vec!["foo"]);
        assert_eq!(flags.libs, vec!["bar"]);
        assert_eq!(flags.lib_dirs, vec!["/opt/pkg/lib"]);
    }

    #[test]
    fn test_names_before_any_dir_are_project() {
        let flags = classify("-lz -L/usr/lib -lm").unwrap();
        assert_eq!(flags.libs, vec!["z"]);
        assert_eq!(flags.system_libs, vec!["m"]);
        assert!(flags.lib_dirs.is_empty());
    }

    #[test]
    fn test_default_dir_with_trailing_slash() {
        let flags = classify("-L/usr/lib/ -lpthread").unwrap();
        assert_eq!(flags.system_libs, vec!["pthread"]);
    }

    #[test]
    fn test_name_never_in_both_sets() {
        let flags = classify("-L/usr/lib -lm -L/opt/a/lib -lm -la -la").unwrap();
        assert_eq!(flags.system_libs, vec!["m"]);
        assert_eq!(flags.libs, vec!["a"]);
    }

    #[test]
    fn test_malformed_token_is_unsupported_output() {
        let err = classify("-L/opt/lib -lfoo -pthread").unwrap_err();
        match err {
            ToolError::UnsupportedOutput { package, token } => {
                assert_eq!(package, "pkg");
                assert_eq!(token, "-pthread");
            }
            other => panic!("Expected UnsupportedOutput, got {:?}", other),
        }

        assert!(classify("/opt/lib/libfoo.a").is_err());
    }

    #[test_log::test]
    fn test_multiple_project_dirs_warn_but_succeed() {
        let flags = classify("-L/opt/a/lib -la -L/opt/b/lib -lb").unwrap();
        assert_eq!(flags.lib_dirs, vec!["/opt/a/lib", "/opt/b/lib"]);
        assert_eq!(flags.libs, vec!["a", "b"]);

        let warning = shadowing_warning("pkg", &flags).unwrap();
        assert!(warning.starts_with("pkg has libraries in several directories"));
        assert!(warning.contains("/opt/a/lib") && warning.contains("/opt/b/lib"));
    }

    #[test]
    fn test_single_project_dir_does_not_warn() {
        let flags = classify("-L/opt/a/lib -la -L/usr/lib -lm").unwrap();
        assert_eq!(flags.lib_dirs, vec!["/opt/a/lib"]);
        assert!(shadowing_warning("pkg", &flags).is_none());
    }

    #[test]
    fn test_parse_package_flags() {
        let raw = RawFlags {
            cflags_only_i: "-I/opt/gst/include/gstreamer-1.0 -I/usr/include/glib-2.0".into(),
            cflags_only_other: "-pthread -DGST_USE_UNSTABLE_API".into(),
            libs: "-L/opt/gst/lib -lgstreamer-1.0 -L/usr/lib -lglib-2.0".into(),
        };
        let flags = parse_package_flags("gstreamer-1.0", &raw, &defaults()).unwrap();

        assert_eq!(
            flags.include_dirs,
            vec!["/opt/gst/include/gstreamer-1.0", "/usr/include/glib-2.0"]
        );
        assert_eq!(flags.cflags, vec!["-pthread", "-DGST_USE_UNSTABLE_API"]);
        assert_eq!(flags.lib_dirs, vec!["/opt/gst/lib"]);
        assert_eq!(flags.libs, vec!["gstreamer-1.0"]);
        assert_eq!(flags.system_libs, vec!["glib-2.0"]);
    }

    #[test]
    fn test_parse_package_flags_rejects_non_include_in_include_output() {
        let raw = RawFlags {
            cflags_only_i: "-DFOO".into(),
            ..Default::default()
        };
        assert!(parse_package_flags("x", &raw, &defaults()).is_err());
    }
}
