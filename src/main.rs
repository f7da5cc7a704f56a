use anyhow::Result;
use clap::Parser;
use recipe_kit::commands;
use recipe_kit::recipe::HostOs;
use std::path::PathBuf;
use std::process::ExitCode;

/// recipe-kit - helpers for Conan recipes built on system libraries
///
/// Queries pkg-config and classifies its flags, gates tool versions,
/// resolves conandata system requirements and prepares recipe sources.
///
/// Examples:
///   recipe-kit query zlib libpng         # Classified flags as JSON
///   recipe-kit check-version cmake '>=3.15'
///   recipe-kit sysreqs --conandata conandata.yml
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// pkg-config executable (defaults to pkg-config; also via PKG_CONFIG)
    #[arg(long = "pkg-config", env = "PKG_CONFIG", value_name = "PATH", global = true)]
    pub pkg_config: Option<String>,

    /// Log progress at info level (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Split a `<version>-<branch>-<commit>` recipe version
    ParseVersion(ParseVersionArgs),

    /// Check the version printed by a command
    CheckVersion(CheckVersionArgs),

    /// Check the version pkg-config reports for a package
    CheckPkgVersion(CheckPkgVersionArgs),

    /// Print classified pkg-config flags for packages as JSON
    Query(QueryArgs),

    /// List the packages pkg-config knows
    List(ListArgs),

    /// Exit successfully if pkg-config knows a package
    Exists(ExistsArgs),

    /// Collect cpp_info from the .pc files of a directory
    Collect(CollectArgs),

    /// Print the linker's default library directories
    DefaultLibDirs,

    /// Copy a dependency's .pc files with their prefix rewritten
    CopyPc(CopyPcArgs),

    /// Regex replacement inside a file
    Replace(ReplaceArgs),

    /// Resolve the system-packages of a conandata file
    Sysreqs(SysreqsArgs),

    /// Resolve the required-commands of a conandata file
    Buildreqs(BuildreqsArgs),

    /// Shallow clone the sources of a recipe version
    GitSource(GitSourceArgs),

    /// Apply the *.diff patches of a recipe
    Patch(PatchArgs),
}

#[derive(clap::Args, Debug)]
pub struct ParseVersionArgs {
    #[arg(value_name = "VERSION")]
    pub version: String,
}

#[derive(clap::Args, Debug)]
pub struct CheckVersionArgs {
    /// Command to run
    pub command: String,

    /// Version requirement, e.g. ">=3.15"
    pub requirement: String,

    /// Argument that makes the command print its version (repeatable)
    #[arg(long = "version-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub version_args: Vec<String>,

    /// Regex whose first capture group is the version
    #[arg(long)]
    pub pattern: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CheckPkgVersionArgs {
    pub package: String,

    /// Version requirement, e.g. ">=1.2.11"
    pub requirement: String,

    /// Regex whose first capture group is the version
    #[arg(long)]
    pub pattern: Option<String>,

    /// Directory searched for .pc files first
    #[arg(long, value_name = "DIR")]
    pub pkgconfig_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct QueryArgs {
    #[arg(required = true, value_name = "PACKAGE")]
    pub packages: Vec<String>,

    /// Directory searched for .pc files first
    #[arg(long, value_name = "DIR")]
    pub pkgconfig_dir: Option<PathBuf>,

    /// Relocate the packages' prefix to this folder
    #[arg(long, env = "RECIPE_KIT_PACKAGE_FOLDER", value_name = "DIR")]
    pub package_folder: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only list the .pc files of this directory
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ExistsArgs {
    pub package: String,
}

#[derive(clap::Args, Debug)]
pub struct CollectArgs {
    /// Directory holding the .pc files
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Package folder the prefixes are relocated to
    #[arg(long, env = "RECIPE_KIT_PACKAGE_FOLDER", value_name = "DIR")]
    pub package_folder: PathBuf,

    /// One component per .pc file instead of merged libs
    #[arg(long)]
    pub components: bool,
}

#[derive(clap::Args, Debug)]
pub struct CopyPcArgs {
    /// Root of the dependency
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Destination directory
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub dest: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ReplaceArgs {
    pub file: PathBuf,
    pub pattern: String,
    pub replacement: String,

    /// Warn instead of failing when nothing matches
    #[arg(long)]
    pub lenient: bool,
}

#[derive(clap::Args, Debug)]
pub struct SysreqsArgs {
    #[arg(long, default_value = "conandata.yml", value_name = "FILE")]
    pub conandata: PathBuf,

    /// Library to skip (repeatable)
    #[arg(long, value_name = "LIB")]
    pub exclude: Vec<String>,

    /// Host to select requirements for (ubuntu, fedora, osx, other)
    #[arg(long)]
    pub host: Option<HostOs>,

    /// Fail when a library is unresolved
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug)]
pub struct BuildreqsArgs {
    #[arg(long, default_value = "conandata.yml", value_name = "FILE")]
    pub conandata: PathBuf,

    /// Host to select requirements for (ubuntu, fedora, osx, other)
    #[arg(long)]
    pub host: Option<HostOs>,

    /// Fail when a command is unresolved
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug)]
pub struct GitSourceArgs {
    pub url: String,

    /// Recipe version, `<version>-<branch>-<commit>`
    pub version: String,

    #[arg(long, default_value = "source_subfolder", value_name = "DIR")]
    pub folder: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct PatchArgs {
    #[arg(long, default_value = "patches", value_name = "DIR")]
    pub patches: PathBuf,

    #[arg(long, default_value = "source_subfolder", value_name = "DIR")]
    pub source_folder: PathBuf,
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    let runtime = recipe_kit::runtime::RealRuntime;
    let pkg_config = cli.pkg_config;

    let ok = match cli.command {
        Commands::ParseVersion(args) => {
            commands::parse_version(&args.version)?;
            true
        }
        Commands::CheckVersion(args) => commands::check_version(
            runtime,
            &args.command,
            &args.requirement,
            &args.version_args,
            args.pattern.as_deref(),
        )?,
        Commands::CheckPkgVersion(args) => commands::check_pkg_version(
            runtime,
            pkg_config,
            &args.package,
            &args.requirement,
            args.pattern.as_deref(),
            args.pkgconfig_dir,
        )?,
        Commands::Query(args) => {
            commands::query(
                runtime,
                pkg_config,
                &args.packages,
                args.pkgconfig_dir,
                args.package_folder,
            )?;
            true
        }
        Commands::List(args) => {
            commands::list(runtime, pkg_config, args.dir)?;
            true
        }
        Commands::Exists(args) => commands::exists(runtime, pkg_config, &args.package)?,
        Commands::Collect(args) => {
            commands::collect(
                runtime,
                pkg_config,
                &args.dir,
                &args.package_folder,
                args.components,
            )?;
            true
        }
        Commands::DefaultLibDirs => {
            commands::default_lib_dirs(runtime)?;
            true
        }
        Commands::CopyPc(args) => {
            commands::copy_pc(runtime, &args.root, &args.dest)?;
            true
        }
        Commands::Replace(args) => {
            commands::replace(
                runtime,
                &args.file,
                &args.pattern,
                &args.replacement,
                !args.lenient,
            )?;
            true
        }
        Commands::Sysreqs(args) => {
            let complete = commands::sysreqs(
                runtime,
                pkg_config,
                &args.conandata,
                &args.exclude,
                args.host,
            )?;
            complete || !args.strict
        }
        Commands::Buildreqs(args) => {
            let complete = commands::buildreqs(runtime, &args.conandata, args.host)?;
            complete || !args.strict
        }
        Commands::GitSource(args) => {
            commands::git_source(runtime, &args.url, &args.version, &args.folder)?;
            true
        }
        Commands::Patch(args) => {
            commands::patch(runtime, &args.patches, &args.source_folder)?;
            true
        }
    };
    Ok(exit_code(ok))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_query_parsing() {
        let cli = Cli::try_parse_from([
            "recipe-kit",
            "query",
            "zlib",
            "libpng",
            "--pkgconfig-dir",
            "/tmp/pc",
        ])
        .unwrap();
        match cli.command {
            Commands::Query(args) => {
                assert_eq!(args.packages, vec!["zlib", "libpng"]);
                assert_eq!(args.pkgconfig_dir, Some(PathBuf::from("/tmp/pc")));
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_cli_query_requires_package() {
        assert!(Cli::try_parse_from(["recipe-kit", "query"]).is_err());
    }

    #[test]
    fn test_cli_global_pkg_config_parsing() {
        let cli =
            Cli::try_parse_from(["recipe-kit", "exists", "zlib", "--pkg-config", "pkgconf"])
                .unwrap();
        assert_eq!(cli.pkg_config.as_deref(), Some("pkgconf"));
    }

    #[test]
    fn test_cli_check_version_hyphen_args() {
        let cli = Cli::try_parse_from([
            "recipe-kit",
            "check-version",
            "nasm",
            ">=2.14",
            "--version-arg",
            "-v",
        ])
        .unwrap();
        match cli.command {
            Commands::CheckVersion(args) => {
                assert_eq!(args.command, "nasm");
                assert_eq!(args.version_args, vec!["-v"]);
            }
            _ => panic!("Expected CheckVersion command"),
        }
    }

    #[test]
    fn test_cli_sysreqs_defaults() {
        let cli = Cli::try_parse_from([
            "recipe-kit",
            "sysreqs",
            "--exclude",
            "x11",
            "--host",
            "fedora",
        ])
        .unwrap();
        match cli.command {
            Commands::Sysreqs(args) => {
                assert_eq!(args.conandata, PathBuf::from("conandata.yml"));
                assert_eq!(args.exclude, vec!["x11"]);
                assert_eq!(args.host, Some(HostOs::Fedora));
                assert!(!args.strict);
            }
            _ => panic!("Expected Sysreqs command"),
        }
    }

    #[test]
    fn test_cli_invalid_host_fails() {
        assert!(Cli::try_parse_from(["recipe-kit", "buildreqs", "--host", "plan9"]).is_err());
    }

    #[test]
    fn test_cli_patch_defaults() {
        let cli = Cli::try_parse_from(["recipe-kit", "patch"]).unwrap();
        match cli.command {
            Commands::Patch(args) => {
                assert_eq!(args.patches, PathBuf::from("patches"));
                assert_eq!(args.source_folder, PathBuf::from("source_subfolder"));
            }
            _ => panic!("Expected Patch command"),
        }
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["recipe-kit", "zlib"]).is_err());
    }
}
