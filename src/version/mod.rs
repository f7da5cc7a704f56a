//! Version handling for recipes
//!
//! - `recipe_version` - `<version>-<branch>-<commit>` package versions
//! - `requirement` - inclusive min / optional max requirements
//! - `gate` - checking tool and package versions against requirements

mod gate;
mod recipe_version;
mod requirement;

pub use gate::{DEFAULT_VERSION_PATTERN, VersionGate, check_cmd_version, check_pkg_version};
pub use recipe_version::{RecipeVersion, VERSION_PATTERN};
pub use requirement::{VersionRequirement, parse_lenient};
