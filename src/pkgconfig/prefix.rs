//! Relocation of a package's declared install prefix.
//!
//! A `.pc` file records the prefix the package was built for. When the
//! package is installed somewhere else, every path derived from that prefix
//! has to be moved to the actual location.

use super::flags::PackageLinkFlags;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRewrite {
    old: String,
    new: String,
}

impl PrefixRewrite {
    /// Trailing slashes are ignored on both prefixes. A root (`/`) or empty
    /// old prefix rewrites nothing.
    pub fn new(old: impl AsRef<str>, new: impl AsRef<str>) -> Self {
        Self {
            old: old.as_ref().trim_end_matches('/').to_string(),
            new: new.as_ref().trim_end_matches('/').to_string(),
        }
    }

    pub fn old(&self) -> &str {
        &self.old
    }

    pub fn new_prefix(&self) -> &str {
        &self.new
    }

    /// Whether the rewrite changes anything at all.
    pub fn is_noop(&self) -> bool {
        self.old.is_empty() || self.old == self.new
    }

    /// Rewrite one path or flag.
    ///
    /// A path is rewritten when it is the old prefix or lies below it. A flag
    /// such as `-I/old/include` has its value after the two-character marker
    /// rewritten the same way.
    pub fn rewrite(&self, item: &str) -> String {
        if let Some(rest) = self.strip(item) {
            return format!("{}{}", self.new, rest);
        }
        if item.starts_with('-') && item.len() > 2 && item.is_char_boundary(2) {
            let (marker, value) = item.split_at(2);
            if let Some(rest) = self.strip(value) {
                return format!("{}{}{}", marker, self.new, rest);
            }
        }
        item.to_string()
    }

    pub fn rewrite_all(&self, items: &[String]) -> Vec<String> {
        items.iter().map(|item| self.rewrite(item)).collect()
    }

    /// Apply the rewrite to every path, library name and flag.
    pub fn apply(&self, flags: PackageLinkFlags) -> PackageLinkFlags {
        if self.is_noop() {
            return flags;
        }
        PackageLinkFlags {
            include_dirs: self.rewrite_all(&flags.include_dirs),
            lib_dirs: self.rewrite_all(&flags.lib_dirs),
            libs: self.rewrite_all(&flags.libs),
            system_libs: self.rewrite_all(&flags.system_libs),
            cflags: self.rewrite_all(&flags.cflags),
        }
    }

    /// The remainder of `value` after the old prefix, if `value` needs
    /// rewriting.
    fn strip<'a>(&self, value: &'a str) -> Option<&'a str> {
        if self.is_noop() {
            return None;
        }
        // Already relocated below a new prefix that extends the old one
        if is_under(value, &self.new) && is_under(&self.new, &self.old) {
            return None;
        }
        let rest = value.strip_prefix(self.old.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
