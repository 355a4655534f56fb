//! Visibility rules for stored entries and request-path sanitising.

use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};

#[cfg(windows)]
const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
#[cfg(windows)]
const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;

/// Which classes of entries a store treats as nonexistent.
///
/// | Switch         | Unix                      | Windows                    |
/// |----------------|---------------------------|----------------------------|
/// | `dot_prefixed` | name starts with `.`      | name starts with `.`       |
/// | `hidden`       | name starts with `.`      | `FILE_ATTRIBUTE_HIDDEN`    |
/// | `system`       | never                     | `FILE_ATTRIBUTE_SYSTEM`    |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclusions {
    pub dot_prefixed: bool,
    pub hidden: bool,
    pub system: bool,
}

impl Exclusions {
    /// Hide nothing beyond what path sanitising already rejects.
    pub const fn none() -> Self {
        Self {
            dot_prefixed: false,
            hidden: false,
            system: false,
        }
    }

    /// Hide dotfiles, hidden entries and system entries.
    pub const fn sensitive() -> Self {
        Self {
            dot_prefixed: true,
            hidden: true,
            system: true,
        }
    }

    /// Returns `true` if an entry called `name` is excluded on name alone.
    pub fn excludes_name(&self, name: &str) -> bool {
        let dotted = name.starts_with('.');
        (self.dot_prefixed && dotted) || (cfg!(unix) && self.hidden && dotted)
    }

    /// Returns `true` if the entry's attributes mark it as excluded.
    #[cfg(windows)]
    pub fn excludes_attributes(&self, metadata: &Metadata) -> bool {
        use std::os::windows::fs::MetadataExt;

        let attributes = metadata.file_attributes();
        (self.hidden && attributes & FILE_ATTRIBUTE_HIDDEN != 0)
            || (self.system && attributes & FILE_ATTRIBUTE_SYSTEM != 0)
    }

    /// Returns `true` if the entry's attributes mark it as excluded.
    #[cfg(not(windows))]
    pub fn excludes_attributes(&self, _metadata: &Metadata) -> bool {
        false
    }

    /// Turns a request path into a relative filesystem path, or `None` if the
    /// path can never name a visible entry.
    ///
    /// Empty segments are skipped, so `a//b` is `a/b` and `""` is the root.
    /// A path is refused when any segment is `.` or `..`, contains a NUL
    /// byte or a backslash, is not a plain file name on this platform, or is
    /// excluded by name. Refusing `..` keeps every lookup inside the root.
    pub fn sanitize(&self, request: &str) -> Option<PathBuf> {
        let mut relative = PathBuf::new();

        for segment in request.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return None;
            }
            if segment.contains(['\0', '\\']) {
                return None;
            }
            if self.excludes_name(segment) {
                return None;
            }

            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => relative.push(segment),
                _ => return None,
            }
        }

        Some(relative)
    }
}

impl Default for Exclusions {
    fn default() -> Self {
        Self::sensitive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotfiles_excluded_by_default() {
        let exclusions = Exclusions::default();
        assert!(exclusions.excludes_name(".env"));
        assert!(exclusions.excludes_name(".git"));
        assert!(!exclusions.excludes_name("notes.txt"));
        assert!(!exclusions.excludes_name("a.b"));
    }

    #[test]
    fn none_keeps_dotfiles() {
        assert!(!Exclusions::none().excludes_name(".env"));
    }

    #[test]
    fn sanitize_root() {
        let exclusions = Exclusions::sensitive();
        assert_eq!(exclusions.sanitize(""), Some(PathBuf::new()));
        assert_eq!(exclusions.sanitize("///"), Some(PathBuf::new()));
    }

    #[test]
    fn sanitize_collapses_empty_segments() {
        let exclusions = Exclusions::sensitive();
        assert_eq!(
            exclusions.sanitize("docs//guide/intro.txt"),
            Some(PathBuf::from("docs").join("guide").join("intro.txt"))
        );
    }

    #[test]
    fn sanitize_rejects_traversal() {
        let exclusions = Exclusions::none();
        assert_eq!(exclusions.sanitize(".."), None);
        assert_eq!(exclusions.sanitize("docs/../../etc/passwd"), None);
        assert_eq!(exclusions.sanitize("./docs"), None);
    }

    #[test]
    fn sanitize_rejects_hidden_segments() {
        let exclusions = Exclusions::sensitive();
        assert_eq!(exclusions.sanitize(".git/config"), None);
        assert_eq!(exclusions.sanitize("app/.env"), None);
        assert!(Exclusions::none().sanitize("app/.env").is_some());
    }

    #[test]
    fn sanitize_refuses_paths_that_stay_inside_root() {
        let exclusions = Exclusions::sensitive();
        assert_eq!(exclusions.sanitize("docs/../hello.txt"), None);
        assert_eq!(exclusions.sanitize(".well-known/x"), None);
    }

    #[test]
    fn sanitize_rejects_odd_bytes() {
        let exclusions = Exclusions::sensitive();
        assert_eq!(exclusions.sanitize("a\0b"), None);
        assert_eq!(exclusions.sanitize("a\\..\\b"), None);
    }
}
