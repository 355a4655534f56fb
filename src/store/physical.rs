//! [`FileStore`] over a directory on the local filesystem.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tracing::trace;

use super::{Entry, Exclusions, FileStore};

/// Serves files and listings from beneath a fixed root directory.
///
/// Every lookup is sanitised with the store's [`Exclusions`] before it
/// reaches the filesystem, and the target's attributes are checked again
/// afterwards, so excluded entries are indistinguishable from missing ones.
///
/// # Examples
///
/// ```rust,no_run
/// use burrow::store::{FileStore, PhysicalStore};
///
/// # async fn demo() -> std::io::Result<()> {
/// let store = PhysicalStore::new("/srv/files");
/// if let Some(entries) = store.resolve_directory("docs").await? {
///     for entry in entries {
///         println!("{}{}", entry.name, if entry.is_dir { "/" } else { "" });
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PhysicalStore {
    root: PathBuf,
    exclusions: Exclusions,
}

impl PhysicalStore {
    /// Creates a store rooted at `root` hiding dotfiles, hidden and system
    /// entries.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclusions: Exclusions::sensitive(),
        }
    }

    /// Replaces the exclusion policy.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: Exclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    // Absolute location of a request path, or `None` when sanitising refuses it.
    fn locate(&self, path: &str) -> Option<PathBuf> {
        self.exclusions
            .sanitize(path)
            .map(|relative| self.root.join(relative))
    }

    // Metadata of a visible target, following symlinks.
    async fn visible_metadata(&self, location: &Path) -> io::Result<Option<Metadata>> {
        let metadata = match fs::metadata(location).await {
            Ok(metadata) => metadata,
            Err(e) if is_absent(&e) => return Ok(None),
            Err(e) => return Err(e),
        };

        if self.exclusions.excludes_attributes(&metadata) {
            trace!(path = %location.display(), "excluded by attributes");
            return Ok(None);
        }
        Ok(Some(metadata))
    }
}

impl FileStore for PhysicalStore {
    type Reader = File;

    async fn resolve_file(&self, path: &str) -> io::Result<Option<File>> {
        let Some(location) = self.locate(path) else {
            return Ok(None);
        };

        match self.visible_metadata(&location).await? {
            Some(metadata) if metadata.is_file() => {}
            _ => return Ok(None),
        }

        match File::open(&location).await {
            Ok(file) => Ok(Some(file)),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn resolve_directory(&self, path: &str) -> io::Result<Option<Vec<Entry>>> {
        let Some(location) = self.locate(path) else {
            return Ok(None);
        };

        match self.visible_metadata(&location).await? {
            Some(metadata) if metadata.is_dir() => {}
            _ => return Ok(None),
        }

        let mut dir = fs::read_dir(&location).await?;
        let mut entries = Vec::new();

        while let Some(child) = dir.next_entry().await? {
            let Ok(name) = child.file_name().into_string() else {
                continue;
            };
            if self.exclusions.excludes_name(&name) {
                continue;
            }

            // A dangling symlink still shows up, as a plain file.
            let is_dir = match fs::metadata(child.path()).await {
                Ok(metadata) if self.exclusions.excludes_attributes(&metadata) => continue,
                Ok(metadata) => metadata.is_dir(),
                Err(_) => false,
            };

            entries.push(Entry { name, is_dir });
        }

        Ok(Some(entries))
    }
}

fn is_absent(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("docs/guide")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("hello.txt"), "hi").unwrap();
        std::fs::write(root.join("docs/index"), "welcome").unwrap();
        std::fs::write(root.join(".env"), "SECRET=1").unwrap();
        std::fs::write(root.join(".git/config"), "[core]").unwrap();
        dir
    }

    async fn read_all(mut file: File) -> String {
        let mut out = String::new();
        file.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn resolves_plain_file() {
        let dir = tree();
        let store = PhysicalStore::new(dir.path());
        let file = store.resolve_file("hello.txt").await.unwrap().unwrap();
        assert_eq!(read_all(file).await, "hi");
    }

    #[tokio::test]
    async fn nested_file() {
        let dir = tree();
        let store = PhysicalStore::new(dir.path());
        let file = store.resolve_file("docs/index").await.unwrap().unwrap();
        assert_eq!(read_all(file).await, "welcome");
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let dir = tree();
        let store = PhysicalStore::new(dir.path());
        assert!(store.resolve_file("docs").await.unwrap().is_none());
        assert!(store.resolve_file("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_and_under_file_are_absent() {
        let dir = tree();
        let store = PhysicalStore::new(dir.path());
        assert!(store.resolve_file("missing").await.unwrap().is_none());
        assert!(store.resolve_file("hello.txt/index").await.unwrap().is_none());
        assert!(store.resolve_directory("hello.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dotfiles_are_invisible() {
        let dir = tree();
        let store = PhysicalStore::new(dir.path());
        assert!(store.resolve_file(".env").await.unwrap().is_none());
        assert!(store.resolve_file(".git/config").await.unwrap().is_none());
        assert!(store.resolve_directory(".git").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dotfiles_visible_without_exclusions() {
        let dir = tree();
        let store = PhysicalStore::new(dir.path()).with_exclusions(Exclusions::none());
        let file = store.resolve_file(".env").await.unwrap().unwrap();
        assert_eq!(read_all(file).await, "SECRET=1");
    }

    #[tokio::test]
    async fn traversal_is_refused() {
        let dir = tree();
        let inner = dir.path().join("docs");
        let store = PhysicalStore::new(&inner);
        assert!(store.resolve_file("../hello.txt").await.unwrap().is_none());
        assert!(store.resolve_directory("..").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn root_listing_hides_excluded_entries() {
        let dir = tree();
        let store = PhysicalStore::new(dir.path());
        let mut entries = store.resolve_directory("").await.unwrap().unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            entries,
            vec![Entry::directory("docs"), Entry::file("hello.txt")]
        );
    }

    #[tokio::test]
    async fn listing_marks_directories() {
        let dir = tree();
        let store = PhysicalStore::new(dir.path());
        let mut entries = store.resolve_directory("docs").await.unwrap().unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries, vec![Entry::directory("guide"), Entry::file("index")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlink_listed_as_file() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("link")).unwrap();
        let store = PhysicalStore::new(dir.path());
        let entries = store.resolve_directory("").await.unwrap().unwrap();
        assert_eq!(entries, vec![Entry::file("link")]);
    }
}
