//! Path resolution: decide what a request path should be answered with.
//!
//! Candidates are tried in a fixed order and the first hit wins:
//!
//! | Order | Looks for                  | Result                    |
//! |-------|----------------------------|---------------------------|
//! | 1     | a file at `path`           | [`Resolution::File`]      |
//! | 2     | a file at `path/index`     | [`Resolution::Index`]     |
//! | 3     | a directory at `path`      | [`Resolution::Listing`]   |
//! | -     | nothing                    | [`Resolution::NotFound`]  |
//!
//! A file therefore always shadows an index, and an index always shadows the
//! listing of its directory.

use std::io;

use crate::store::{Entry, FileStore};

/// Name of the file served in place of a directory listing.
pub const INDEX_FILE: &str = "index";

/// The outcome of resolving one request path.
#[derive(Debug)]
pub enum Resolution<R> {
    /// The path names a file.
    File(R),
    /// The path names a directory holding an `index` file.
    Index(R),
    /// The path names a directory without an `index` file.
    Listing(Vec<Entry>),
    /// Nothing visible lives at the path.
    NotFound,
}

impl<R> Resolution<R> {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Index(_) => "index",
            Self::Listing(_) => "listing",
            Self::NotFound => "not-found",
        }
    }
}

/// Resolves request paths against a [`FileStore`].
#[derive(Debug)]
pub struct Resolver<S> {
    store: S,
}

impl<S: FileStore> Resolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolves `path`, which must already be normalised.
    ///
    /// # Errors
    ///
    /// Propagates store I/O failures other than "not there".
    pub async fn resolve(&self, path: &str) -> io::Result<Resolution<S::Reader>> {
        if let Some(file) = self.store.resolve_file(path).await? {
            return Ok(Resolution::File(file));
        }

        if let Some(index) = self.store.resolve_file(&index_path(path)).await? {
            return Ok(Resolution::Index(index));
        }

        if let Some(entries) = self.store.resolve_directory(path).await? {
            return Ok(Resolution::Listing(entries));
        }

        Ok(Resolution::NotFound)
    }
}

/// `path/index`; for the root this is `/index`.
fn index_path(path: &str) -> String {
    format!("{path}/{INDEX_FILE}")
}
