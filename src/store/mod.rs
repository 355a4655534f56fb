//! Read-only access to the hosted directory tree.
//!
//! The server never touches the filesystem directly; it goes through a
//! [`FileStore`], which answers two questions about a request path: "is there
//! a visible file here?" and "is there a visible directory here?". Visibility
//! is decided centrally by the store's [`Exclusions`], so hidden entries can
//! neither be fetched nor appear in listings.
//!
//! [`PhysicalStore`] is the implementation backed by the local filesystem.

use std::future::Future;
use std::io;

use tokio::io::AsyncRead;

pub mod filter;
pub mod physical;

pub use filter::Exclusions;
pub use physical::PhysicalStore;

/// One visible child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// File name, without any leading path.
    pub name: String,
    /// `true` if the entry is (or links to) a directory.
    pub is_dir: bool,
}

impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// A source of files and directory listings rooted somewhere.
///
/// Paths handed to a store are request paths: `/`-separated, relative to the
/// store's root, with the empty string naming the root itself. A store must
/// report excluded entries exactly as it reports missing ones.
///
/// Implementations are shared by every connection task, so they must be
/// `Send + Sync + 'static` and must not rely on interior mutation.
pub trait FileStore: Send + Sync + 'static {
    /// Byte stream over an opened file. Dropping it releases the file.
    type Reader: AsyncRead + Unpin + Send + 'static;

    /// Opens the visible regular file at `path`, or returns `Ok(None)` if
    /// there is none.
    fn resolve_file(
        &self,
        path: &str,
    ) -> impl Future<Output = io::Result<Option<Self::Reader>>> + Send;

    /// Lists the visible entries of the directory at `path` in the store's
    /// natural enumeration order, or returns `Ok(None)` if there is no such
    /// directory.
    fn resolve_directory(
        &self,
        path: &str,
    ) -> impl Future<Output = io::Result<Option<Vec<Entry>>>> + Send;
}
