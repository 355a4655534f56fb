//! Process-wide server configuration.
//!
//! A [`Config`] is built once at startup, validated, and then handed to the
//! [`Server`](crate::server::Server), which shares it read-only with every
//! connection task.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Port the server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 1900;

/// Interface the server binds to unless told otherwise (all interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Largest number of waiting request bytes a connection may present before
/// it is dropped unread.
pub const MAX_REQUEST_BYTES: usize = 16_384;

/// Errors produced while building a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to access directory '{}'", .0.display())]
    RootNotFound(PathBuf),

    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to resolve root directory '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable server configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use burrow::config::Config;
///
/// let config = Config::new("/srv/files")?
///     .bind_address("127.0.0.1:7070");
/// assert_eq!(config.request_limit(), 16_384);
/// # Ok::<(), burrow::config::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    bind_address: String,
    max_request_bytes: usize,
}

impl Config {
    /// Creates a configuration serving `root` on `0.0.0.0:1900`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::RootNotFound`] if `root` does not exist.
    /// - [`ConfigError::NotADirectory`] if `root` exists but is not a directory.
    /// - [`ConfigError::Io`] if the path cannot be canonicalised.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let root = root.as_ref();

        let metadata = match std::fs::metadata(root) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::RootNotFound(root.to_path_buf()));
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
        };
        if !metadata.is_dir() {
            return Err(ConfigError::NotADirectory(root.to_path_buf()));
        }

        let root = std::fs::canonicalize(root).map_err(|e| ConfigError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            root,
            bind_address: format!("{DEFAULT_HOST}:{DEFAULT_PORT}"),
            max_request_bytes: MAX_REQUEST_BYTES,
        })
    }

    /// Creates a configuration serving the process's working directory.
    pub fn current_dir() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::Io {
            path: PathBuf::from("."),
            source: e,
        })?;
        Self::new(cwd)
    }

    /// Sets the `host:port` address to listen on.
    #[must_use]
    pub fn bind_address(mut self, addr: impl Into<String>) -> Self {
        self.bind_address = addr.into();
        self
    }

    /// Sets the listen address from a host and a port. IPv6 hosts are
    /// bracketed.
    #[must_use]
    pub fn listen_on(self, host: &str, port: u16) -> Self {
        if host.contains(':') && !host.starts_with('[') {
            self.bind_address(format!("[{host}]:{port}"))
        } else {
            self.bind_address(format!("{host}:{port}"))
        }
    }

    /// Overrides the oversized-request threshold.
    #[must_use]
    pub fn max_request_bytes(mut self, limit: usize) -> Self {
        self.max_request_bytes = limit;
        self
    }

    /// Returns the canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configured listen address.
    pub fn address(&self) -> &str {
        &self.bind_address
    }

    /// Returns the oversized-request threshold in bytes.
    pub fn request_limit(&self) -> usize {
        self.max_request_bytes
    }
}
