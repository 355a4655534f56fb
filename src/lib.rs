//! # burrow
//!
//! A line-oriented, Gopher-like file server built on Tokio.
//!
//! A client connects, sends a path, and gets back either the bytes of the
//! file at that path, the contents of `path/index`, or a listing of the
//! directory at that path as `=> name` lines. Then the connection closes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use burrow::{Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new("/srv/files")?.bind_address("127.0.0.1:1900");
//!     let server = Server::bind(config).await?;
//!     println!("Listening on {}", server.local_addr());
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod protocol;
pub mod resolver;
pub mod server;
pub mod store;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::{Config, ConfigError};
pub use protocol::RequestPath;
pub use resolver::{Resolution, Resolver};
pub use server::{ConnectionError, Server, ServerError};
pub use store::{Entry, FileStore, PhysicalStore};
