//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and answers exactly one burrow request on each.
//! Every connection is handled on its own Tokio task under a supervising
//! task, so an error or a panic while serving one client is logged and
//! contained without disturbing the accept loop or any other client.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::protocol::{self, RequestError};
use crate::resolver::Resolver;
use crate::store::{FileStore, PhysicalStore};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end a single connection early.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Read-only state shared by every connection task.
struct Shared<S> {
    config: Config,
    resolver: Resolver<S>,
}

/// The burrow file server.
///
/// # Examples
///
/// ```rust,no_run
/// use burrow::config::Config;
/// use burrow::server::Server;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::new("/srv/files")?;
///     let server = Server::bind(config).await?;
///     server.run_until(async {
///         let _ = tokio::signal::ctrl_c().await;
///     }).await?;
///     Ok(())
/// }
/// ```
pub struct Server<S = PhysicalStore> {
    listener: TcpListener,
    local_addr: SocketAddr,
    shared: Arc<Shared<S>>,
}

impl Server<PhysicalStore> {
    /// Binds to the configured address, serving the configured root from the
    /// local filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(config: Config) -> Result<Self, ServerError> {
        let store = PhysicalStore::new(config.root());
        Self::with_store(config, store).await
    }
}

impl<S: FileStore> Server<S> {
    /// Binds to the configured address, serving requests from `store`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn with_store(config: Config, store: S) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            shared: Arc::new(Shared {
                config,
                resolver: Resolver::new(store),
            }),
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections forever.
    ///
    /// # Errors
    ///
    /// Currently never fails; accept errors are logged and skipped.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves, then drops the listener.
    ///
    /// Connections accepted before shutdown keep running on the runtime until
    /// they finish.
    ///
    /// # Errors
    ///
    /// Currently never fails; accept errors are logged and skipped.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            address = %self.local_addr,
            root = %self.shared.config.root().display(),
            "burrow listening"
        );
        if !protocol::PENDING_BYTES_SUPPORTED {
            warn!("cannot query waiting request bytes on this platform; requests will fail");
        }

        loop {
            let (stream, peer_addr) = tokio::select! {
                () = &mut shutdown => {
                    info!(address = %self.local_addr, "shutting down listener");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                        continue;
                    }
                },
            };

            debug!(peer = %peer_addr, "connection accepted");
            tokio::spawn(supervise(stream, peer_addr, Arc::clone(&self.shared)));
        }

        Ok(())
    }
}

/// Runs one connection on its own task and reports how it ended.
///
/// The stream is owned by the inner task, so it is closed exactly once when
/// that task finishes, fails or unwinds.
async fn supervise<S: FileStore>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    shared: Arc<Shared<S>>,
) {
    let handler = tokio::spawn(async move {
        // The peer may have reset the connection before we got scheduled.
        if let Err(e) = stream.peer_addr() {
            debug!(peer = %peer_addr, error = %e, "connection no longer open");
            return Ok(());
        }
        handle_connection(stream, peer_addr, &shared).await
    });

    match handler.await {
        Ok(Ok(())) => debug!(peer = %peer_addr, "connection closed"),
        Ok(Err(ConnectionError::Request(RequestError::Oversized { available, limit }))) => {
            warn!(peer = %peer_addr, available, limit, "ignoring oversized request");
        }
        Ok(Err(e)) => {
            warn!(peer = %peer_addr, error = %e, "error while processing request");
        }
        Err(e) => report_join_error(peer_addr, e),
    }
}

fn report_join_error(peer_addr: SocketAddr, e: JoinError) {
    if !e.is_panic() {
        warn!(peer = %peer_addr, "connection task cancelled");
        return;
    }

    let panic = e.into_panic();
    let message = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload");
    error!(peer = %peer_addr, panic = message, "connection handler panicked");
}

/// Serves the single request carried by `stream`.
///
/// read → resolve → write, each step starting only once the previous one is
/// done. The stream is dropped, and therefore closed, on return.
async fn handle_connection<S: FileStore>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    shared: &Shared<S>,
) -> Result<(), ConnectionError> {
    let available = protocol::pending_bytes(&stream)?;
    let limit = shared.config.request_limit();
    let path = protocol::read_request(&mut stream, available, limit).await?;

    info!(peer = %peer_addr, path = %path, "handling request");

    let resolution = shared.resolver.resolve(path.as_str()).await?;
    let kind = resolution.kind();
    let written = protocol::write_response(&mut stream, resolution).await?;

    debug!(peer = %peer_addr, kind, bytes = written, "response written");

    // The client may already be gone; the close still happens on drop.
    if let Err(e) = stream.shutdown().await {
        debug!(peer = %peer_addr, error = %e, "shutdown after response failed");
    }

    Ok(())
}
