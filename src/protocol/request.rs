//! Reading and normalising the request path.

use std::fmt;
use std::io;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;

/// Characters stripped from both ends of a request.
const TRIMMED: [char; 3] = ['\n', '\r', '/'];

/// Errors that can occur while reading a request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request of {available} bytes exceeds the {limit} byte limit")]
    Oversized { available: usize, limit: usize },

    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
}

/// A normalised request path.
///
/// Leading and trailing `\n`, `\r` and `/` are removed, so `//foo//`,
/// `foo` and `\nfoo\r` are the same request. The empty path is the root.
///
/// # Examples
///
/// ```
/// use burrow::protocol::RequestPath;
///
/// let path = RequestPath::decode(b"/docs/intro.txt\r\n");
/// assert_eq!(path.as_str(), "docs/intro.txt");
/// assert!(RequestPath::decode(b"\n").is_root());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RequestPath(String);

impl RequestPath {
    /// The empty path, naming the root directory.
    pub fn root() -> Self {
        Self::default()
    }

    /// Decodes raw request bytes as 7-bit ASCII and trims them.
    ///
    /// Bytes above `0x7F` become `?` instead of failing the request.
    pub fn decode(raw: &[u8]) -> Self {
        let text: String = raw
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect();
        Self::from(text.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for RequestPath {
    fn from(raw: &str) -> Self {
        Self(raw.trim_matches(TRIMMED).to_owned())
    }
}

impl AsRef<str> for RequestPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether [`pending_bytes`] can answer on this platform. Where it cannot,
/// every connection ends with an I/O error before anything is read.
pub const PENDING_BYTES_SUPPORTED: bool = cfg!(any(unix, windows));

/// Returns how many bytes are waiting in the socket's receive buffer,
/// without consuming them.
#[cfg(unix)]
pub fn pending_bytes(stream: &TcpStream) -> io::Result<usize> {
    use std::os::fd::AsRawFd;

    let mut available: libc::c_int = 0;
    // SAFETY: FIONREAD stores one c_int through the pointer, which is valid
    // for the duration of the call.
    let rc = unsafe {
        libc::ioctl(
            stream.as_raw_fd(),
            libc::FIONREAD,
            &mut available as *mut libc::c_int,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(usize::try_from(available).unwrap_or(0))
}

/// Returns how many bytes are waiting in the socket's receive buffer,
/// without consuming them.
#[cfg(windows)]
pub fn pending_bytes(stream: &TcpStream) -> io::Result<usize> {
    use std::os::windows::io::AsRawSocket;
    use windows_sys::Win32::Networking::WinSock::{FIONREAD, SOCKET, ioctlsocket};

    let mut available: u32 = 0;
    // SAFETY: FIONREAD stores one u32 through the pointer, which is valid
    // for the duration of the call.
    let rc = unsafe { ioctlsocket(stream.as_raw_socket() as SOCKET, FIONREAD, &mut available) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(available as usize)
}

/// Returns how many bytes are waiting in the socket's receive buffer.
///
/// Always fails on platforms without a FIONREAD query; check
/// [`PENDING_BYTES_SUPPORTED`] at startup.
#[cfg(not(any(unix, windows)))]
pub fn pending_bytes(_stream: &TcpStream) -> io::Result<usize> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "querying pending socket bytes is not supported on this platform",
    ))
}

/// Reads the request from `reader`, given that `available` bytes are
/// already waiting.
///
/// - `available == 0` yields the root path without touching the reader.
/// - `available > limit` fails with [`RequestError::Oversized`] without
///   reading anything.
/// - Otherwise exactly `available` bytes are read in one go and decoded
///   with [`RequestPath::decode`].
///
/// The read never waits for more bytes than were already there, so a client
/// that has not finished sending is served whatever prefix had arrived.
pub async fn read_request<R>(
    reader: &mut R,
    available: usize,
    limit: usize,
) -> Result<RequestPath, RequestError>
where
    R: AsyncRead + Unpin,
{
    if available == 0 {
        return Ok(RequestPath::root());
    }
    if available > limit {
        return Err(RequestError::Oversized { available, limit });
    }

    let mut buf = BytesMut::zeroed(available);
    reader.read_exact(&mut buf).await?;

    Ok(RequestPath::decode(&buf))
}
