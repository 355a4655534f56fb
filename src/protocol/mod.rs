//! The burrow wire protocol.
//!
//! One request per TCP connection:
//!
//! 1. The client sends a path, e.g. `docs/intro.txt\n`. Nothing else: no
//!    verb, no headers. Whatever bytes are waiting when the server looks are
//!    the request; sending nothing requests the root.
//! 2. The server answers with either the raw bytes of a file or a listing of
//!    `=> name` / `=> name/` lines, then closes the connection.
//!
//! There are no status codes. A path that matches nothing, an oversized
//! request and an internal failure all look the same to the client: an empty
//! response followed by close.

pub mod request;
pub mod response;

pub use request::{
    PENDING_BYTES_SUPPORTED, RequestError, RequestPath, pending_bytes, read_request,
};
pub use response::{listing_line, write_response};
