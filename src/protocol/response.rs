//! Writing a resolved request back to the client.

use std::io;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter};

use crate::resolver::Resolution;
use crate::store::Entry;

/// Prefix of every listing line.
const LINK_PREFIX: &str = "=> ";

/// Terminator of every listing line.
const LINE_END: &str = "\n";

/// Formats one listing line: `=> name` for files, `=> name/` for directories.
///
/// # Examples
///
/// ```
/// use burrow::protocol::listing_line;
/// use burrow::store::Entry;
///
/// assert_eq!(listing_line(&Entry::file("a.txt")), "=> a.txt\n");
/// assert_eq!(listing_line(&Entry::directory("docs")), "=> docs/\n");
/// ```
pub fn listing_line(entry: &Entry) -> String {
    let suffix = if entry.is_dir { "/" } else { "" };
    format!("{LINK_PREFIX}{}{suffix}{LINE_END}", entry.name)
}

/// Streams `resolution` to `out` and returns the number of bytes written.
///
/// Files are copied verbatim. Listings are written line by line in the order
/// given. [`Resolution::NotFound`] writes nothing.
pub async fn write_response<W, R>(out: &mut W, resolution: Resolution<R>) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    match resolution {
        Resolution::File(mut file) | Resolution::Index(mut file) => {
            let copied = tokio::io::copy(&mut file, out).await?;
            out.flush().await?;
            Ok(copied)
        }
        Resolution::Listing(entries) => write_listing(out, &entries).await,
        Resolution::NotFound => Ok(0),
    }
}

async fn write_listing<W>(out: &mut W, entries: &[Entry]) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(out);
    let mut written = 0u64;

    for entry in entries {
        let line = listing_line(entry);
        writer.write_all(line.as_bytes()).await?;
        written += line.len() as u64;
    }

    writer.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    type Memory = Cursor<Vec<u8>>;

    async fn render(resolution: Resolution<Memory>) -> (Vec<u8>, u64) {
        let mut out = Vec::new();
        let written = write_response(&mut out, resolution).await.unwrap();
        (out, written)
    }

    #[tokio::test]
    async fn file_copied_verbatim() {
        let bytes = vec![0u8, 159, 146, 150, b'\r', b'\n', 255];
        let (out, written) = render(Resolution::File(Cursor::new(bytes.clone()))).await;
        assert_eq!(out, bytes);
        assert_eq!(written, bytes.len() as u64);
    }

    #[tokio::test]
    async fn index_copied_verbatim() {
        let (out, _) = render(Resolution::Index(Cursor::new(b"welcome".to_vec()))).await;
        assert_eq!(out, b"welcome");
    }

    #[tokio::test]
    async fn listing_preserves_order() {
        let entries = vec![
            Entry::file("zeta.txt"),
            Entry::directory("alpha"),
            Entry::file("index.html"),
        ];
        let (out, written) = render(Resolution::Listing(entries)).await;
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "=> zeta.txt\n=> alpha/\n=> index.html\n");
        assert_eq!(written, text.len() as u64);
    }

    #[tokio::test]
    async fn empty_listing_writes_nothing() {
        let (out, written) = render(Resolution::Listing(Vec::new())).await;
        assert!(out.is_empty());
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn not_found_writes_nothing() {
        let (out, written) = render(Resolution::NotFound).await;
        assert!(out.is_empty());
        assert_eq!(written, 0);
    }
}
