//! Line framing for device ↔ server communication.
//!
//! A request is one line of JSON; a response is one block of text
//! terminated by exactly one `\n`. The response may contain embedded
//! newlines from generated content.

pub mod protocol;

pub use protocol::InboundRequest;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};

/// Upper bound on bytes discarded after an oversized request line.
const MAX_DISCARD: usize = 1024 * 1024;

/// Read one request line.
///
/// Stops at the first `\n`, at peer close, or after `limit` bytes,
/// whichever comes first. Invalid UTF-8 is replaced rather than rejected,
/// and surrounding whitespace is trimmed.
///
/// When the line is cut off at `limit`, the rest of it (up to
/// `MAX_DISCARD` bytes) is read and dropped so that closing the socket
/// with unread input does not reset the connection before the peer gets
/// its reply.
pub async fn recv_line<R: AsyncRead + Unpin>(reader: &mut R, limit: usize) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut limited = BufReader::new((&mut *reader).take(limit as u64));
        limited.read_until(b'\n', &mut buf).await?;
    }

    if buf.len() >= limit && buf.last() != Some(&b'\n') {
        discard_line(reader, MAX_DISCARD).await?;
    }

    Ok(String::from_utf8_lossy(&buf).trim().to_string())
}

/// Read and drop bytes up to and including the next `\n`, stopping at
/// peer close or after `bound` bytes. Returns the number of bytes dropped.
async fn discard_line<R: AsyncRead + Unpin>(reader: &mut R, bound: usize) -> Result<usize> {
    let mut chunk = [0u8; 4096];
    let mut discarded = 0;

    while discarded < bound {
        let want = chunk.len().min(bound - discarded);
        let n = reader.read(&mut chunk[..want]).await?;
        if n == 0 {
            break;
        }
        discarded += n;
        if chunk[..n].contains(&b'\n') {
            break;
        }
    }

    Ok(discarded)
}

/// Write `text` followed by exactly one line terminator.
pub async fn send_line<W: AsyncWriteExt + Unpin>(writer: &mut W, text: &str) -> Result<()> {
    let mut payload = Vec::with_capacity(text.len() + 1);
    payload.extend_from_slice(text.trim_end_matches(['\r', '\n']).as_bytes());
    payload.push(b'\n');

    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recv_stops_at_newline() {
        let mut cursor = std::io::Cursor::new(b"  {\"a\":1}\nleftover".to_vec());
        let line = recv_line(&mut cursor, 1024).await.unwrap();
        assert_eq!(line, "{\"a\":1}");
    }

    #[tokio::test]
    async fn recv_accepts_peer_close_without_newline() {
        let mut cursor = std::io::Cursor::new(b"{\"a\":1}".to_vec());
        let line = recv_line(&mut cursor, 1024).await.unwrap();
        assert_eq!(line, "{\"a\":1}");
    }

    #[tokio::test]
    async fn recv_replaces_invalid_utf8() {
        let mut cursor = std::io::Cursor::new(b"caf\xff\n".to_vec());
        let line = recv_line(&mut cursor, 1024).await.unwrap();
        assert_eq!(line, "caf\u{FFFD}");
    }

    #[tokio::test]
    async fn recv_respects_limit_and_drains_rest_of_line() {
        let input = b"abcdefgh\n".to_vec();
        let total = input.len() as u64;
        let mut cursor = std::io::Cursor::new(input);

        let line = recv_line(&mut cursor, 4).await.unwrap();
        assert_eq!(line, "abcd");
        assert_eq!(cursor.position(), total);
    }

    #[tokio::test]
    async fn discard_stops_at_bound() {
        let mut cursor = std::io::Cursor::new(vec![b'x'; 10_000]);
        let dropped = discard_line(&mut cursor, 5000).await.unwrap();
        assert_eq!(dropped, 5000);
        assert_eq!(cursor.position(), 5000);
    }

    #[tokio::test]
    async fn recv_empty_stream() {
        let mut cursor = std::io::Cursor::new(Vec::new());
        let line = recv_line(&mut cursor, 1024).await.unwrap();
        assert!(line.is_empty());
    }

    #[tokio::test]
    async fn send_appends_single_terminator() {
        let mut buf = Vec::new();
        send_line(&mut buf, "line one\nline two").await.unwrap();
        assert_eq!(buf, b"line one\nline two\n");

        let mut buf = Vec::new();
        send_line(&mut buf, "already terminated\n").await.unwrap();
        assert_eq!(buf, b"already terminated\n");
    }
}
