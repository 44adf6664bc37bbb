//! Per-connection request loop.
//!
//! # Responsibilities
//! - Read one newline-terminated address per request
//! - Answer against the snapshot current at the time of the request
//! - Write exactly one response line per request, in order
//! - End on peer close, I/O error or shutdown

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast;

use crate::net::protocol::{Response, MAX_LINE_LEN};
use crate::observability::metrics;
use crate::reload::ReloadController;

/// Errors local to one connection. Never affects other connections.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection I/O error: {0}")]
    Io(#[from] io::Error),
}

/// What one read from the stream produced.
#[derive(Debug, PartialEq, Eq)]
enum ReadOutcome {
    /// A complete request is in the buffer.
    Line,
    /// The request exceeded [`MAX_LINE_LEN`]; its bytes were discarded.
    Oversized,
    /// Peer closed with nothing pending.
    Eof,
}

/// Serve queries on `stream` until the peer closes or `shutdown` fires.
///
/// Returns the number of queries answered.
pub async fn handle_connection<S>(
    stream: S,
    controller: Arc<ReloadController>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<u64, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufReader::new(stream);
    let mut line = Vec::with_capacity(64);
    let mut answered = 0u64;

    loop {
        line.clear();
        let outcome = tokio::select! {
            res = read_request(&mut stream, &mut line) => res?,
            _ = shutdown.recv() => {
                tracing::debug!("Connection closing for shutdown");
                break;
            }
        };

        let response = match outcome {
            ReadOutcome::Eof => break,
            ReadOutcome::Oversized => Response::NotFound,
            ReadOutcome::Line => {
                let found = match std::str::from_utf8(&line) {
                    Ok(text) => controller.current_index().contains(text),
                    Err(_) => false,
                };
                Response::from(found)
            }
        };

        tracing::trace!(
            query = %String::from_utf8_lossy(&line),
            response = %response,
            "Query answered"
        );
        metrics::record_query(response == Response::Found);

        stream.write_all(response.as_line()).await?;
        stream.flush().await?;
        answered += 1;
    }

    let _ = stream.shutdown().await;
    Ok(answered)
}

/// Read one request line into `buf`, without the terminator.
///
/// A final line without a trailing newline counts as a request. Lines longer
/// than [`MAX_LINE_LEN`] are drained up to their newline and reported as
/// oversized, leaving the stream positioned at the next request.
async fn read_request<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<ReadOutcome>
where
    R: AsyncBufRead + Unpin,
{
    let mut oversized = false;
    let mut saw_bytes = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(match (saw_bytes, oversized) {
                (false, _) => ReadOutcome::Eof,
                (true, true) => ReadOutcome::Oversized,
                (true, false) => ReadOutcome::Line,
            });
        }
        saw_bytes = true;

        let (chunk, consumed, done) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (&available[..pos], pos + 1, true),
            None => (available, available.len(), false),
        };

        if !oversized {
            if buf.len() + chunk.len() > MAX_LINE_LEN {
                oversized = true;
                buf.clear();
            } else {
                buf.extend_from_slice(chunk);
            }
        }
        reader.consume(consumed);

        if done {
            return Ok(if oversized { ReadOutcome::Oversized } else { ReadOutcome::Line });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::{PrefixSource, LoadError};
    use tokio::io::{duplex, AsyncReadExt};

    #[derive(Debug)]
    struct Fixed(&'static str);

    impl PrefixSource for Fixed {
        fn read(&self) -> Result<String, LoadError> {
            Ok(self.0.to_string())
        }

        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    fn controller(text: &'static str) -> Arc<ReloadController> {
        Arc::new(ReloadController::initialize(Arc::new(Fixed(text))).unwrap())
    }

    async fn exchange(requests: &[u8], prefixes: &'static str) -> String {
        let (client, server) = duplex(64 * 1024);
        let (_tx, rx) = broadcast::channel(1);
        let task = tokio::spawn(handle_connection(server, controller(prefixes), rx));

        let (mut read_half, mut write_half) = tokio::io::split(client);
        write_half.write_all(requests).await.unwrap();
        write_half.shutdown().await.unwrap();

        let mut out = String::new();
        read_half.read_to_string(&mut out).await.unwrap();
        task.await.unwrap().unwrap();
        out
    }

    #[tokio::test]
    async fn answers_each_line_in_order() {
        let out = exchange(b"10.1.2.3\n11.0.0.1\n2001:db8::1\n::1\n", "10.0.0.0/8\n2001:db8::/32\n").await;
        assert_eq!(out, "FOUND\nNOT_FOUND\nFOUND\nNOT_FOUND\n");
    }

    #[tokio::test]
    async fn malformed_lines_are_not_found() {
        let out = exchange(b"not-an-ip\n\n\xff\xfe\n10.0.0.1\n", "10.0.0.0/8\n").await;
        assert_eq!(out, "NOT_FOUND\nNOT_FOUND\nNOT_FOUND\nFOUND\n");
    }

    #[tokio::test]
    async fn crlf_and_unterminated_last_line() {
        let out = exchange(b"10.0.0.1\r\n10.0.0.2", "10.0.0.0/8\n").await;
        assert_eq!(out, "FOUND\nFOUND\n");
    }

    #[tokio::test]
    async fn oversized_line_is_answered_and_stream_resyncs() {
        let mut requests = vec![b'1'; MAX_LINE_LEN + 10];
        requests.extend_from_slice(b"\n10.0.0.1\n");
        let out = exchange(&requests, "10.0.0.0/8\n").await;
        assert_eq!(out, "NOT_FOUND\nFOUND\n");
    }

    #[tokio::test]
    async fn empty_stream_answers_nothing() {
        let out = exchange(b"", "10.0.0.0/8\n").await;
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn shutdown_ends_idle_connection() {
        let (client, server) = duplex(1024);
        let (tx, rx) = broadcast::channel(1);
        let task = tokio::spawn(handle_connection(server, controller("10.0.0.0/8\n"), rx));

        let mut client = BufReader::new(client);
        client.write_all(b"10.0.0.1\n").await.unwrap();
        let mut reply = String::new();
        client.read_line(&mut reply).await.unwrap();
        assert_eq!(reply, "FOUND\n");

        tx.send(()).unwrap();
        assert_eq!(task.await.unwrap().unwrap(), 1);
    }
}
