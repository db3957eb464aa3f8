//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! `streamGenerateContent?alt=sse` answers with a sequence of events, each a
//! `data:` line carrying one [`GenerateContentResponse`] and terminated by a
//! blank line.  The API uses CRLF line endings; plain LF is accepted as well.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS};
use crate::types::GenerateContentResponse;
use crate::{Error, Result};

/// Process a stream of bytes into a stream of parsed responses.
///
/// Bytes are buffered until a whole event is available, so multi-byte
/// characters and events split across network chunks decode correctly.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    let stream = byte_stream.map(|result| {
        result.map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer, false),
        move |(mut stream, mut buffer, done)| async move {
            if done {
                return None;
            }
            loop {
                if let Some((event_end, rest_start)) = find_event_boundary(&buffer) {
                    let event = buffer[..event_end].to_vec();
                    buffer.drain(..rest_start);
                    if let Some(parsed) = parse_event(&event) {
                        return Some((record(parsed), (stream, buffer, false)));
                    }
                    continue;
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend_from_slice(&bytes);
                    }
                    Some(Err(e)) => {
                        return Some((record(Err(e)), (stream, buffer, true)));
                    }
                    None => {
                        // A final event may lack its trailing blank line.
                        let event = std::mem::take(&mut buffer);
                        return parse_event(&event).map(|parsed| (record(parsed), (stream, buffer, true)));
                    }
                }
            }
        },
    )
}

fn record(result: Result<GenerateContentResponse>) -> Result<GenerateContentResponse> {
    match &result {
        Ok(_) => STREAM_EVENTS.click(),
        Err(_) => STREAM_ERRORS.click(),
    }
    result
}

/// Locates the first blank line in `buffer`.
///
/// Returns the end of the event text and the start of whatever follows it.
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n").map(|at| (at, at + 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|at| (at, at + 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parses one event.  Events without data (comments, keep-alives) yield `None`.
fn parse_event(event: &[u8]) -> Option<Result<GenerateContentResponse>> {
    let text = match std::str::from_utf8(event) {
        Ok(text) => text,
        Err(e) => {
            return Some(Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            )));
        }
    };

    let data: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if data.is_empty() {
        return None;
    }
    let data = data.join("\n");
    if data.trim().is_empty() {
        return None;
    }

    Some(
        serde_json::from_str::<GenerateContentResponse>(&data).map_err(|e| {
            Error::serialization(format!("Failed to parse event JSON: {e}"), Some(Box::new(e)))
        }),
    )
}
