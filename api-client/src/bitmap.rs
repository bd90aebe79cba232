//! Bounded bitmap transfer
//!
//! A frame is staged in its own allocation and only handed back once every
//! byte has arrived, so callers never see a partially received frame.

use std::io::{ErrorKind, Read};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::types::BitmapMeta;

pub(crate) const HEADER_TOTAL: &str = "X-Image-Total";
pub(crate) const HEADER_INDEX: &str = "X-Image-Index";
pub(crate) const HEADER_WIDTH: &str = "X-Image-Width";
pub(crate) const HEADER_HEIGHT: &str = "X-Image-Height";
pub(crate) const HEADER_CONTENT_TYPE: &str = "X-Content-Type";

const READ_CHUNK: usize = 4096;

fn header_u32(response: &ureq::Response, name: &str) -> Option<u32> {
    response.header(name)?.trim().parse::<u32>().ok()
}

/// Collect the metadata headers of a bitmap response
pub(crate) fn read_meta(response: &ureq::Response) -> BitmapMeta {
    BitmapMeta {
        total: header_u32(response, HEADER_TOTAL),
        index: header_u32(response, HEADER_INDEX),
        width: header_u32(response, HEADER_WIDTH),
        height: header_u32(response, HEADER_HEIGHT),
        content_type: response.header(HEADER_CONTENT_TYPE).map(|s| s.to_string()),
    }
}

/// Declared body length, if the server sent one
pub(crate) fn declared_length(response: &ureq::Response) -> Option<usize> {
    response.header("Content-Length")?.trim().parse::<usize>().ok()
}

/// Read exactly `expected` bytes from `reader` before `deadline` elapses
///
/// The deadline is measured from the call, i.e. from the start of the body,
/// and holds even while a single `read` is blocked: reads run on a helper
/// thread and the caller stops waiting once the budget is spent. A body
/// that ends early, stalls past a per-read timeout, or is still arriving
/// when the deadline passes yields [`FetchError::SizeMismatch`] carrying
/// the number of bytes that did arrive. The staged bytes are dropped on
/// every error path.
pub fn read_frame<R: Read + Send + 'static>(
    reader: R,
    expected: usize,
    deadline: Duration,
) -> Result<Vec<u8>, FetchError> {
    let started = Instant::now();
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("bitmap-reader".to_string())
        .spawn(move || pump(reader, expected, tx))
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let mut staged = Vec::with_capacity(expected);
    while staged.len() < expected {
        let remaining = deadline.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            warn!(
                received = staged.len(),
                expected,
                ?deadline,
                "bitmap read deadline elapsed"
            );
            break;
        }

        match rx.recv_timeout(remaining) {
            Ok(Chunk::Data(bytes)) => staged.extend_from_slice(&bytes),
            Ok(Chunk::Stalled(reason)) => {
                debug!(received = staged.len(), %reason, "bitmap body stalled");
                break;
            }
            Ok(Chunk::Failed(reason)) => return Err(FetchError::Transport(reason)),
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    received = staged.len(),
                    expected,
                    ?deadline,
                    "bitmap read deadline elapsed"
                );
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if staged.len() != expected {
        return Err(FetchError::SizeMismatch {
            expected,
            actual: staged.len(),
        });
    }

    Ok(staged)
}

/// What the reader thread hands back
enum Chunk {
    Data(Vec<u8>),
    Stalled(String),
    Failed(String),
}

/// Forward up to `expected` bytes from `reader`, then hang up
///
/// Ends at end of body, on the first error, or once the receiving side has
/// given up.
fn pump<R: Read>(mut reader: R, expected: usize, tx: Sender<Chunk>) {
    let mut buf = vec![0u8; READ_CHUNK.min(expected.max(1))];
    let mut forwarded = 0;

    while forwarded < expected {
        let want = buf.len().min(expected - forwarded);
        let chunk = match reader.read(&mut buf[..want]) {
            Ok(0) => return,
            Ok(n) => {
                forwarded += n;
                Chunk::Data(buf[..n].to_vec())
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::UnexpectedEof
                ) =>
            {
                Chunk::Stalled(e.to_string())
            }
            Err(e) => Chunk::Failed(e.to_string()),
        };

        let last = !matches!(chunk, Chunk::Data(_));
        if tx.send(chunk).is_err() || last {
            return;
        }
    }
}
