//! Newline-delimited JSON framing.

use std::io;

use tcanvas_core::IpcMessage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::IpcError;

/// Longest accepted frame, newline excluded. Longer frames are skipped.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Serialize one message as a single line, newline included.
pub fn encode(msg: &IpcMessage) -> Result<Vec<u8>, IpcError> {
    let mut buf = serde_json::to_vec(msg)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Parse one received frame. Blank, malformed or non-UTF-8 frames yield
/// `None`; the caller drops them.
pub fn decode(frame: &[u8]) -> Option<IpcMessage> {
    let trimmed = frame.trim_ascii();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_slice(trimmed) {
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::debug!("dropping malformed ipc line: {e}");
            None
        }
    }
}

/// Read the next frame into `buf`, newline included. Returns `Ok(false)` at
/// EOF. A frame longer than `max_len` is consumed up to its newline and
/// leaves `buf` empty, so memory stays bounded whatever the peer sends.
pub(crate) async fn read_frame<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_len: usize,
) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut oversized = false;
    let mut seen = 0usize;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if oversized {
                tracing::debug!(len = seen, "dropping oversized ipc frame at eof");
                return Ok(false);
            }
            return Ok(!buf.is_empty());
        }
        let (chunk, complete) = match available.iter().position(|b| *b == b'\n') {
            Some(end) => (&available[..=end], true),
            None => (available, false),
        };
        let used = chunk.len();
        seen += used;
        if !oversized {
            if seen > max_len + 1 {
                oversized = true;
                buf.clear();
            } else {
                buf.extend_from_slice(chunk);
            }
        }
        reader.consume(used);

        if complete {
            if oversized {
                tracing::debug!(len = seen, "dropping oversized ipc frame");
            }
            return Ok(true);
        }
    }
}

pub(crate) async fn write_message<W>(writer: &mut W, msg: &IpcMessage) -> Result<(), IpcError>
where
    W: AsyncWrite + Unpin,
{
    let buf = encode(msg)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
