//! Host-side client: attach to a canvas, push updates, await the outcome.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tcanvas_core::IpcMessage;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::codec;
use crate::error::IpcError;

/// How long [`CanvasClient::connect`] keeps retrying by default. The canvas
/// process binds its socket only after the pane has started it.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Upper bound for flushing queued messages when the client shuts down.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Final result of one canvas invocation as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOutcome {
    Selected(Value),
    Cancelled(String),
    /// The canvas sent `close`.
    Closed,
    /// Channel ended before any terminal message.
    Disconnected,
    /// The host gave up waiting and closed the session.
    TimedOut,
}

impl CanvasOutcome {
    /// Only a selection counts as success; everything else is a cancellation.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Selected(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Selected(_) => "selected",
            Self::Cancelled(_) => "cancelled",
            Self::Closed => "closed",
            Self::Disconnected => "disconnected",
            Self::TimedOut => "timed_out",
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Selected(data) => serde_json::json!({"status": self.status(), "data": data}),
            Self::Cancelled(reason) => {
                serde_json::json!({"status": self.status(), "reason": reason})
            }
            _ => serde_json::json!({"status": self.status()}),
        }
    }
}

enum Outbound {
    Message(IpcMessage),
    Shutdown,
}

/// Cloneable fire-and-forget update handle. Updates are written in the order
/// they were queued.
#[derive(Clone)]
pub struct CanvasUpdater {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl CanvasUpdater {
    pub fn send_update(&self, config: Value) -> Result<(), IpcError> {
        self.tx
            .send(Outbound::Message(IpcMessage::update(config)))
            .map_err(|_| IpcError::SessionEnded)
    }

    /// Queue a `close` behind any pending updates. Nothing is written after it.
    pub fn close(&self) -> Result<(), IpcError> {
        self.tx
            .send(Outbound::Message(IpcMessage::Close))
            .map_err(|_| IpcError::SessionEnded)
    }
}

pub struct CanvasClient {
    reader: BufReader<OwnedReadHalf>,
    frame: Vec<u8>,
    updater: CanvasUpdater,
    writer_task: JoinHandle<()>,
}

impl CanvasClient {
    /// Connect to the canvas at `path`, retrying until `timeout` elapses.
    pub async fn connect(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, IpcError> {
        let path = path.as_ref();
        let deadline = Instant::now() + timeout;
        loop {
            match UnixStream::connect(path).await {
                Ok(stream) => {
                    tracing::debug!("attached to canvas at {}", path.display());
                    return Ok(Self::from_stream(stream));
                }
                Err(e) if Instant::now() + CONNECT_RETRY_INTERVAL < deadline => {
                    tracing::trace!("canvas not ready at {}: {e}", path.display());
                    tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
                }
                Err(source) => {
                    return Err(IpcError::ConnectTimeout {
                        path: path.to_path_buf(),
                        timeout_ms: timeout.as_millis(),
                        source,
                    });
                }
            }
        }
    }

    pub fn from_stream(stream: UnixStream) -> Self {
        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            reader: BufReader::new(reader),
            frame: Vec::new(),
            updater: CanvasUpdater { tx },
            writer_task: tokio::spawn(write_loop(writer, rx)),
        }
    }

    pub fn updater(&self) -> CanvasUpdater {
        self.updater.clone()
    }

    pub fn send_update(&self, config: Value) -> Result<(), IpcError> {
        self.updater.send_update(config)
    }

    /// Wait for the single terminal message. On timeout the session is
    /// closed explicitly before returning [`CanvasOutcome::TimedOut`].
    pub async fn wait_outcome(mut self, timeout: Option<Duration>) -> CanvasOutcome {
        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.read_outcome())
                .await
                .unwrap_or(CanvasOutcome::TimedOut),
            None => self.read_outcome().await,
        };
        let send_close = outcome == CanvasOutcome::TimedOut;
        self.shutdown(send_close).await;
        outcome
    }

    /// Ask the canvas to exit and drop the connection.
    pub async fn close(self) {
        self.shutdown(true).await;
    }

    async fn read_outcome(&mut self) -> CanvasOutcome {
        loop {
            match codec::read_frame(&mut self.reader, &mut self.frame, codec::MAX_FRAME_LEN).await
            {
                Ok(true) => {}
                Ok(false) => return CanvasOutcome::Disconnected,
                Err(e) => {
                    tracing::debug!("canvas connection error: {e}");
                    return CanvasOutcome::Disconnected;
                }
            }
            match codec::decode(&self.frame) {
                Some(IpcMessage::Selected { data }) => return CanvasOutcome::Selected(data),
                Some(IpcMessage::Cancelled { reason }) => return CanvasOutcome::Cancelled(reason),
                Some(IpcMessage::Close) => return CanvasOutcome::Closed,
                Some(msg @ (IpcMessage::Update { .. } | IpcMessage::Unknown)) => {
                    tracing::debug!(kind = msg.type_name(), "ignoring message not meant for host");
                }
                None => {}
            }
        }
    }

    async fn shutdown(self, send_close: bool) {
        let last = if send_close {
            Outbound::Message(IpcMessage::Close)
        } else {
            Outbound::Shutdown
        };
        let _ = self.updater.tx.send(last);
        let mut writer_task = self.writer_task;
        if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer_task)
            .await
            .is_err()
        {
            tracing::debug!("ipc writer did not drain in time");
            writer_task.abort();
        }
    }
}

async fn write_loop(mut writer: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Outbound>) {
    while let Some(item) = rx.recv().await {
        let msg = match item {
            Outbound::Message(msg) => msg,
            Outbound::Shutdown => break,
        };
        if let Err(e) = codec::write_message(&mut writer, &msg).await {
            tracing::debug!("canvas write failed: {e}");
            return;
        }
        if msg.is_terminal() {
            break;
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_selected_is_success() {
        assert!(CanvasOutcome::Selected(json!({})).is_success());
        for outcome in [
            CanvasOutcome::Cancelled("User quit".into()),
            CanvasOutcome::Closed,
            CanvasOutcome::Disconnected,
            CanvasOutcome::TimedOut,
        ] {
            assert!(!outcome.is_success(), "{outcome:?}");
        }
    }

    #[test]
    fn outcome_json_shapes() {
        assert_eq!(
            CanvasOutcome::Selected(json!({"path": "a"})).to_json(),
            json!({"status": "selected", "data": {"path": "a"}})
        );
        assert_eq!(
            CanvasOutcome::Cancelled("User quit".into()).to_json(),
            json!({"status": "cancelled", "reason": "User quit"})
        );
        assert_eq!(
            CanvasOutcome::TimedOut.to_json(),
            json!({"status": "timed_out"})
        );
    }

    #[tokio::test]
    async fn connect_times_out_without_listener() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.sock");
        let err = CanvasClient::connect(&path, Duration::from_millis(120))
            .await
            .err()
            .expect("no listener");
        assert!(matches!(err, IpcError::ConnectTimeout { .. }), "{err}");
    }
}
