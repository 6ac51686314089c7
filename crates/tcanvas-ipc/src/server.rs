//! Canvas-side server: one listening socket, one accepted peer, one
//! terminal message.
//!
//! Inbound messages are forwarded in arrival order to a mailbox the render
//! loop drains with [`CanvasServer::next_event`]. Outbound terminal messages
//! go through a cloneable [`Responder`]; the first one wins and ends the
//! session.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tcanvas_core::IpcMessage;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use crate::codec;
use crate::error::IpcError;

/// How long a terminal message waits for the host to connect.
pub const DEFAULT_PEER_GRACE: Duration = Duration::from_secs(2);

/// Inbound event delivered to the render loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// The host attached.
    Connected,
    /// Replace the live config.
    Update(Value),
    /// The host asked the canvas to exit now.
    Close,
    /// The host went away without a `close`.
    Disconnected,
}

struct Shared {
    writer: Mutex<Option<OwnedWriteHalf>>,
    connected: watch::Sender<bool>,
    claimed: AtomicBool,
    terminated: AtomicBool,
    reader_task: std::sync::Mutex<Option<JoinHandle<()>>>,
    peer_grace: Duration,
}

pub struct CanvasServer {
    socket_path: PathBuf,
    events: mpsc::UnboundedReceiver<ServerEvent>,
    shared: Arc<Shared>,
    accept_task: JoinHandle<()>,
}

impl CanvasServer {
    /// Listen at `path` with the default peer grace period.
    pub async fn bind(path: impl AsRef<Path>) -> Result<Self, IpcError> {
        Self::bind_with_grace(path, DEFAULT_PEER_GRACE).await
    }

    pub async fn bind_with_grace(
        path: impl AsRef<Path>,
        peer_grace: Duration,
    ) -> Result<Self, IpcError> {
        let socket_path = path.as_ref().to_path_buf();
        if let Some(dir) = socket_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        // Check for stale socket
        if socket_path.exists() {
            if UnixStream::connect(&socket_path).await.is_ok() {
                return Err(IpcError::AddressInUse(socket_path));
            }
            std::fs::remove_file(&socket_path)?;
            tracing::info!("removed stale socket at {}", socket_path.display());
        }

        let listener = UnixListener::bind(&socket_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (connected, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            writer: Mutex::new(None),
            connected,
            claimed: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            reader_task: std::sync::Mutex::new(None),
            peer_grace,
        });
        let (events_tx, events) = mpsc::unbounded_channel();
        let accept_task = tokio::spawn(accept_loop(listener, Arc::clone(&shared), events_tx));

        tracing::debug!("canvas ipc listening on {}", socket_path.display());
        Ok(Self {
            socket_path,
            events,
            shared,
            accept_task,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Next inbound event, in arrival order. `None` once the listener is gone.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }

    pub fn responder(&self) -> Responder {
        Responder {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Whether a terminal message was sent or a `close` received.
    pub fn is_terminated(&self) -> bool {
        self.shared.terminated.load(Ordering::SeqCst)
    }
}

impl Drop for CanvasServer {
    fn drop(&mut self) {
        self.accept_task.abort();
        if let Ok(mut slot) = self.shared.reader_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            tracing::debug!("failed to remove socket {}: {e}", self.socket_path.display());
        }
    }
}

async fn accept_loop(
    listener: UnixListener,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    loop {
        let stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(e) => {
                tracing::warn!("canvas ipc accept failed: {e}");
                return;
            }
        };
        if shared.claimed.swap(true, Ordering::SeqCst) {
            tracing::debug!("rejecting additional ipc connection");
            drop(stream);
            continue;
        }

        let (reader, writer) = stream.into_split();
        *shared.writer.lock().await = Some(writer);
        shared.connected.send_replace(true);
        if events.send(ServerEvent::Connected).is_err() {
            return;
        }
        let task = tokio::spawn(read_loop(reader, Arc::clone(&shared), events.clone()));
        if let Ok(mut slot) = shared.reader_task.lock() {
            *slot = Some(task);
        }
    }
}

async fn read_loop(
    reader: OwnedReadHalf,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    let mut reader = BufReader::new(reader);
    let mut frame = Vec::new();
    loop {
        match codec::read_frame(&mut reader, &mut frame, codec::MAX_FRAME_LEN).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                tracing::debug!("canvas ipc read error: {e}");
                break;
            }
        }
        let Some(msg) = codec::decode(&frame) else {
            continue;
        };
        let kind = msg.type_name();
        if shared.terminated.load(Ordering::SeqCst) {
            tracing::debug!(kind, "ignoring message after session end");
            continue;
        }
        match msg {
            IpcMessage::Update { config } => {
                if events.send(ServerEvent::Update(config)).is_err() {
                    return;
                }
            }
            IpcMessage::Close => {
                shared.terminated.store(true, Ordering::SeqCst);
                let _ = events.send(ServerEvent::Close);
                return;
            }
            IpcMessage::Selected { .. } | IpcMessage::Cancelled { .. } | IpcMessage::Unknown => {
                tracing::debug!(kind, "ignoring message not meant for canvas");
            }
        }
    }
    let _ = events.send(ServerEvent::Disconnected);
}

/// Sends the session's single terminal message to the host.
#[derive(Clone)]
pub struct Responder {
    shared: Arc<Shared>,
}

impl Responder {
    pub async fn send_selected(&self, data: Value) -> Result<bool, IpcError> {
        self.finish(IpcMessage::selected(data)).await
    }

    pub async fn send_cancelled(&self, reason: impl Into<String>) -> Result<bool, IpcError> {
        self.finish(IpcMessage::cancelled(reason)).await
    }

    /// Send `msg` and end the session. Returns `Ok(false)` without writing
    /// when the session already ended or no host attached within the grace
    /// period.
    async fn finish(&self, msg: IpcMessage) -> Result<bool, IpcError> {
        if self.shared.terminated.swap(true, Ordering::SeqCst) {
            tracing::debug!(kind = msg.type_name(), "session already ended; not sending");
            return Ok(false);
        }

        let mut connected = self.shared.connected.subscribe();
        let wait_for_host = async { connected.wait_for(|c| *c).await.map(|_| ()) };
        let attached = matches!(
            tokio::time::timeout(self.shared.peer_grace, wait_for_host).await,
            Ok(Ok(()))
        );
        if !attached {
            tracing::debug!(kind = msg.type_name(), "no host attached; outcome not delivered");
            return Ok(false);
        }

        let mut slot = self.shared.writer.lock().await;
        let Some(writer) = slot.as_mut() else {
            return Ok(false);
        };
        codec::write_message(writer, &msg).await?;
        if let Err(e) = writer.shutdown().await {
            tracing::debug!("ipc shutdown after terminal message failed: {e}");
        }
        *slot = None;
        Ok(true)
    }
}
