//! tcanvas-ipc: one-session Unix socket channel between host and canvas.
//!
//! The canvas process runs a [`CanvasServer`]; the host connects with a
//! [`CanvasClient`]. Frames are newline-delimited JSON [`IpcMessage`]s.
//!
//! [`IpcMessage`]: tcanvas_core::IpcMessage

pub mod client;
pub mod codec;
pub mod error;
pub mod server;

pub use client::{CanvasClient, CanvasOutcome, CanvasUpdater, DEFAULT_CONNECT_TIMEOUT};
pub use error::IpcError;
pub use server::{CanvasServer, DEFAULT_PEER_GRACE, Responder, ServerEvent};
