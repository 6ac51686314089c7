use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("ipc io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("a canvas is already listening at {}", .0.display())]
    AddressInUse(PathBuf),

    #[error("could not connect to canvas at {} within {timeout_ms}ms: {source}", .path.display())]
    ConnectTimeout {
        path: PathBuf,
        timeout_ms: u128,
        #[source]
        source: std::io::Error,
    },

    #[error("canvas session already ended")]
    SessionEnded,
}
