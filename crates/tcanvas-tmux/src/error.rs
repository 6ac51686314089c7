//! Error types for the tmux backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TmuxError {
    #[error("tmux command failed: {0}")]
    CommandFailed(String),

    #[error("tmux not found")]
    NotFound,

    #[error("tmux io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal failure to get a command running in a pane.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// No tmux session is active; nothing was attempted.
    #[error("{what} requires tmux: run inside a tmux session")]
    NoSession { what: &'static str },

    /// Reuse (if any) and split both failed.
    #[error("failed to spawn tmux pane (attempted: {attempted}): {source}")]
    Exhausted {
        attempted: String,
        #[source]
        source: TmuxError,
    },
}
