//! Wire messages exchanged between host and canvas process.
//!
//! Each message is one JSON object tagged by `type`, framed by a newline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reason sent when the user quits a canvas locally.
pub const USER_QUIT_REASON: &str = "User quit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcMessage {
    /// Host -> canvas: replace the live configuration.
    Update { config: Value },
    /// Canvas -> host: terminal selection result.
    Selected { data: Value },
    /// Canvas -> host: terminal cancellation.
    Cancelled { reason: String },
    /// Either direction: terminate the session.
    Close,
    /// Any `type` this build does not know. Receivers ignore it.
    #[serde(other)]
    Unknown,
}

impl IpcMessage {
    pub fn update(config: Value) -> Self {
        Self::Update { config }
    }

    pub fn selected(data: Value) -> Self {
        Self::Selected { data }
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Whether this message ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Selected { .. } | Self::Cancelled { .. } | Self::Close)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Update { .. } => "update",
            Self::Selected { .. } => "selected",
            Self::Cancelled { .. } => "cancelled",
            Self::Close => "close",
            Self::Unknown => "unknown",
        }
    }
}
