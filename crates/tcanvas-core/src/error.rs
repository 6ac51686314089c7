//! Error types for the canvas core.

use thiserror::Error;

use crate::kind::CanvasKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("unknown canvas kind: {0}")]
    UnknownKind(String),

    #[error("unknown scenario '{name}' for canvas kind {kind}")]
    UnknownScenario { kind: CanvasKind, name: String },

    #[error("invalid invocation id '{0}': use only letters, digits, '.', '_' or '-'")]
    InvalidInvocationId(String),

    #[error("invalid canvas config: {0}")]
    InvalidConfig(String),
}
