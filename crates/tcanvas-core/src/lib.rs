//! tcanvas-core: canvas kinds, scenario registry, IPC wire messages and the
//! interaction state machine. No IO: everything here is pure and testable.

pub mod config;
pub mod error;
pub mod interaction;
pub mod invocation;
pub mod kind;
pub mod message;
pub mod registry;
pub mod scenario;

pub use config::merge_config;
pub use error::CanvasError;
pub use interaction::{Action, Interaction, Verdict};
pub use invocation::{CanvasInvocation, generate_invocation_id, shell_quote};
pub use kind::CanvasKind;
pub use message::IpcMessage;
pub use registry::ScenarioRegistry;
pub use scenario::{CloseOn, InteractionMode, ScenarioDefinition};
