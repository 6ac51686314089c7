//! tcanvas-tmux: tmux IO boundary for canvas panes.
//! Provides subprocess execution, session detection, the persisted canvas
//! pane identity, and the reuse-or-split pane lifecycle.

pub mod decorate;
pub mod env;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod registry;

pub use decorate::decorate_pane;
pub use env::{TMUX_ENV_VAR, TerminalEnvironment};
pub use error::{SpawnError, TmuxError};
pub use executor::{TmuxCommandRunner, TmuxExecutor};
pub use lifecycle::{
    DEFAULT_SETTLE_DELAY, DEFAULT_SPLIT_PERCENT, PaneAction, PaneLifecycleManager, SpawnResult,
};
pub use registry::{FilePaneStore, MemoryPaneStore, PaneHandle, PaneRegistry, PaneStore};
