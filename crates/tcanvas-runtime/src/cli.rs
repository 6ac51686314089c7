//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tcanvas_core::CanvasKind;

#[derive(Parser)]
#[command(name = "tcanvas", about = "Interactive terminal canvases in a tmux side pane")]
pub struct Cli {
    /// Directory for sockets, config files and logs
    /// (default: $XDG_RUNTIME_DIR/tcanvas or /tmp/tcanvas-$USER)
    #[arg(long, global = true, env = "TCANVAS_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// File remembering the canvas pane id (default: <state-dir>/canvas-pane-id)
    #[arg(long, global = true, env = "TCANVAS_PANE_FILE")]
    pub pane_file: Option<PathBuf>,

    /// tmux binary
    #[arg(long, global = true, env = "TCANVAS_TMUX", default_value = "tmux")]
    pub tmux_bin: String,

    /// Pause between interrupting a reused pane and typing the new command
    #[arg(long, global = true, env = "TCANVAS_SETTLE_MS", default_value_t = 150)]
    pub settle_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a canvas in this terminal (started inside the canvas pane)
    Show(ShowOpts),
    /// Open a canvas in the side pane and wait for its result
    Spawn(SpawnOpts),
    /// List registered scenarios
    Scenarios(ScenariosOpts),
    /// Open a URL with browsh in the side pane
    Browser(BrowserOpts),
    /// Print the detected terminal environment
    Env,
}

#[derive(clap::Args)]
pub struct ShowOpts {
    /// Canvas kind (chart, json, kanban, table, weather, zmanim)
    pub kind: CanvasKind,

    /// Invocation id
    #[arg(long)]
    pub id: String,

    /// Socket to listen on for the host
    #[arg(long)]
    pub socket: PathBuf,

    /// Config as inline JSON or @<file>
    #[arg(long)]
    pub config: Option<String>,

    /// Scenario name (default depends on kind)
    #[arg(long)]
    pub scenario: Option<String>,
}

#[derive(clap::Args)]
pub struct SpawnOpts {
    pub kind: CanvasKind,

    /// Invocation id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Config as inline JSON or @<file>
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long)]
    pub scenario: Option<String>,

    /// Config update to push after attaching, inline JSON or @<file>; repeatable
    #[arg(long = "update")]
    pub updates: Vec<String>,

    /// Give up after this many seconds and close the canvas
    #[arg(long)]
    pub timeout: Option<u64>,

    /// How long to wait for the canvas socket to appear
    #[arg(long, default_value_t = 10_000)]
    pub connect_timeout_ms: u64,
}

#[derive(clap::Args)]
pub struct ScenariosOpts {
    /// Only list scenarios of this kind
    pub kind: Option<CanvasKind>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct BrowserOpts {
    pub url: String,

    /// Let browsh show the Firefox window
    #[arg(long)]
    pub with_gui: bool,
}

/// Default state directory using $USER for per-user isolation.
pub fn default_state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(dir).join("tcanvas");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/tcanvas-{user}"))
}
