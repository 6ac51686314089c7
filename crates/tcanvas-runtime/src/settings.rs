//! Resolved runtime settings and config-argument loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tcanvas_tmux::{
    FilePaneStore, PaneLifecycleManager, PaneRegistry, TerminalEnvironment, TmuxExecutor,
};

use crate::cli::{self, Cli};

pub type Manager = PaneLifecycleManager<TmuxExecutor, FilePaneStore>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub state_dir: PathBuf,
    pub pane_file: PathBuf,
    pub tmux_bin: String,
    pub settle_delay: Duration,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        let state_dir = cli.state_dir.clone().unwrap_or_else(cli::default_state_dir);
        let pane_file = cli
            .pane_file
            .clone()
            .unwrap_or_else(|| state_dir.join("canvas-pane-id"));
        Self {
            state_dir,
            pane_file,
            tmux_bin: cli.tmux_bin.clone(),
            settle_delay: Duration::from_millis(cli.settle_ms),
        }
    }

    /// Log file of the canvas process for invocation `id`.
    pub fn canvas_log_path(&self, id: &str) -> PathBuf {
        self.state_dir.join(format!("canvas-{id}.log"))
    }

    /// Pane lifecycle manager wired to the real tmux and the pane file.
    pub fn manager(&self) -> Manager {
        PaneLifecycleManager::new(
            TmuxExecutor::new(self.tmux_bin.clone()),
            PaneRegistry::new(FilePaneStore::new(self.pane_file.clone())),
            TerminalEnvironment::detect(),
        )
        .with_settle_delay(self.settle_delay)
    }
}

/// Parse a `--config`/`--update` argument: inline JSON, or `@<path>` to read
/// the JSON from a file.
pub fn read_config_arg(arg: &str) -> anyhow::Result<Value> {
    match arg.strip_prefix('@') {
        Some(path) => read_config_file(Path::new(path)),
        None => serde_json::from_str(arg).context("config is not valid JSON"),
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("config file {} is not valid JSON", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[test]
    fn pane_file_defaults_into_state_dir() {
        let cli = Cli::try_parse_from(["tcanvas", "--state-dir", "/run/tc", "env"]).unwrap();
        let settings = Settings::from_cli(&cli);
        assert_eq!(settings.state_dir, PathBuf::from("/run/tc"));
        assert_eq!(settings.pane_file, PathBuf::from("/run/tc/canvas-pane-id"));
        assert_eq!(
            settings.canvas_log_path("7"),
            PathBuf::from("/run/tc/canvas-7.log")
        );
    }

    #[test]
    fn explicit_pane_file_wins() {
        let cli = Cli::try_parse_from([
            "tcanvas",
            "--state-dir",
            "/run/tc",
            "--pane-file",
            "/var/pane",
            "--settle-ms",
            "20",
            "env",
        ])
        .unwrap();
        let settings = Settings::from_cli(&cli);
        assert_eq!(settings.pane_file, PathBuf::from("/var/pane"));
        assert_eq!(settings.settle_delay, Duration::from_millis(20));
    }

    #[test]
    fn inline_config() {
        assert_eq!(
            read_config_arg(r#"{"title":"x"}"#).unwrap(),
            json!({"title": "x"})
        );
        assert!(read_config_arg("{broken").is_err());
    }

    #[test]
    fn config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"rows":[1]}"#).unwrap();
        let arg = format!("@{}", path.display());
        assert_eq!(read_config_arg(&arg).unwrap(), json!({"rows": [1]}));

        let missing = format!("@{}", dir.path().join("nope.json").display());
        let err = read_config_arg(&missing).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
