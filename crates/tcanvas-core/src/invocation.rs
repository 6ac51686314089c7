//! One canvas invocation: id, derived socket/config paths, spawn command line.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;

use crate::error::CanvasError;
use crate::kind::CanvasKind;

static INVOCATION_SEQ: AtomicU32 = AtomicU32::new(0);

/// Generate a fresh invocation id: `<unix-millis>-<pid>-<seq>`.
pub fn generate_invocation_id() -> String {
    let seq = INVOCATION_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}-{}-{seq}",
        Utc::now().timestamp_millis(),
        std::process::id()
    )
}

fn validate_id(id: &str) -> Result<(), CanvasError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && id != "."
        && id != "..";
    if valid {
        Ok(())
    } else {
        Err(CanvasError::InvalidInvocationId(id.to_string()))
    }
}

/// Everything needed to launch one canvas process.
///
/// The socket and config paths are derived from the id, so every invocation
/// gets its own address even when the pane is reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasInvocation {
    pub id: String,
    pub kind: CanvasKind,
    pub scenario: String,
    pub socket_path: PathBuf,
    pub config_path: PathBuf,
}

impl CanvasInvocation {
    pub fn new(
        id: impl Into<String>,
        kind: CanvasKind,
        scenario: impl Into<String>,
        state_dir: &Path,
    ) -> Result<Self, CanvasError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self {
            socket_path: state_dir.join(format!("canvas-{id}.sock")),
            config_path: state_dir.join(format!("canvas-config-{id}.json")),
            id,
            kind,
            scenario: scenario.into(),
        })
    }

    /// Shell command line run inside the pane:
    /// `<runner> show <kind> --id <id> --config @<file> --socket <path> --scenario <name>`.
    pub fn command_line(&self, runner: &Path) -> String {
        let config_arg = format!("@{}", self.config_path.display());
        let socket_arg = self.socket_path.display().to_string();
        let runner_arg = runner.display().to_string();
        [
            runner_arg.as_str(),
            "show",
            self.kind.as_str(),
            "--id",
            &self.id,
            "--config",
            &config_arg,
            "--socket",
            &socket_arg,
            "--scenario",
            &self.scenario,
        ]
        .iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Quote a word for POSIX `sh`. Plain words pass through unchanged.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '@' | ':' | '=' | ','));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
