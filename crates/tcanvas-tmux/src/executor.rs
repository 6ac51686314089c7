//! Subprocess seam: every tmux call goes through [`TmuxCommandRunner`], so
//! pane logic is tested against scripted runners.

use std::process::{Command, Output};

use crate::error::TmuxError;

pub trait TmuxCommandRunner: Send + Sync {
    /// Run `tmux <args>` and return stdout. Non-zero exit is an error.
    fn run(&self, args: &[&str]) -> Result<String, TmuxError>;
}

impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for &T {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        (**self).run(args)
    }
}

/// Runs the real tmux binary, one process per call.
///
/// Calls reach the server of the enclosing session via the inherited `TMUX`
/// variable.
#[derive(Debug, Clone)]
pub struct TmuxExecutor {
    program: String,
}

impl TmuxExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd
    }
}

impl Default for TmuxExecutor {
    fn default() -> Self {
        Self::new("tmux")
    }
}

fn failure_text(output: &Output) -> String {
    let code = match output.status.code() {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    };
    format!(
        "exit {code}: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    )
}

impl TmuxCommandRunner for TmuxExecutor {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        tracing::trace!(program = %self.program, ?args, "tmux");
        let output = self.command(args).output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TmuxError::NotFound,
            _ => TmuxError::Io(e),
        })?;
        if !output.status.success() {
            return Err(TmuxError::CommandFailed(failure_text(&output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
