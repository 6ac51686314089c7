//! Pane cosmetics: title and border status line.

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;
use crate::registry::PaneHandle;

/// Set the pane title and show it in the bottom border of that pane only.
pub fn decorate_pane(
    runner: &impl TmuxCommandRunner,
    pane: &PaneHandle,
    title: &str,
) -> Result<(), TmuxError> {
    let target = pane.as_str();
    runner.run(&["select-pane", "-t", target, "-T", title])?;
    runner.run(&["set-option", "-p", "-t", target, "pane-border-status", "bottom"])?;
    runner.run(&[
        "set-option",
        "-p",
        "-t",
        target,
        "pane-border-format",
        " #{pane_title} ",
    ])?;
    Ok(())
}
