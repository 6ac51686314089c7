//! `tcanvas browser`: browsh in the canvas pane.

use std::time::Duration;

use anyhow::Context;
use tcanvas_core::shell_quote;
use tcanvas_tmux::{SpawnError, decorate_pane};

use crate::settings::Settings;

/// Title shown in the pane border while browsh runs.
pub const BROWSER_PANE_TITLE: &str = "^L URL | Bksp Back | Alt+→ Fwd | ^R Reload | ^Q Quit";

/// browsh ignores Ctrl-C, so a running instance is killed and given this
/// long to exit before the pane is reused.
const BROWSH_EXIT_WAIT: Duration = Duration::from_millis(200);

pub(crate) fn browsh_command(url: &str, with_gui: bool) -> String {
    let mut words = vec!["browsh"];
    if with_gui {
        words.push("--firefox.with-gui");
    }
    words.extend(["--startup-url", url]);
    words
        .iter()
        .map(|w| shell_quote(w))
        .collect::<Vec<_>>()
        .join(" ")
}

pub async fn cmd_browser(url: &str, with_gui: bool, settings: &Settings) -> anyhow::Result<()> {
    let manager = settings.manager();
    if !manager.environment().in_tmux {
        return Err(SpawnError::NoSession { what: "browser" }.into());
    }

    match tokio::process::Command::new("pkill")
        .args(["-f", "browsh"])
        .status()
        .await
    {
        Ok(status) => tracing::debug!("pkill browsh: {status}"),
        Err(e) => tracing::debug!("pkill unavailable: {e}"),
    }
    tokio::time::sleep(BROWSH_EXIT_WAIT).await;

    let command = browsh_command(url, with_gui);
    let result = tokio::task::spawn_blocking(move || {
        let result = manager.run_as("browser", &command)?;
        if let Some(pane) = &result.pane {
            if let Err(e) = decorate_pane(manager.runner(), pane, BROWSER_PANE_TITLE) {
                tracing::warn!(%pane, "failed to title browser pane: {e}");
            }
        }
        Ok::<_, SpawnError>(result)
    })
    .await
    .context("pane task panicked")??;

    tracing::info!(action = ?result.action, "browser opened at {url}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_quotes_url() {
        assert_eq!(
            browsh_command("https://example.com/?q=a b", false),
            "browsh --startup-url 'https://example.com/?q=a b'"
        );
    }

    #[test]
    fn gui_flag() {
        assert_eq!(
            browsh_command("https://example.com", true),
            "browsh --firefox.with-gui --startup-url https://example.com"
        );
    }
}
