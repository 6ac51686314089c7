//! `tcanvas spawn`: open a canvas in the side pane and wait for its result.

use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tcanvas_core::{CanvasInvocation, ScenarioRegistry, generate_invocation_id, merge_config};
use tcanvas_ipc::{CanvasClient, CanvasOutcome};

use crate::cli::SpawnOpts;
use crate::settings::{Settings, read_config_arg};

/// Reason reported when the host is interrupted while waiting.
const INTERRUPTED_REASON: &str = "Interrupted";

/// How long an interrupted host waits for its `close` to go out.
const CLOSE_FLUSH_WAIT: Duration = Duration::from_secs(1);

/// Exit code for an outcome:
/// - 0: selected
/// - 1: cancelled or closed
/// - 2: canvas disconnected or unreachable
/// - 3: timed out
pub(crate) fn exit_code(outcome: &CanvasOutcome) -> i32 {
    match outcome {
        CanvasOutcome::Selected(_) => 0,
        CanvasOutcome::Cancelled(_) | CanvasOutcome::Closed => 1,
        CanvasOutcome::Disconnected => 2,
        CanvasOutcome::TimedOut => 3,
    }
}

pub async fn cmd_spawn(
    opts: &SpawnOpts,
    settings: &Settings,
    registry: &ScenarioRegistry,
) -> anyhow::Result<i32> {
    let name = opts
        .scenario
        .as_deref()
        .unwrap_or(opts.kind.default_scenario());
    let scenario = registry.resolve(opts.kind, name)?;

    let caller = match &opts.config {
        Some(arg) => read_config_arg(arg)?,
        None => Value::Null,
    };
    let config = merge_config(&scenario.default_config, &caller);
    // Parse updates up front so a typo fails before a pane is touched.
    let updates = opts
        .updates
        .iter()
        .map(|arg| read_config_arg(arg))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let id = opts.id.clone().unwrap_or_else(generate_invocation_id);
    let invocation = CanvasInvocation::new(id, opts.kind, &scenario.name, &settings.state_dir)?;
    write_config_file(&invocation, &config)?;

    let exe = std::env::current_exe().context("cannot locate the tcanvas executable")?;
    let command = invocation.command_line(&exe);
    let manager = settings.manager();
    let spawned = tokio::task::spawn_blocking(move || manager.run(&command))
        .await
        .context("pane task panicked")?;
    let spawned = match spawned {
        Ok(result) => result,
        Err(e) => {
            remove_config_file(&invocation);
            return Err(e.into());
        }
    };
    tracing::info!(
        id = %invocation.id,
        action = ?spawned.action,
        pane = ?spawned.pane.as_ref().map(|p| p.as_str()),
        "canvas launched via {}",
        spawned.method
    );

    let connect_timeout = Duration::from_millis(opts.connect_timeout_ms);
    let outcome = match CanvasClient::connect(&invocation.socket_path, connect_timeout).await {
        Ok(client) => {
            for update in updates {
                client.send_update(update)?;
            }
            let timeout = opts.timeout.map(Duration::from_secs);
            let interrupt = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("cannot listen for ctrl-c: {e}");
                    std::future::pending::<()>().await;
                }
            };
            wait_or_interrupt(client, timeout, interrupt).await
        }
        Err(e) => {
            tracing::warn!("{e}");
            CanvasOutcome::Disconnected
        }
    };
    remove_config_file(&invocation);

    tracing::info!(id = %invocation.id, status = outcome.status(), "canvas finished");
    println!("{}", serde_json::to_string(&outcome.to_json())?);
    Ok(exit_code(&outcome))
}

/// Wait for the outcome unless `interrupt` resolves first. An interrupted
/// host closes the session so the canvas exits instead of dangling.
pub(crate) async fn wait_or_interrupt(
    client: CanvasClient,
    timeout: Option<Duration>,
    interrupt: impl Future<Output = ()>,
) -> CanvasOutcome {
    let updater = client.updater();
    let wait = client.wait_outcome(timeout);
    tokio::pin!(wait);
    tokio::select! {
        outcome = &mut wait => outcome,
        () = interrupt => {
            match updater.close() {
                // Keep polling so the close is flushed before we return.
                Ok(()) => {
                    if tokio::time::timeout(CLOSE_FLUSH_WAIT, &mut wait).await.is_err() {
                        tracing::debug!("canvas did not acknowledge close");
                    }
                }
                Err(e) => tracing::debug!("close after interrupt not sent: {e}"),
            }
            CanvasOutcome::Cancelled(INTERRUPTED_REASON.to_string())
        }
    }
}

fn write_config_file(invocation: &CanvasInvocation, config: &Value) -> anyhow::Result<()> {
    let path = &invocation.config_path;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let body = serde_json::to_vec(config)?;
    std::fs::write(path, body)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn remove_config_file(invocation: &CanvasInvocation) {
    if let Err(e) = std::fs::remove_file(&invocation.config_path) {
        tracing::debug!(
            "failed to remove config file {}: {e}",
            invocation.config_path.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tcanvas_core::CanvasKind;
    use tcanvas_ipc::{CanvasServer, ServerEvent};

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(&CanvasOutcome::Selected(json!({}))), 0);
        assert_eq!(exit_code(&CanvasOutcome::Cancelled("User quit".into())), 1);
        assert_eq!(exit_code(&CanvasOutcome::Closed), 1);
        assert_eq!(exit_code(&CanvasOutcome::Disconnected), 2);
        assert_eq!(exit_code(&CanvasOutcome::TimedOut), 3);
    }

    #[tokio::test]
    async fn interrupt_closes_the_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.sock");
        let mut server = CanvasServer::bind(&path).await.unwrap();
        let client = CanvasClient::connect(&path, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(server.next_event().await, Some(ServerEvent::Connected));

        let outcome = wait_or_interrupt(client, None, async {}).await;
        assert_eq!(outcome, CanvasOutcome::Cancelled("Interrupted".into()));
        assert_eq!(exit_code(&outcome), 1);
        assert_eq!(server.next_event().await, Some(ServerEvent::Close));
        assert!(server.is_terminated());
    }

    #[tokio::test]
    async fn outcome_wins_without_interrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.sock");
        let mut server = CanvasServer::bind(&path).await.unwrap();
        let client = CanvasClient::connect(&path, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(server.next_event().await, Some(ServerEvent::Connected));
        assert!(server.responder().send_selected(json!({"index": 0})).await.unwrap());

        let outcome = wait_or_interrupt(client, None, std::future::pending()).await;
        assert_eq!(outcome, CanvasOutcome::Selected(json!({"index": 0})));
    }

    #[test]
    fn config_file_written_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        let invocation =
            CanvasInvocation::new("t-1", CanvasKind::Table, "select", &state_dir).unwrap();
        let config = json!({"rows": [{"a": 1}]});

        write_config_file(&invocation, &config).unwrap();
        let raw = std::fs::read_to_string(&invocation.config_path).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&raw).unwrap(), config);

        remove_config_file(&invocation);
        assert!(!invocation.config_path.exists());
        // Second removal only logs.
        remove_config_file(&invocation);
    }
}
