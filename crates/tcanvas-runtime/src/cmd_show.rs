//! `tcanvas show`: the canvas process started inside the pane.

use anyhow::Context;
use serde_json::Value;
use tcanvas_core::{ScenarioRegistry, merge_config};
use tcanvas_ipc::CanvasServer;

use crate::canvas;
use crate::cli::ShowOpts;
use crate::settings::read_config_arg;

pub async fn cmd_show(opts: &ShowOpts, registry: &ScenarioRegistry) -> anyhow::Result<()> {
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

    let server = CanvasServer::bind(&opts.socket)
        .await
        .with_context(|| format!("failed to listen on {}", opts.socket.display()))?;
    tracing::info!(
        id = %opts.id,
        kind = %opts.kind,
        scenario = %scenario.name,
        "canvas started"
    );

    canvas::run_canvas(scenario, config, server).await?;
    tracing::info!(id = %opts.id, "canvas finished");
    Ok(())
}
