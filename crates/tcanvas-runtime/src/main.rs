//! tcanvas: interactive terminal canvases in a tmux side pane.
//!
//! The same binary plays both roles: `spawn` is the host that opens a pane
//! and waits for a result; `show` is the canvas process running in that pane.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tcanvas_core::ScenarioRegistry;
use tcanvas_tmux::TerminalEnvironment;
use tracing_subscriber::EnvFilter;

mod canvas;
mod cli;
mod cmd_browser;
mod cmd_scenarios;
mod cmd_show;
mod cmd_spawn;
mod settings;

use settings::Settings;

/// `TCANVAS_LOG`, then `RUST_LOG`, then the per-command default.
fn log_filter(default: &str) -> EnvFilter {
    let filter = std::env::var("TCANVAS_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default.to_string());
    EnvFilter::new(filter)
}

fn init_stderr_logging(default: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(default))
        .with_writer(std::io::stderr)
        .init();
}

/// The canvas owns the terminal, so its logs go to a file.
fn init_file_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(log_filter("info"))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let settings = Settings::from_cli(&args);
    let registry = ScenarioRegistry::with_builtins();

    match &args.command {
        cli::Command::Show(opts) => {
            init_file_logging(&settings.canvas_log_path(&opts.id))?;
            cmd_show::cmd_show(opts, &registry).await?;
        }
        cli::Command::Spawn(opts) => {
            init_stderr_logging("warn");
            let exit_code = cmd_spawn::cmd_spawn(opts, &settings, &registry).await?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        cli::Command::Scenarios(opts) => {
            init_stderr_logging("warn");
            cmd_scenarios::cmd_scenarios(opts, &registry)?;
        }
        cli::Command::Browser(opts) => {
            init_stderr_logging("warn");
            cmd_browser::cmd_browser(&opts.url, opts.with_gui, &settings).await?;
        }
        cli::Command::Env => {
            let env = TerminalEnvironment::detect();
            println!("{}", env.summary);
        }
    }

    Ok(())
}
