//! Canvas process UI: renders one scenario in the current terminal and talks
//! to the host through a [`CanvasServer`].

mod app;
pub mod items;

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use serde_json::Value;
use tcanvas_core::ScenarioDefinition;
use tcanvas_ipc::{CanvasServer, Responder, ServerEvent};

use app::{App, Reply};

// ---------------------------------------------------------------------------
// Terminal cleanup guard
// ---------------------------------------------------------------------------

/// Restores the terminal when dropped, including on panic or early `?`.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run the canvas until the user decides, the host closes, or the host goes
/// away.
pub async fn run_canvas(
    scenario: &ScenarioDefinition,
    config: Value,
    mut server: CanvasServer,
) -> anyhow::Result<()> {
    let mut app = App::new(scenario, config);
    let responder = server.responder();

    enable_raw_mode()?;
    let _guard = TerminalGuard;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    loop {
        terminal.draw(|frame| render(frame, &mut app))?;

        if app.should_quit {
            break;
        }

        tokio::select! {
            // Poll the keyboard on a short tick so host messages stay responsive.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                while event::poll(Duration::from_millis(0))? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let Some(action) = app::map_key(key) else {
                        continue;
                    };
                    if let Some(reply) = app.handle(action) {
                        deliver(&responder, reply).await;
                        break;
                    }
                }
            }
            event = server.next_event() => {
                match event {
                    Some(ServerEvent::Connected) => tracing::debug!("host attached"),
                    Some(ServerEvent::Update(config)) => {
                        tracing::debug!("config update from host");
                        app.replace_config(config);
                    }
                    Some(ServerEvent::Close) => {
                        tracing::info!("host closed the canvas");
                        app.close();
                    }
                    Some(ServerEvent::Disconnected) | None => {
                        tracing::info!("host disconnected; closing canvas");
                        app.close();
                    }
                }
            }
        }
    }

    terminal.show_cursor()?;
    Ok(())
}

async fn deliver(responder: &Responder, reply: Reply) {
    let sent = match reply {
        Reply::Selected(data) => responder.send_selected(data).await,
        Reply::Cancelled(reason) => responder.send_cancelled(reason).await,
    };
    match sent {
        Ok(true) => tracing::debug!("reply delivered to host"),
        Ok(false) => tracing::info!("no host to receive the reply"),
        Err(e) => tracing::warn!("failed to deliver reply: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(frame: &mut Frame, app: &mut App) {
    let header_height = if app.view().header.is_some() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header_height), // Column headers / summary
            Constraint::Min(3),                // Items
            Constraint::Length(3),             // Help bar
        ])
        .split(frame.area());

    // Viewport = list height minus the block borders.
    app.set_viewport(usize::from(chunks[1].height.saturating_sub(2)));

    if let Some(header) = &app.view().header {
        let line = Paragraph::new(format!(" {header}")).style(Style::default().bold());
        frame.render_widget(line, chunks[0]);
    }

    let title = format!(" {} · {} ", app.view().title, app.scenario);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let interaction = app.interaction();
    if interaction.is_empty() {
        let empty = Paragraph::new(app.view().empty_message.as_str())
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, chunks[1]);
    } else {
        let visible = usize::from(chunks[1].height.saturating_sub(2));
        let items: Vec<ListItem> = app
            .view()
            .lines
            .iter()
            .enumerate()
            .skip(interaction.scroll())
            .take(visible)
            .map(|(i, line)| {
                let mark = if interaction.is_marked(i) { "● " } else { "  " };
                let style = if i == interaction.cursor() {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{mark}{line}")).style(style)
            })
            .collect();
        frame.render_widget(List::new(items).block(block), chunks[1]);
    }

    let mut help = format!(" {}", app.key_hint);
    if let Some(path) = app.focus_hint() {
        help.push_str(&format!(" | {path}"));
    }
    let help = Paragraph::new(help).block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[2]);
}
