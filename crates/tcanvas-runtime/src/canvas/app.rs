//! Canvas app state: live config, rendered view and the interaction machine.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Value;
use tcanvas_core::{Action, CanvasKind, Interaction, ScenarioDefinition, Verdict};

use super::items::{self, CanvasView};

/// Terminal reply to send to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Selected(Value),
    Cancelled(String),
}

pub struct App {
    pub kind: CanvasKind,
    pub scenario: String,
    pub key_hint: &'static str,
    config: Value,
    view: CanvasView,
    interaction: Interaction,
    pub should_quit: bool,
}

impl App {
    pub fn new(scenario: &ScenarioDefinition, config: Value) -> Self {
        let kind = scenario.canvas_kind;
        let view = items::build_view(kind, &config);
        let interaction = Interaction::new(scenario.interaction_mode, view.lines.len())
            .with_marked(items::initial_marks(kind, &config));
        Self {
            kind,
            scenario: scenario.name.clone(),
            key_hint: scenario.key_hint(),
            config,
            view,
            interaction,
            should_quit: false,
        }
    }

    pub fn view(&self) -> &CanvasView {
        &self.view
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn set_viewport(&mut self, rows: usize) {
        self.interaction.set_viewport(rows);
    }

    pub fn focus_hint(&self) -> Option<String> {
        items::focus_hint(self.kind, &self.config, self.interaction.cursor())
    }

    /// Replace the whole config (host `update`); cursor, scroll and marks
    /// start over.
    pub fn replace_config(&mut self, config: Value) {
        self.view = items::build_view(self.kind, &config);
        self.interaction
            .reset(self.view.lines.len(), items::initial_marks(self.kind, &config));
        self.config = config;
    }

    /// Host `close`: stop without replying.
    pub fn close(&mut self) {
        self.interaction.close();
        self.should_quit = true;
    }

    /// Apply one input; returns the reply when it ends the session.
    pub fn handle(&mut self, action: Action) -> Option<Reply> {
        let verdict = self.interaction.apply(action)?;
        self.should_quit = true;
        Some(match verdict {
            Verdict::Selected(indices) => {
                Reply::Selected(items::selection_payload(self.kind, &self.config, &indices))
            }
            Verdict::Cancelled(reason) => Reply::Cancelled(reason),
        })
    }
}

/// Key bindings shared by every canvas.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    let action = match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
        (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => Action::Quit,
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Action::Down,
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Action::Up,
        (KeyCode::PageDown, _) => Action::PageDown,
        (KeyCode::PageUp, _) => Action::PageUp,
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Action::Home,
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => Action::End,
        (KeyCode::Char(' '), _) => Action::Toggle,
        (KeyCode::Enter, _) => Action::Commit,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tcanvas_core::ScenarioRegistry;

    fn scenario(kind: CanvasKind, name: &str) -> ScenarioDefinition {
        ScenarioRegistry::with_builtins()
            .resolve(kind, name)
            .unwrap()
            .clone()
    }

    fn rows(n: usize) -> Value {
        let rows: Vec<Value> = (0..n).map(|i| json!({"n": i})).collect();
        json!({"columns": [{"key": "n", "label": "N"}], "rows": rows})
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn selection_commit_sends_row_payload() {
        let mut app = App::new(&scenario(CanvasKind::Table, "select"), rows(3));
        assert_eq!(app.handle(Action::Down), None);
        let reply = app.handle(Action::Commit);
        assert_eq!(
            reply,
            Some(Reply::Selected(
                json!({"selectedRows": [{"index": 1, "data": {"n": 1}}]})
            ))
        );
        assert!(app.should_quit);
        assert_eq!(app.handle(Action::Quit), None);
    }

    #[test]
    fn multi_select_toggles_then_confirms_once() {
        let mut app = App::new(&scenario(CanvasKind::Table, "multi-select"), rows(4));
        for action in [
            Action::Toggle,
            Action::Down,
            Action::Toggle,
            Action::Down,
            Action::Down,
            Action::Toggle,
        ] {
            assert_eq!(app.handle(action), None);
        }
        let Some(Reply::Selected(payload)) = app.handle(Action::Commit) else {
            panic!("expected selection");
        };
        let indices: Vec<u64> = payload["selectedRows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["index"].as_u64().unwrap())
            .collect();
        assert_eq!(indices, vec![0, 1, 3]);
    }

    #[test]
    fn view_only_never_selects() {
        let mut app = App::new(&scenario(CanvasKind::Table, "display"), rows(2));
        assert_eq!(app.handle(Action::Commit), None);
        assert_eq!(app.handle(Action::Toggle), None);
        assert!(!app.should_quit);
        assert_eq!(
            app.handle(Action::Quit),
            Some(Reply::Cancelled("User quit".into()))
        );
    }

    #[test]
    fn update_resets_cursor_and_marks() {
        let mut config = rows(5);
        config["selectedRows"] = json!([4]);
        let mut app = App::new(&scenario(CanvasKind::Table, "multi-select"), config);
        assert!(app.interaction().is_marked(4));
        app.handle(Action::End);
        assert_eq!(app.interaction().cursor(), 4);

        app.replace_config(rows(2));
        assert_eq!(app.interaction().cursor(), 0);
        assert_eq!(app.interaction().len(), 2);
        assert_eq!(app.interaction().marked().count(), 0);
        assert_eq!(app.view().lines.len(), 2);
    }

    #[test]
    fn host_close_ends_without_reply() {
        let mut app = App::new(&scenario(CanvasKind::Json, "select"), json!({"data": [1]}));
        app.close();
        assert!(app.should_quit);
        assert_eq!(app.handle(Action::Commit), None);
    }

    #[test]
    fn json_focus_hint_tracks_cursor() {
        let mut app = App::new(
            &scenario(CanvasKind::Json, "explore"),
            json!({"data": {"a": [true]}}),
        );
        assert_eq!(app.focus_hint().as_deref(), Some("$"));
        app.handle(Action::End);
        assert_eq!(app.focus_hint().as_deref(), Some("a[0]"));
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(map_key(key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(map_key(key(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(map_key(key(KeyCode::Char('j'))), Some(Action::Down));
        assert_eq!(map_key(key(KeyCode::Up)), Some(Action::Up));
        assert_eq!(map_key(key(KeyCode::Char('G'))), Some(Action::End));
        assert_eq!(map_key(key(KeyCode::Char(' '))), Some(Action::Toggle));
        assert_eq!(map_key(key(KeyCode::Enter)), Some(Action::Commit));
        assert_eq!(map_key(key(KeyCode::Char('x'))), None);
    }
}
