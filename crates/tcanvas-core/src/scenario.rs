//! Scenario definitions: named interaction contracts per canvas kind.

use std::fmt;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::kind::CanvasKind;

/// How the user may interact with a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    /// Display only; never emits `selected`.
    ViewOnly,
    /// Exactly one `selected` on commit, then exit.
    Selection,
    /// Toggle a local set; one `selected` carrying the whole set on confirm.
    MultiSelect,
}

impl InteractionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ViewOnly => "view-only",
            Self::Selection => "selection",
            Self::MultiSelect => "multi-select",
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What ends a canvas session besides an external `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseOn {
    Escape,
    Selection,
    Command,
}

impl CloseOn {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Escape => "escape",
            Self::Selection => "selection",
            Self::Command => "command",
        }
    }
}

impl fmt::Display for CloseOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one `(kind, name)` scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub canvas_kind: CanvasKind,
    pub description: String,
    pub interaction_mode: InteractionMode,
    pub close_on: CloseOn,
    /// Partial widget configuration; caller config is merged over it.
    pub default_config: serde_json::Value,
}

impl ScenarioDefinition {
    pub fn new(
        canvas_kind: CanvasKind,
        name: impl Into<String>,
        description: impl Into<String>,
        interaction_mode: InteractionMode,
        close_on: CloseOn,
        default_config: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            canvas_kind,
            description: description.into(),
            interaction_mode,
            close_on,
            default_config,
        }
    }

    /// Registry key for this definition.
    pub fn key(&self) -> (CanvasKind, String) {
        (self.canvas_kind, self.name.clone())
    }

    /// One-line key hint for the canvas footer.
    pub fn key_hint(&self) -> &'static str {
        match self.interaction_mode {
            InteractionMode::ViewOnly => "j/k: navigate | q/Esc: close",
            InteractionMode::Selection => "j/k: navigate | Enter: select | q/Esc: cancel",
            InteractionMode::MultiSelect => {
                "j/k: navigate | Space: toggle | Enter: confirm | q/Esc: cancel"
            }
        }
    }
}

// ─── Built-ins ───────────────────────────────────────────────────────

/// All scenarios shipped with tcanvas.
pub fn builtin_scenarios() -> Vec<ScenarioDefinition> {
    builtin_scenarios_on(Local::now().date_naive())
}

/// Built-ins with an explicit "today" for date-dependent defaults.
pub fn builtin_scenarios_on(today: NaiveDate) -> Vec<ScenarioDefinition> {
    use CanvasKind::{Chart, Json, Kanban, Table, Weather, Zmanim};
    use CloseOn::{Command, Escape, Selection};
    use InteractionMode::{MultiSelect, Selection as Select, ViewOnly};

    let chart_defaults = json!({
        "showLegend": true,
        "showValues": true,
        "showGrid": true,
    });
    let json_defaults = json!({
        "expandDepth": 2,
        "showPath": true,
        "showTypes": true,
    });
    let kanban_defaults = json!({
        "showDescription": true,
        "showLabels": true,
        "showCardCount": true,
    });
    let table_select_defaults = json!({
        "showRowNumbers": true,
        "emptyMessage": "No data to select from",
    });

    vec![
        ScenarioDefinition::new(
            Chart,
            "display",
            "Read-only chart display for data visualization",
            ViewOnly,
            Escape,
            chart_defaults.clone(),
        ),
        ScenarioDefinition::new(
            Chart,
            "select",
            "Select data points from the chart",
            Select,
            Selection,
            chart_defaults,
        ),
        ScenarioDefinition::new(
            Json,
            "explore",
            "Interactive JSON tree explorer",
            ViewOnly,
            Escape,
            json_defaults.clone(),
        ),
        ScenarioDefinition::new(
            Json,
            "select",
            "Select a value or path from the JSON tree",
            Select,
            Selection,
            json_defaults,
        ),
        ScenarioDefinition::new(
            Kanban,
            "display",
            "View-only Kanban board display",
            ViewOnly,
            Escape,
            kanban_defaults.clone(),
        ),
        ScenarioDefinition::new(
            Kanban,
            "select",
            "Select a card from the Kanban board",
            Select,
            Selection,
            kanban_defaults.clone(),
        ),
        ScenarioDefinition::new(
            Kanban,
            "manage",
            "Pick a card on the Kanban board to act on",
            Select,
            Selection,
            json!({
                "showDescription": true,
                "showLabels": true,
                "showCardCount": true,
                "showWipLimit": true,
            }),
        ),
        ScenarioDefinition::new(
            Table,
            "display",
            "Read-only table display for viewing tabular data",
            ViewOnly,
            Escape,
            json!({
                "showRowNumbers": true,
                "emptyMessage": "No data to display",
            }),
        ),
        ScenarioDefinition::new(
            Table,
            "select",
            "Select a single row from the table",
            Select,
            Selection,
            table_select_defaults.clone(),
        ),
        ScenarioDefinition::new(
            Table,
            "multi-select",
            "Select multiple rows from the table",
            MultiSelect,
            Command,
            table_select_defaults,
        ),
        ScenarioDefinition::new(
            Weather,
            "display",
            "Display current weather and forecast for a location",
            ViewOnly,
            Escape,
            json!({
                "location": {
                    "name": "New York",
                    "latitude": 40.7128,
                    "longitude": -74.006,
                    "timezone": "America/New_York",
                },
                "units": "fahrenheit",
            }),
        ),
        ScenarioDefinition::new(
            Zmanim,
            "display",
            "Display halachic times for a date and location",
            ViewOnly,
            Escape,
            json!({
                "date": today.format("%Y-%m-%d").to_string(),
                "location": {
                    "name": "Jerusalem",
                    "latitude": 31.7683,
                    "longitude": 35.2137,
                    "timezone": "Asia/Jerusalem",
                },
                "times": [],
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
    }

    #[test]
    fn builtin_keys_are_unique() {
        let defs = builtin_scenarios_on(day());
        let keys: HashSet<_> = defs.iter().map(ScenarioDefinition::key).collect();
        assert_eq!(keys.len(), defs.len());
    }

    #[test]
    fn every_kind_has_its_default_scenario() {
        let defs = builtin_scenarios_on(day());
        for kind in CanvasKind::ALL {
            assert!(
                defs.iter()
                    .any(|d| d.canvas_kind == kind && d.name == kind.default_scenario()),
                "missing default scenario for {kind}"
            );
        }
    }

    #[test]
    fn view_only_scenarios_close_on_escape() {
        for def in builtin_scenarios_on(day()) {
            if def.interaction_mode == InteractionMode::ViewOnly {
                assert_eq!(def.close_on, CloseOn::Escape, "{}:{}", def.canvas_kind, def.name);
            }
        }
    }

    #[test]
    fn zmanim_default_date_uses_today() {
        let defs = builtin_scenarios_on(day());
        let zmanim = defs
            .iter()
            .find(|d| d.canvas_kind == CanvasKind::Zmanim)
            .expect("zmanim scenario");
        assert_eq!(zmanim.default_config["date"], "2026-03-01");
    }

    #[test]
    fn modes_serialize_kebab_case() {
        let json = serde_json::to_string(&InteractionMode::MultiSelect).expect("serialize");
        assert_eq!(json, "\"multi-select\"");
        let json = serde_json::to_string(&InteractionMode::ViewOnly).expect("serialize");
        assert_eq!(json, "\"view-only\"");
    }
}
