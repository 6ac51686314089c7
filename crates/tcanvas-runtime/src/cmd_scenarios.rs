//! `tcanvas scenarios`: list the scenario registry.

use tcanvas_core::{CanvasKind, ScenarioRegistry};

use crate::cli::ScenariosOpts;

pub fn cmd_scenarios(opts: &ScenariosOpts, registry: &ScenarioRegistry) -> anyhow::Result<()> {
    if opts.json {
        let list = registry.list(opts.kind);
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else {
        print!("{}", format_table(registry, opts.kind));
    }
    Ok(())
}

/// One row per scenario, columns aligned, the kind's default marked with `*`.
pub(crate) fn format_table(registry: &ScenarioRegistry, kind: Option<CanvasKind>) -> String {
    let defs = registry.list(kind);
    let name_width = defs
        .iter()
        .map(|d| d.name.len() + 1)
        .max()
        .unwrap_or(0)
        .max("SCENARIO".len());

    let mut out = format!(
        "{:<8} {:<name_width$} {:<12} {:<9} DESCRIPTION\n",
        "KIND", "SCENARIO", "MODE", "CLOSE-ON"
    );
    for def in defs {
        let marker = if def.name == def.canvas_kind.default_scenario() {
            "*"
        } else {
            ""
        };
        let name = format!("{}{marker}", def.name);
        out.push_str(&format!(
            "{:<8} {:<name_width$} {:<12} {:<9} {}\n",
            def.canvas_kind.as_str(),
            name,
            def.interaction_mode.as_str(),
            def.close_on.as_str(),
            def.description
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_kind_in_name_order() {
        let registry = ScenarioRegistry::with_builtins();
        let out = format_table(&registry, Some(CanvasKind::Table));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("KIND"));
        assert!(lines[1].starts_with("table    display*"));
        assert!(lines[2].contains("multi-select "));
        assert!(lines[2].contains("command"));
        assert!(lines[3].contains("select "));
    }

    #[test]
    fn full_listing_has_every_builtin() {
        let registry = ScenarioRegistry::with_builtins();
        let out = format_table(&registry, None);
        assert_eq!(out.lines().count(), registry.len() + 1);
        assert!(out.contains("explore*"));
    }
}
