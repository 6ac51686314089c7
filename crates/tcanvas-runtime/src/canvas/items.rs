//! Per-kind mapping from a canvas config to a flat list of lines and from
//! chosen line indices back to the selection payload sent to the host.

use serde_json::{Value, json};
use tcanvas_core::CanvasKind;

const MIN_CELL_WIDTH: usize = 3;
const MAX_CELL_WIDTH: usize = 30;
const BAR_WIDTH: f64 = 20.0;
const JSON_STRING_PREVIEW: usize = 50;

/// What the canvas draws: a fixed header and one line per item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanvasView {
    pub title: String,
    pub header: Option<String>,
    pub lines: Vec<String>,
    pub empty_message: String,
}

pub fn build_view(kind: CanvasKind, config: &Value) -> CanvasView {
    let mut view = match kind {
        CanvasKind::Table => table_view(config),
        CanvasKind::Kanban => kanban_view(config),
        CanvasKind::Chart => chart_view(config),
        CanvasKind::Json => json_view(config),
        CanvasKind::Weather => weather_view(config),
        CanvasKind::Zmanim => zmanim_view(config),
    };
    view.title = str_field(config, "title")
        .unwrap_or(kind.as_str())
        .to_string();
    view.empty_message = str_field(config, "emptyMessage")
        .unwrap_or("Nothing to display")
        .to_string();
    view
}

/// Items marked before any input (table `selectedRows`).
pub fn initial_marks(kind: CanvasKind, config: &Value) -> Vec<usize> {
    if kind != CanvasKind::Table {
        return Vec::new();
    }
    array(config, "selectedRows")
        .iter()
        .filter_map(Value::as_u64)
        .filter_map(|i| usize::try_from(i).ok())
        .collect()
}

/// Payload of the `selected` message for the chosen item indices.
pub fn selection_payload(kind: CanvasKind, config: &Value, indices: &[usize]) -> Value {
    match kind {
        CanvasKind::Table => table_selection(config, indices),
        CanvasKind::Kanban => kanban_selection(config, indices),
        CanvasKind::Chart => chart_selection(config, indices),
        CanvasKind::Json => json_selection(config, indices),
        CanvasKind::Weather | CanvasKind::Zmanim => {
            let lines = build_view(kind, config).lines;
            let chosen: Vec<&String> = indices.iter().filter_map(|&i| lines.get(i)).collect();
            json!({ "selectedLines": chosen })
        }
    }
}

/// Extra status text for the item under the cursor (json path).
pub fn focus_hint(kind: CanvasKind, config: &Value, cursor: usize) -> Option<String> {
    if kind != CanvasKind::Json || !flag(config, "showPath", true) {
        return None;
    }
    let data = config.get("data")?;
    json_nodes(data).get(cursor).map(|node| path_string(&node.path))
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn flag(config: &Value, key: &str, default: bool) -> bool {
    config.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Bool(true)) => "✓".to_string(),
        Some(Value::Bool(false)) => "✗".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(text: &str, width: usize) -> String {
    let cut = truncate(text, width);
    let fill = width.saturating_sub(cut.chars().count());
    format!("{cut}{}", " ".repeat(fill))
}

// ─── Table ───────────────────────────────────────────────────────────

struct Column {
    key: String,
    label: String,
}

fn table_columns(config: &Value) -> Vec<Column> {
    let declared: Vec<Column> = array(config, "columns")
        .iter()
        .filter_map(|c| {
            let key = str_field(c, "key")?;
            Some(Column {
                key: key.to_string(),
                label: str_field(c, "label").unwrap_or(key).to_string(),
            })
        })
        .collect();
    if !declared.is_empty() {
        return declared;
    }
    // No column list: use the keys of the first row.
    array(config, "rows")
        .first()
        .and_then(Value::as_object)
        .map(|row| {
            row.keys()
                .map(|k| Column {
                    key: k.clone(),
                    label: k.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn table_view(config: &Value) -> CanvasView {
    let columns = table_columns(config);
    let rows = array(config, "rows");
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| scalar_text(row.get(&c.key)))
                .collect()
        })
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain([c.label.chars().count()])
                .max()
                .unwrap_or(0)
                .clamp(MIN_CELL_WIDTH, MAX_CELL_WIDTH)
        })
        .collect();
    let number_width = flag(config, "showRowNumbers", true).then(|| rows.len().to_string().len());

    let render_row = |number: &str, row: &[String]| -> String {
        let mut parts = Vec::with_capacity(row.len() + 1);
        if let Some(w) = number_width {
            parts.push(format!("{number:>w$}"));
        }
        parts.extend(row.iter().zip(&widths).map(|(text, w)| pad(text, *w)));
        parts.join(" │ ").trim_end().to_string()
    };

    let labels: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
    CanvasView {
        header: (!columns.is_empty()).then(|| render_row("#", &labels)),
        lines: cells
            .iter()
            .enumerate()
            .map(|(i, row)| render_row(&(i + 1).to_string(), row))
            .collect(),
        ..CanvasView::default()
    }
}

fn table_selection(config: &Value, indices: &[usize]) -> Value {
    let rows = array(config, "rows");
    let selected: Vec<Value> = indices
        .iter()
        .filter_map(|&i| rows.get(i).map(|row| json!({"index": i, "data": row})))
        .collect();
    json!({ "selectedRows": selected })
}

// ─── Kanban ──────────────────────────────────────────────────────────

/// (column index, card index) for every card, columns left to right.
fn kanban_positions(config: &Value) -> Vec<(usize, usize)> {
    array(config, "columns")
        .iter()
        .enumerate()
        .flat_map(|(ci, col)| (0..array(col, "cards").len()).map(move |k| (ci, k)))
        .collect()
}

fn label_name<'a>(config: &'a Value, id: &'a str) -> &'a str {
    array(config, "labels")
        .iter()
        .find(|l| str_field(l, "id") == Some(id))
        .and_then(|l| str_field(l, "name"))
        .unwrap_or(id)
}

fn kanban_view(config: &Value) -> CanvasView {
    let columns = array(config, "columns");
    let show_description = flag(config, "showDescription", true);
    let show_labels = flag(config, "showLabels", true);
    let show_count = flag(config, "showCardCount", true);
    let show_wip = flag(config, "showWipLimit", false);
    let max_title = config
        .get("maxCardTitleLength")
        .and_then(Value::as_u64)
        .unwrap_or(40) as usize;
    let max_description = config
        .get("maxDescriptionLength")
        .and_then(Value::as_u64)
        .unwrap_or(60) as usize;

    let header = columns
        .iter()
        .map(|col| {
            let title = str_field(col, "title").unwrap_or("?");
            let count = array(col, "cards").len();
            let wip = col.get("wipLimit").and_then(Value::as_u64);
            match (show_count, show_wip, wip) {
                (_, true, Some(limit)) => format!("{title} ({count}/{limit})"),
                (true, _, _) => format!("{title} ({count})"),
                _ => title.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("  |  ");

    let lines = kanban_positions(config)
        .into_iter()
        .map(|(ci, k)| {
            let col = &columns[ci];
            let card = &array(col, "cards")[k];
            let mut line = format!(
                "{} │ {}",
                str_field(col, "title").unwrap_or("?"),
                truncate(str_field(card, "title").unwrap_or(""), max_title)
            );
            if show_labels {
                let labels: Vec<&str> = array(card, "labels")
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|id| label_name(config, id))
                    .collect();
                if !labels.is_empty() {
                    line.push_str(&format!(" [{}]", labels.join(", ")));
                }
            }
            if show_description {
                if let Some(desc) = str_field(card, "description").filter(|d| !d.is_empty()) {
                    line.push_str(&format!(" - {}", truncate(desc, max_description)));
                }
            }
            line
        })
        .collect();

    CanvasView {
        header: (!columns.is_empty()).then_some(header),
        lines,
        ..CanvasView::default()
    }
}

fn kanban_selection(config: &Value, indices: &[usize]) -> Value {
    let positions = kanban_positions(config);
    let Some(&(ci, k)) = indices.first().and_then(|&i| positions.get(i)) else {
        return Value::Null;
    };
    let col = &array(config, "columns")[ci];
    json!({
        "type": "card-selected",
        "selection": {
            "card": array(col, "cards")[k],
            "columnId": col.get("id").cloned().unwrap_or(Value::Null),
            "columnTitle": col.get("title").cloned().unwrap_or(Value::Null),
            "cardIndex": k,
        },
    })
}

// ─── Chart ───────────────────────────────────────────────────────────

struct Point<'a> {
    series_index: usize,
    series_name: &'a str,
    point_index: usize,
    label: &'a str,
    value: f64,
}

fn chart_points(config: &Value) -> Vec<Point<'_>> {
    array(config, "series")
        .iter()
        .enumerate()
        .flat_map(|(si, series)| {
            let name = str_field(series, "name").unwrap_or("");
            array(series, "data")
                .iter()
                .enumerate()
                .map(move |(pi, p)| Point {
                    series_index: si,
                    series_name: name,
                    point_index: pi,
                    label: str_field(p, "label").unwrap_or(""),
                    value: p.get("value").and_then(Value::as_f64).unwrap_or(0.0),
                })
        })
        .collect()
}

fn chart_view(config: &Value) -> CanvasView {
    let points = chart_points(config);
    let show_values = flag(config, "showValues", true);
    let max = points
        .iter()
        .map(|p| p.value.abs())
        .fold(0.0_f64, f64::max);
    let label_width = points
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_CELL_WIDTH);
    let multi_series = array(config, "series").len() > 1;

    let lines = points
        .iter()
        .map(|p| {
            let len = if max > 0.0 {
                (p.value.abs() / max * BAR_WIDTH).round() as usize
            } else {
                0
            };
            let mut line = String::new();
            if multi_series {
                line.push_str(&format!("{}: ", p.series_name));
            }
            line.push_str(&format!("{} {}", pad(p.label, label_width), "█".repeat(len)));
            if show_values {
                line.push_str(&format!(" {}", p.value));
            }
            line
        })
        .collect();

    let header = flag(config, "showLegend", true).then(|| {
        array(config, "series")
            .iter()
            .filter_map(|s| str_field(s, "name"))
            .collect::<Vec<_>>()
            .join("  ")
    });
    CanvasView {
        header: header.filter(|h| !h.is_empty()),
        lines,
        ..CanvasView::default()
    }
}

fn chart_selection(config: &Value, indices: &[usize]) -> Value {
    let points = chart_points(config);
    let selected: Vec<Value> = indices
        .iter()
        .filter_map(|&i| points.get(i))
        .map(|p| {
            json!({
                "seriesIndex": p.series_index,
                "seriesName": p.series_name,
                "pointIndex": p.point_index,
                "label": p.label,
                "value": p.value,
            })
        })
        .collect();
    json!({ "selectedPoints": selected })
}

// ─── Json ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum PathSeg {
    Key(String),
    Index(usize),
}

struct JsonNode<'a> {
    path: Vec<PathSeg>,
    value: &'a Value,
}

/// Depth-first node list, root first.
fn json_nodes(data: &Value) -> Vec<JsonNode<'_>> {
    fn walk<'a>(value: &'a Value, path: Vec<PathSeg>, out: &mut Vec<JsonNode<'a>>) {
        out.push(JsonNode {
            path: path.clone(),
            value,
        });
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    let mut child = path.clone();
                    child.push(PathSeg::Key(k.clone()));
                    walk(v, child, out);
                }
            }
            Value::Array(items) => {
                for (i, v) in items.iter().enumerate() {
                    let mut child = path.clone();
                    child.push(PathSeg::Index(i));
                    walk(v, child, out);
                }
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    walk(data, Vec::new(), &mut out);
    out
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// `$` for the root, then `users[0].name` style; keys that are not plain
/// identifiers use `["key"]`.
fn path_string(path: &[PathSeg]) -> String {
    if path.is_empty() {
        return "$".to_string();
    }
    let mut out = String::new();
    for (i, seg) in path.iter().enumerate() {
        match seg {
            PathSeg::Index(n) => out.push_str(&format!("[{n}]")),
            PathSeg::Key(k) if is_identifier(k) => {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(k);
            }
            PathSeg::Key(k) => out.push_str(&format!("[{}]", Value::from(k.as_str()))),
        }
    }
    out
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn json_preview(value: &Value) -> String {
    match value {
        Value::Object(map) => format!("{{…}} {} keys", map.len()),
        Value::Array(items) => format!("[…] {} items", items.len()),
        Value::String(s) if s.chars().count() > JSON_STRING_PREVIEW => {
            let cut: String = s.chars().take(JSON_STRING_PREVIEW - 3).collect();
            format!("\"{cut}...\"")
        }
        other => other.to_string(),
    }
}

fn json_view(config: &Value) -> CanvasView {
    let Some(data) = config.get("data") else {
        return CanvasView::default();
    };
    let show_types = flag(config, "showTypes", true);
    let lines = json_nodes(data)
        .iter()
        .map(|node| {
            let indent = "  ".repeat(node.path.len());
            let key = match node.path.last() {
                None => "$".to_string(),
                Some(PathSeg::Key(k)) => k.clone(),
                Some(PathSeg::Index(i)) => format!("[{i}]"),
            };
            let mut line = format!("{indent}{key}: {}", json_preview(node.value));
            if show_types {
                line.push_str(&format!("  <{}>", json_type(node.value)));
            }
            line
        })
        .collect();
    CanvasView {
        lines,
        ..CanvasView::default()
    }
}

fn json_selection(config: &Value, indices: &[usize]) -> Value {
    let Some(data) = config.get("data") else {
        return Value::Null;
    };
    let nodes = json_nodes(data);
    let Some(node) = indices.first().and_then(|&i| nodes.get(i)) else {
        return Value::Null;
    };
    let path_array: Vec<Value> = node
        .path
        .iter()
        .map(|seg| match seg {
            PathSeg::Key(k) => Value::from(k.as_str()),
            PathSeg::Index(i) => Value::from(*i),
        })
        .collect();
    json!({
        "path": path_string(&node.path),
        "pathArray": path_array,
        "value": node.value,
        "type": json_type(node.value),
    })
}

// ─── Weather / Zmanim ────────────────────────────────────────────────

fn weather_condition(code: u64) -> &'static str {
    match code {
        0 => "Clear",
        1..=3 => "Partly cloudy",
        45 | 48 => "Fog",
        51..=57 => "Drizzle",
        61..=67 | 80..=82 => "Rain",
        71..=77 | 85 | 86 => "Snow",
        95..=99 => "Thunderstorm",
        _ => "Unknown",
    }
}

fn number_text(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_f64)
        .map(|v| format!("{}", v.round() as i64))
        .unwrap_or_else(|| "?".to_string())
}

fn weather_view(config: &Value) -> CanvasView {
    let fahrenheit = str_field(config, "units") != Some("celsius");
    let (deg, speed) = if fahrenheit { ("°F", "mph") } else { ("°C", "km/h") };
    let location = config.get("location").unwrap_or(&Value::Null);

    let mut header = str_field(location, "name").unwrap_or("Unknown location").to_string();
    if let Some(tz) = str_field(location, "timezone") {
        header.push_str(&format!(" ({tz})"));
    }

    let mut lines = Vec::new();
    if let Some(now) = config.get("current") {
        let code = now.get("weatherCode").and_then(Value::as_u64).unwrap_or(u64::MAX);
        let mut line = format!(
            "Now: {}{deg} {}",
            number_text(now.get("temperature")),
            weather_condition(code)
        );
        if now.get("feelsLike").is_some() {
            line.push_str(&format!(", feels like {}{deg}", number_text(now.get("feelsLike"))));
        }
        lines.push(line);
        lines.push(format!(
            "Humidity {}%, wind {} {speed}",
            number_text(now.get("humidity")),
            number_text(now.get("windSpeed"))
        ));
    }
    for day in array(config, "forecast") {
        let code = day.get("weatherCode").and_then(Value::as_u64).unwrap_or(u64::MAX);
        lines.push(format!(
            "{}  {:<14} {}{deg} / {}{deg}",
            str_field(day, "date").unwrap_or("?"),
            weather_condition(code),
            number_text(day.get("tempMin")),
            number_text(day.get("tempMax"))
        ));
    }
    CanvasView {
        header: Some(header),
        lines,
        ..CanvasView::default()
    }
}

fn zmanim_view(config: &Value) -> CanvasView {
    let location = config.get("location").unwrap_or(&Value::Null);
    let mut header = str_field(config, "date").unwrap_or("?").to_string();
    if let Some(hebrew) = str_field(config, "hebrewDate") {
        header.push_str(&format!(" ({hebrew})"));
    }
    if let Some(name) = str_field(location, "name") {
        header.push_str(&format!(" · {name}"));
    }

    let lines = array(config, "times")
        .iter()
        .map(|t| {
            let mut line = format!(
                "{:>5}  {}",
                str_field(t, "time").unwrap_or("--:--"),
                str_field(t, "name").unwrap_or("?")
            );
            if let Some(hebrew) = str_field(t, "hebrewName") {
                line.push_str(&format!("  {hebrew}"));
            }
            if t.get("passed").and_then(Value::as_bool) == Some(true) {
                line.push_str("  (passed)");
            }
            line
        })
        .collect();
    CanvasView {
        header: Some(header),
        lines,
        ..CanvasView::default()
    }
}
