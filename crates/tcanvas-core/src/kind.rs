use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CanvasError;

/// Widget type a canvas process can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasKind {
    Chart,
    Json,
    Kanban,
    Table,
    Weather,
    Zmanim,
}

impl CanvasKind {
    pub const ALL: [Self; 6] = [
        Self::Chart,
        Self::Json,
        Self::Kanban,
        Self::Table,
        Self::Weather,
        Self::Zmanim,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Json => "json",
            Self::Kanban => "kanban",
            Self::Table => "table",
            Self::Weather => "weather",
            Self::Zmanim => "zmanim",
        }
    }

    /// Scenario used when the caller does not name one.
    pub fn default_scenario(self) -> &'static str {
        match self {
            Self::Json => "explore",
            _ => "display",
        }
    }
}

impl fmt::Display for CanvasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanvasKind {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chart" => Ok(Self::Chart),
            "json" => Ok(Self::Json),
            "kanban" => Ok(Self::Kanban),
            "table" => Ok(Self::Table),
            "weather" => Ok(Self::Weather),
            "zmanim" => Ok(Self::Zmanim),
            _ => Err(CanvasError::UnknownKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        for kind in CanvasKind::ALL {
            let parsed: CanvasKind = kind.to_string().parse().expect("known kind");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Table".parse::<CanvasKind>(), Ok(CanvasKind::Table));
    }

    #[test]
    fn parse_unknown_kind() {
        let err = "calendar".parse::<CanvasKind>().unwrap_err();
        assert_eq!(err, CanvasError::UnknownKind("calendar".into()));
    }

    #[test]
    fn json_defaults_to_explore() {
        assert_eq!(CanvasKind::Json.default_scenario(), "explore");
        assert_eq!(CanvasKind::Chart.default_scenario(), "display");
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&CanvasKind::Kanban).expect("serialize");
        assert_eq!(json, "\"kanban\"");
    }
}
