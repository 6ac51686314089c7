//! Scenario registry: static lookup table keyed by `(kind, scenario name)`.
//!
//! Populated once from the built-ins; lookups are exact-match with no
//! fallback to another scenario.

use std::collections::BTreeMap;

use crate::error::CanvasError;
use crate::kind::CanvasKind;
use crate::scenario::{ScenarioDefinition, builtin_scenarios};

#[derive(Debug, Clone, Default)]
pub struct ScenarioRegistry {
    entries: BTreeMap<(CanvasKind, String), ScenarioDefinition>,
}

impl ScenarioRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in scenario.
    pub fn with_builtins() -> Self {
        Self::from_definitions(builtin_scenarios())
    }

    pub fn from_definitions(defs: impl IntoIterator<Item = ScenarioDefinition>) -> Self {
        let mut registry = Self::new();
        for def in defs {
            registry.register(def);
        }
        registry
    }

    /// Insert a definition. An existing entry with the same key is replaced.
    pub fn register(&mut self, def: ScenarioDefinition) {
        self.entries.insert(def.key(), def);
    }

    pub fn lookup(&self, kind: CanvasKind, name: &str) -> Option<&ScenarioDefinition> {
        self.entries.get(&(kind, name.to_string()))
    }

    /// Like [`lookup`](Self::lookup) but an absent entry is a configuration error.
    pub fn resolve(&self, kind: CanvasKind, name: &str) -> Result<&ScenarioDefinition, CanvasError> {
        self.lookup(kind, name)
            .ok_or_else(|| CanvasError::UnknownScenario {
                kind,
                name: name.to_string(),
            })
    }

    /// All definitions, optionally restricted to one kind, in key order.
    pub fn list(&self, kind: Option<CanvasKind>) -> Vec<&ScenarioDefinition> {
        self.entries
            .values()
            .filter(|def| kind.is_none_or(|k| def.canvas_kind == k))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
