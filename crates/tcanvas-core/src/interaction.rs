//! Interaction state machine for one canvas session.
//!
//! Enforces the scenario contract independently of rendering:
//!
//! - `view-only`: navigation only; commit is ignored; quit cancels.
//! - `selection`: commit on a non-empty list emits one `Selected` and ends.
//! - `multi-select`: toggle edits a local set silently; commit emits the
//!   whole set once and ends.
//!
//! Once terminated (by a verdict or an external close) every further input
//! is ignored, so a session yields at most one verdict.

use std::collections::BTreeSet;

use crate::message::USER_QUIT_REASON;
use crate::scenario::InteractionMode;

/// User input already decoded from keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Toggle,
    Commit,
    Quit,
}

/// Terminal result produced by the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Item indices chosen by the user, ascending.
    Selected(Vec<usize>),
    Cancelled(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Decided,
    Closed,
}

#[derive(Debug, Clone)]
pub struct Interaction {
    mode: InteractionMode,
    len: usize,
    cursor: usize,
    scroll: usize,
    viewport: usize,
    marked: BTreeSet<usize>,
    phase: Phase,
}

impl Interaction {
    pub fn new(mode: InteractionMode, len: usize) -> Self {
        Self {
            mode,
            len,
            cursor: 0,
            scroll: 0,
            viewport: 1,
            marked: BTreeSet::new(),
            phase: Phase::Active,
        }
    }

    /// Pre-mark items (multi-select only; out-of-range indices are dropped).
    #[must_use]
    pub fn with_marked(mut self, marked: impl IntoIterator<Item = usize>) -> Self {
        self.set_marked(marked);
        self
    }

    fn set_marked(&mut self, marked: impl IntoIterator<Item = usize>) {
        self.marked.clear();
        if self.mode == InteractionMode::MultiSelect {
            let len = self.len;
            self.marked.extend(marked.into_iter().filter(|&i| i < len));
        }
    }

    /// Replace the item list after a config update: cursor, scroll offset and
    /// marks start over.
    pub fn reset(&mut self, len: usize, marked: impl IntoIterator<Item = usize>) {
        self.len = len;
        self.cursor = 0;
        self.scroll = 0;
        self.set_marked(marked);
    }

    /// Number of rows visible at once; keeps the cursor inside the window.
    pub fn set_viewport(&mut self, rows: usize) {
        self.viewport = rows.max(1);
        self.follow_cursor();
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.marked.contains(&index)
    }

    pub fn marked(&self) -> impl Iterator<Item = usize> + '_ {
        self.marked.iter().copied()
    }

    pub fn is_terminated(&self) -> bool {
        self.phase != Phase::Active
    }

    /// External `close`: terminate without a verdict. Returns false if the
    /// session had already ended.
    pub fn close(&mut self) -> bool {
        if self.is_terminated() {
            return false;
        }
        self.phase = Phase::Closed;
        true
    }

    /// Apply one input. Returns the verdict when this input ends the session.
    pub fn apply(&mut self, action: Action) -> Option<Verdict> {
        if self.is_terminated() {
            return None;
        }
        let last = self.len.saturating_sub(1);
        match action {
            Action::Up => self.cursor = self.cursor.saturating_sub(1),
            Action::Down => self.cursor = (self.cursor + 1).min(last),
            Action::PageUp => self.cursor = self.cursor.saturating_sub(self.viewport),
            Action::PageDown => self.cursor = (self.cursor + self.viewport).min(last),
            Action::Home => self.cursor = 0,
            Action::End => self.cursor = last,
            Action::Toggle => self.toggle(),
            Action::Commit => return self.commit(),
            Action::Quit => return Some(self.decide(Verdict::Cancelled(USER_QUIT_REASON.into()))),
        }
        self.follow_cursor();
        None
    }

    fn toggle(&mut self) {
        if self.mode != InteractionMode::MultiSelect || self.len == 0 {
            return;
        }
        if !self.marked.remove(&self.cursor) {
            self.marked.insert(self.cursor);
        }
    }

    fn commit(&mut self) -> Option<Verdict> {
        match self.mode {
            InteractionMode::ViewOnly => None,
            InteractionMode::Selection if self.len == 0 => None,
            InteractionMode::Selection => Some(self.decide(Verdict::Selected(vec![self.cursor]))),
            InteractionMode::MultiSelect => {
                let chosen = self.marked.iter().copied().collect();
                Some(self.decide(Verdict::Selected(chosen)))
            }
        }
    }

    fn decide(&mut self, verdict: Verdict) -> Verdict {
        self.phase = Phase::Decided;
        verdict
    }

    fn follow_cursor(&mut self) {
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + self.viewport {
            self.scroll = self.cursor + 1 - self.viewport;
        }
    }
}
