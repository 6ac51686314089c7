//! Pane lifecycle: run a command in the canvas pane, reusing it when alive.
//!
//! Order of attempts:
//! 1. reuse the registered pane (interrupt, settle, clear, type the command),
//! 2. on any reuse failure invalidate the registry and split a new pane.
//!
//! A handle that failed reuse is never retried. Split failure is fatal;
//! there is no non-pane fallback.

use std::time::Duration;

use crate::env::TerminalEnvironment;
use crate::error::{SpawnError, TmuxError};
use crate::executor::TmuxCommandRunner;
use crate::registry::{PaneHandle, PaneRegistry, PaneStore};

/// Pause between interrupting the old process and typing the new command.
///
/// Heuristic, not a guarantee: long enough for typical interactive programs
/// to unwind on Ctrl-C so their output does not interleave with the new
/// command, short enough not to stall the UI.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Width of a new canvas pane, as a percentage of the current pane.
pub const DEFAULT_SPLIT_PERCENT: u8 = 50;

/// What the manager did to get the command running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneAction {
    Reused,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnResult {
    /// Transport used; always `"tmux"`.
    pub method: &'static str,
    pub action: PaneAction,
    /// Pane now running the command. `None` only if a split succeeded but
    /// tmux printed no id.
    pub pane: Option<PaneHandle>,
}

pub struct PaneLifecycleManager<R, S> {
    runner: R,
    registry: PaneRegistry<S>,
    env: TerminalEnvironment,
    settle_delay: Duration,
    split_percent: u8,
}

impl<R: TmuxCommandRunner, S: PaneStore> PaneLifecycleManager<R, S> {
    pub fn new(runner: R, registry: PaneRegistry<S>, env: TerminalEnvironment) -> Self {
        Self {
            runner,
            registry,
            env,
            settle_delay: DEFAULT_SETTLE_DELAY,
            split_percent: DEFAULT_SPLIT_PERCENT,
        }
    }

    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    #[must_use]
    pub fn with_split_percent(mut self, percent: u8) -> Self {
        self.split_percent = percent.clamp(1, 99);
        self
    }

    pub fn registry(&self) -> &PaneRegistry<S> {
        &self.registry
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn environment(&self) -> &TerminalEnvironment {
        &self.env
    }

    /// Run `command` in the canvas pane.
    pub fn run(&self, command: &str) -> Result<SpawnResult, SpawnError> {
        self.run_as("canvas", command)
    }

    /// Like [`run`](Self::run); `what` names the caller in the precondition
    /// error ("canvas", "browser").
    pub fn run_as(&self, what: &'static str, command: &str) -> Result<SpawnResult, SpawnError> {
        if !self.env.in_tmux {
            return Err(SpawnError::NoSession { what });
        }

        let mut attempted = Vec::new();
        if let Some(pane) = self.registry.lookup(&self.runner) {
            attempted.push(format!("reuse {pane}"));
            match self.reuse(&pane, command) {
                Ok(()) => {
                    tracing::debug!(%pane, "reused canvas pane");
                    return Ok(SpawnResult {
                        method: "tmux",
                        action: PaneAction::Reused,
                        pane: Some(pane),
                    });
                }
                Err(e) => {
                    tracing::info!(%pane, "canvas pane reuse failed, creating a new one: {e}");
                    self.registry.invalidate();
                }
            }
        }

        attempted.push("split".to_string());
        match self.create(command) {
            Ok(pane) => Ok(SpawnResult {
                method: "tmux",
                action: PaneAction::Created,
                pane,
            }),
            Err(source) => Err(SpawnError::Exhausted {
                attempted: attempted.join(", "),
                source,
            }),
        }
    }

    fn reuse(&self, pane: &PaneHandle, command: &str) -> Result<(), TmuxError> {
        self.runner.run(&["send-keys", "-t", pane.as_str(), "C-c"])?;
        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }
        let line = format!("clear && {command}");
        self.runner
            .run(&["send-keys", "-t", pane.as_str(), &line, "Enter"])?;
        Ok(())
    }

    /// Split beside the current pane. The new id comes from the split's own
    /// `-P -F` output rather than a follow-up query, which could observe a
    /// different pane.
    fn create(&self, command: &str) -> Result<Option<PaneHandle>, TmuxError> {
        let percent = self.split_percent.to_string();
        let out = self.runner.run(&[
            "split-window",
            "-h",
            "-p",
            &percent,
            "-P",
            "-F",
            "#{pane_id}",
            command,
        ])?;
        let pane = PaneHandle::new(out);
        match &pane {
            Some(handle) => {
                if let Err(e) = self.registry.save(handle) {
                    tracing::warn!(pane = %handle, "failed to persist canvas pane id: {e}");
                }
                tracing::debug!(pane = %handle, "created canvas pane");
            }
            None => tracing::warn!("split-window printed no pane id; pane will not be reused"),
        }
        Ok(pane)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryPaneStore;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted runner: records every call and answers from a queue keyed by
    /// the tmux subcommand.
    #[derive(Default)]
    struct ScriptedRunner {
        calls: Mutex<Vec<Vec<String>>>,
        replies: Mutex<VecDeque<(&'static str, Result<String, String>)>>,
    }

    impl ScriptedRunner {
        fn reply(self, subcommand: &'static str, result: Result<&str, &str>) -> Self {
            self.replies
                .lock()
                .expect("lock")
                .push_back((subcommand, result.map(str::to_string).map_err(str::to_string)));
            self
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().expect("lock").clone()
        }

        fn subcommands(&self) -> Vec<String> {
            self.calls().into_iter().map(|c| c[0].clone()).collect()
        }
    }

    impl TmuxCommandRunner for ScriptedRunner {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            self.calls
                .lock()
                .expect("lock")
                .push(args.iter().map(|s| s.to_string()).collect());
            let (expected, reply) = self
                .replies
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected tmux call: {args:?}"));
            assert_eq!(args[0], expected, "call order");
            reply.map_err(TmuxError::CommandFailed)
        }
    }

    fn manager<'a, 'b>(
        runner: &'a ScriptedRunner,
        store: &'b MemoryPaneStore,
    ) -> PaneLifecycleManager<&'a ScriptedRunner, &'b MemoryPaneStore> {
        PaneLifecycleManager::new(runner, PaneRegistry::new(store), TerminalEnvironment::active())
            .with_settle_delay(Duration::ZERO)
    }

    #[test]
    fn no_session_fails_fast() {
        let runner = ScriptedRunner::default();
        let store = MemoryPaneStore::with_value("%1");
        let mgr = PaneLifecycleManager::new(
            &runner,
            PaneRegistry::new(&store),
            TerminalEnvironment::inactive(),
        );
        let err = mgr.run("echo hi").unwrap_err();
        assert!(matches!(err, SpawnError::NoSession { what: "canvas" }));
        assert!(err.to_string().contains("requires tmux"));
        assert!(runner.calls().is_empty(), "no tmux calls without a session");
    }

    #[test]
    fn empty_registry_creates_and_saves() {
        let runner = ScriptedRunner::default().reply("split-window", Ok("%8\n"));
        let store = MemoryPaneStore::new();
        let result = manager(&runner, &store).run("tcanvas show table").expect("spawned");

        assert_eq!(result.method, "tmux");
        assert_eq!(result.action, PaneAction::Created);
        assert_eq!(result.pane, PaneHandle::new("%8"));
        assert_eq!(store.snapshot(), "%8");

        let split = &runner.calls()[0];
        assert_eq!(
            split,
            &["split-window", "-h", "-p", "50", "-P", "-F", "#{pane_id}", "tcanvas show table"]
        );
    }

    #[test]
    fn live_pane_is_reused() {
        let runner = ScriptedRunner::default()
            .reply("display-message", Ok("%3\n"))
            .reply("send-keys", Ok(""))
            .reply("send-keys", Ok(""));
        let store = MemoryPaneStore::with_value("%3");
        let result = manager(&runner, &store).run("tcanvas show chart").expect("spawned");

        assert_eq!(result.action, PaneAction::Reused);
        assert_eq!(result.pane, PaneHandle::new("%3"));
        let calls = runner.calls();
        assert_eq!(calls[1], ["send-keys", "-t", "%3", "C-c"]);
        assert_eq!(
            calls[2],
            ["send-keys", "-t", "%3", "clear && tcanvas show chart", "Enter"]
        );
        assert_eq!(store.snapshot(), "%3");
    }

    #[test]
    fn reuse_failure_falls_through_to_create() {
        let runner = ScriptedRunner::default()
            .reply("display-message", Ok("%3"))
            .reply("send-keys", Ok(""))
            .reply("send-keys", Err("can't find pane: %3"))
            .reply("split-window", Ok("%4"));
        let store = MemoryPaneStore::with_value("%3");
        let result = manager(&runner, &store).run("cmd").expect("spawned");

        assert_eq!(result.action, PaneAction::Created);
        assert_eq!(result.pane, PaneHandle::new("%4"));
        assert_eq!(store.snapshot(), "%4");
        let send_keys = runner
            .subcommands()
            .iter()
            .filter(|s| *s == "send-keys")
            .count();
        assert_eq!(send_keys, 2, "reuse attempted exactly once");
    }

    #[test]
    fn interrupt_failure_skips_command_injection() {
        let runner = ScriptedRunner::default()
            .reply("display-message", Ok("%3"))
            .reply("send-keys", Err("no server"))
            .reply("split-window", Ok("%5"));
        let store = MemoryPaneStore::with_value("%3");
        let result = manager(&runner, &store).run("cmd").expect("spawned");
        assert_eq!(result.action, PaneAction::Created);
        assert_eq!(
            runner.subcommands(),
            ["display-message", "send-keys", "split-window"]
        );
    }

    #[test]
    fn recycled_pane_id_is_not_reused() {
        // tmux resolved %3 to another pane: verification must fail.
        let runner = ScriptedRunner::default()
            .reply("display-message", Ok("%11"))
            .reply("split-window", Ok("%12"));
        let store = MemoryPaneStore::with_value("%3");
        let result = manager(&runner, &store).run("cmd").expect("spawned");
        assert_eq!(result.action, PaneAction::Created);
        assert_eq!(runner.subcommands(), ["display-message", "split-window"]);
        assert_eq!(store.snapshot(), "%12");
    }

    #[test]
    fn invalidated_handle_is_not_retried_on_next_run() {
        let runner = ScriptedRunner::default()
            .reply("display-message", Ok("%3"))
            .reply("send-keys", Err("gone"))
            .reply("split-window", Err("no space for new pane"))
            .reply("split-window", Ok("%6"));
        let store = MemoryPaneStore::with_value("%3");
        let mgr = manager(&runner, &store);

        assert!(mgr.run("first").is_err());
        assert_eq!(store.snapshot(), "", "failed handle cleared");

        let second = mgr.run("second").expect("spawned");
        assert_eq!(second.action, PaneAction::Created);
        assert_eq!(
            runner.subcommands(),
            ["display-message", "send-keys", "split-window", "split-window"]
        );
    }

    #[test]
    fn exhausted_reports_attempts() {
        let runner = ScriptedRunner::default()
            .reply("display-message", Ok("%3"))
            .reply("send-keys", Err("gone"))
            .reply("split-window", Err("no space for new pane"));
        let store = MemoryPaneStore::with_value("%3");
        let err = manager(&runner, &store).run("cmd").unwrap_err();
        match err {
            SpawnError::Exhausted { attempted, .. } => assert_eq!(attempted, "reuse %3, split"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn split_without_reuse_reports_split_only() {
        let runner = ScriptedRunner::default().reply("split-window", Err("server exited"));
        let store = MemoryPaneStore::new();
        let err = manager(&runner, &store).run("cmd").unwrap_err();
        assert!(err.to_string().contains("attempted: split"), "{err}");
    }

    #[test]
    fn unwritable_store_does_not_fail_spawn() {
        let runner = ScriptedRunner::default().reply("split-window", Ok("%2"));
        let store = MemoryPaneStore::failing();
        let result = manager(&runner, &store).run("cmd").expect("spawned");
        assert_eq!(result.pane, PaneHandle::new("%2"));
    }

    #[test]
    fn split_without_id_is_not_persisted() {
        let runner = ScriptedRunner::default().reply("split-window", Ok("\n"));
        let store = MemoryPaneStore::new();
        let result = manager(&runner, &store).run("cmd").expect("spawned");
        assert_eq!(result.action, PaneAction::Created);
        assert!(result.pane.is_none());
        assert_eq!(store.snapshot(), "");
    }

    #[test]
    fn split_percent_is_clamped() {
        let runner = ScriptedRunner::default().reply("split-window", Ok("%1"));
        let store = MemoryPaneStore::new();
        manager(&runner, &store)
            .with_split_percent(0)
            .run("cmd")
            .expect("spawned");
        assert_eq!(runner.calls()[0][3], "1");
    }
}
