//! Canvas pane identity: the single pane tcanvas reuses across invocations.
//!
//! The identity lives in a [`PaneStore`] (a well-known file in production,
//! memory in tests). An empty store means "no pane". The stored id is never
//! trusted: it is re-verified against tmux before every reuse.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::executor::TmuxCommandRunner;

// ─── PaneHandle ──────────────────────────────────────────────────────

/// Opaque tmux pane id such as `%12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaneHandle(String);

impl PaneHandle {
    /// Returns `None` for blank input.
    pub fn new(id: impl AsRef<str>) -> Option<Self> {
        let id = id.as_ref().trim();
        (!id.is_empty()).then(|| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Stores ──────────────────────────────────────────────────────────

/// Backing storage for the pane identity.
pub trait PaneStore: Send + Sync {
    fn read(&self) -> std::io::Result<String>;
    fn write(&self, value: &str) -> std::io::Result<()>;
}

/// Pane identity persisted to a single file.
#[derive(Debug, Clone)]
pub struct FilePaneStore {
    path: PathBuf,
}

impl FilePaneStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PaneStore for FilePaneStore {
    fn read(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    fn write(&self, value: &str) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, value)
    }
}

/// In-memory store for tests. `failing()` makes every access error.
#[derive(Debug, Default)]
pub struct MemoryPaneStore {
    value: Mutex<String>,
    failing: bool,
}

impl MemoryPaneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(value.into()),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            value: Mutex::new(String::new()),
            failing: true,
        }
    }

    /// Current raw content.
    pub fn snapshot(&self) -> String {
        self.value.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn unavailable() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "store unavailable")
    }
}

impl PaneStore for MemoryPaneStore {
    fn read(&self) -> std::io::Result<String> {
        if self.failing {
            return Err(Self::unavailable());
        }
        self.value
            .lock()
            .map(|v| v.clone())
            .map_err(|_| Self::unavailable())
    }

    fn write(&self, value: &str) -> std::io::Result<()> {
        if self.failing {
            return Err(Self::unavailable());
        }
        let mut guard = self.value.lock().map_err(|_| Self::unavailable())?;
        *guard = value.to_string();
        Ok(())
    }
}

impl<S: PaneStore + ?Sized> PaneStore for &S {
    fn read(&self) -> std::io::Result<String> {
        (**self).read()
    }

    fn write(&self, value: &str) -> std::io::Result<()> {
        (**self).write(value)
    }
}

// ─── PaneRegistry ────────────────────────────────────────────────────

/// Format that makes tmux echo the id of the pane it resolved.
const PANE_ID_FORMAT: &str = "#{pane_id}";

#[derive(Debug)]
pub struct PaneRegistry<S> {
    store: S,
}

impl<S: PaneStore> PaneRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored handle, or `None` when the store is empty or unreadable.
    pub fn load(&self) -> Option<PaneHandle> {
        match self.store.read() {
            Ok(raw) => PaneHandle::new(raw),
            Err(e) => {
                tracing::debug!("pane store unreadable: {e}");
                None
            }
        }
    }

    /// Ask tmux about the pane addressed by `handle` and require the exact
    /// same id back. tmux may resolve a dead id to some other pane, so a
    /// successful command alone proves nothing.
    pub fn verify(&self, runner: &impl TmuxCommandRunner, handle: &PaneHandle) -> bool {
        match runner.run(&["display-message", "-t", handle.as_str(), "-p", PANE_ID_FORMAT]) {
            Ok(out) => out.trim() == handle.as_str(),
            Err(e) => {
                tracing::debug!(pane = %handle, "pane liveness check failed: {e}");
                false
            }
        }
    }

    /// Load and verify. A stale handle is invalidated and reported as absent.
    pub fn lookup(&self, runner: &impl TmuxCommandRunner) -> Option<PaneHandle> {
        let handle = self.load()?;
        if self.verify(runner, &handle) {
            Some(handle)
        } else {
            tracing::info!(pane = %handle, "stale canvas pane reference cleared");
            self.invalidate();
            None
        }
    }

    pub fn save(&self, handle: &PaneHandle) -> std::io::Result<()> {
        self.store.write(handle.as_str())
    }

    /// Clear the stored identity. Best-effort: errors are logged and dropped.
    pub fn invalidate(&self) {
        if let Err(e) = self.store.write("") {
            tracing::debug!("failed to clear pane store: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TmuxError;

    /// Runner answering `display-message` with a fixed echo.
    struct EchoRunner(Result<&'static str, ()>);

    impl TmuxCommandRunner for EchoRunner {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            assert_eq!(args[0], "display-message");
            self.0
                .map(str::to_string)
                .map_err(|()| TmuxError::CommandFailed("can't find pane".into()))
        }
    }

    #[test]
    fn handle_rejects_blank() {
        assert!(PaneHandle::new("").is_none());
        assert!(PaneHandle::new("  \n").is_none());
        assert_eq!(PaneHandle::new("%3\n").expect("handle").as_str(), "%3");
    }

    #[test]
    fn load_empty_store() {
        let registry = PaneRegistry::new(MemoryPaneStore::new());
        assert!(registry.load().is_none());
    }

    #[test]
    fn load_trims_content() {
        let registry = PaneRegistry::new(MemoryPaneStore::with_value("%7\n"));
        assert_eq!(registry.load(), PaneHandle::new("%7"));
    }

    #[test]
    fn load_unreadable_store() {
        let registry = PaneRegistry::new(MemoryPaneStore::failing());
        assert!(registry.load().is_none());
    }

    #[test]
    fn verify_exact_echo() {
        let registry = PaneRegistry::new(MemoryPaneStore::new());
        let handle = PaneHandle::new("%5").expect("handle");
        assert!(registry.verify(&EchoRunner(Ok("%5\n")), &handle));
    }

    #[test]
    fn verify_rejects_different_echo() {
        let registry = PaneRegistry::new(MemoryPaneStore::new());
        let handle = PaneHandle::new("%5").expect("handle");
        assert!(!registry.verify(&EchoRunner(Ok("%9\n")), &handle));
        assert!(!registry.verify(&EchoRunner(Ok("")), &handle));
    }

    #[test]
    fn verify_rejects_failed_command() {
        let registry = PaneRegistry::new(MemoryPaneStore::new());
        let handle = PaneHandle::new("%5").expect("handle");
        assert!(!registry.verify(&EchoRunner(Err(())), &handle));
    }

    #[test]
    fn lookup_stale_handle_invalidates() {
        let registry = PaneRegistry::new(MemoryPaneStore::with_value("%5"));
        assert!(registry.lookup(&EchoRunner(Ok("%6"))).is_none());
        assert_eq!(registry.store().snapshot(), "");
    }

    #[test]
    fn lookup_live_handle() {
        let registry = PaneRegistry::new(MemoryPaneStore::with_value("%5"));
        assert_eq!(registry.lookup(&EchoRunner(Ok("%5"))), PaneHandle::new("%5"));
        assert_eq!(registry.store().snapshot(), "%5");
    }

    #[test]
    fn invalidate_never_fails() {
        let registry = PaneRegistry::new(MemoryPaneStore::failing());
        registry.invalidate();
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FilePaneStore::new(dir.path().join("nested/canvas-pane-id"));
        let registry = PaneRegistry::new(store);
        assert!(registry.load().is_none(), "missing file reads as empty");

        let handle = PaneHandle::new("%42").expect("handle");
        registry.save(&handle).expect("save");
        assert_eq!(registry.load(), Some(handle));

        registry.invalidate();
        assert!(registry.load().is_none());
        let raw = std::fs::read_to_string(registry.store().path()).expect("file kept");
        assert_eq!(raw, "");
    }
}
