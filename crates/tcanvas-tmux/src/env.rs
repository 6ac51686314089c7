//! Terminal environment probe.

/// Environment variable tmux sets inside every session.
pub const TMUX_ENV_VAR: &str = "TMUX";

/// Result of probing for an active tmux session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalEnvironment {
    pub in_tmux: bool,
    pub summary: String,
}

impl TerminalEnvironment {
    /// Probe the current process environment.
    pub fn detect() -> Self {
        Self::from_marker(std::env::var_os(TMUX_ENV_VAR).as_deref())
    }

    /// Build from the raw value of the `TMUX` marker. An empty value counts
    /// as absent.
    pub fn from_marker(marker: Option<&std::ffi::OsStr>) -> Self {
        let in_tmux = marker.is_some_and(|v| !v.is_empty());
        Self {
            in_tmux,
            summary: if in_tmux { "tmux" } else { "no tmux" }.to_string(),
        }
    }

    pub fn active() -> Self {
        Self::from_marker(Some(std::ffi::OsStr::new("/tmp/tmux-0/default,1,0")))
    }

    pub fn inactive() -> Self {
        Self::from_marker(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn marker_present() {
        let env = TerminalEnvironment::from_marker(Some(OsStr::new("/tmp/tmux-501/default,123,0")));
        assert!(env.in_tmux);
        assert_eq!(env.summary, "tmux");
    }

    #[test]
    fn marker_absent() {
        let env = TerminalEnvironment::from_marker(None);
        assert!(!env.in_tmux);
        assert_eq!(env.summary, "no tmux");
    }

    #[test]
    fn empty_marker_is_absent() {
        assert!(!TerminalEnvironment::from_marker(Some(OsStr::new(""))).in_tmux);
    }
}
