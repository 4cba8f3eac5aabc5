//! Pane enumeration relative to the dashboard's own pane, plus cd/focus
//! injection with target validation.

use wtui_core::Pane;
use wtui_core::paths::same_dir;

use crate::error::{PaneTargetError, TmuxError};
use crate::executor::TmuxCommandRunner;
use crate::pane_info::{PaneShape, list_panes};

/// Environment variable tmux sets to the id of the pane a process runs in.
pub const SELF_PANE_ENV: &str = "TMUX_PANE";

/// Finds panes whose working directory equals a path. The self pane is never
/// returned.
pub trait PaneLocator {
    fn panes_matching_path(&self, path: &str) -> Vec<Pane>;
}

pub struct PaneInspector<R> {
    runner: R,
    /// Stable id (`%N`) of the dashboard's own pane.
    self_pane: Option<String>,
}

impl<R: TmuxCommandRunner> PaneInspector<R> {
    pub fn new(runner: R, self_pane: Option<String>) -> Self {
        Self { runner, self_pane }
    }

    /// Anchor on `$TMUX_PANE`.
    pub fn from_env(runner: R) -> Self {
        let self_pane = std::env::var(SELF_PANE_ENV)
            .ok()
            .filter(|v| !v.is_empty());
        Self::new(runner, self_pane)
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn self_pane_id(&self) -> Option<&str> {
        self.self_pane.as_deref()
    }

    pub fn is_self(&self, pane: &Pane) -> bool {
        self.self_pane.as_deref() == Some(pane.id.as_str())
    }

    /// All panes in the dashboard's window with process metadata.
    pub fn panes(&self) -> Result<Vec<Pane>, TmuxError> {
        list_panes(&self.runner, PaneShape::Full, self.self_pane.as_deref())
    }

    /// All panes in the dashboard's window, index/id/cwd only.
    pub fn pane_locations(&self) -> Result<Vec<Pane>, TmuxError> {
        list_panes(&self.runner, PaneShape::Location, self.self_pane.as_deref())
    }

    /// Panes whose cwd equals `path`, excluding self. tmux failure yields none.
    pub fn find_panes_matching_path(&self, path: &str) -> Vec<Pane> {
        match self.pane_locations() {
            Ok(panes) => panes
                .into_iter()
                .filter(|p| !self.is_self(p) && same_dir(&p.cwd, path))
                .collect(),
            Err(e) => {
                tracing::debug!("pane lookup for {path} failed: {e}");
                Vec::new()
            }
        }
    }

    /// Type `cd '<path>'` + Enter into pane `index`.
    ///
    /// Returns the pane that received the keystrokes.
    pub fn send_directory_change(&self, index: u32, path: &str) -> Result<Pane, PaneTargetError> {
        let pane = self.validate_target(index)?;
        let line = format!("cd {}", shell_quote(path));
        self.runner.run(&["send-keys", "-t", &pane.id, "-l", &line])?;
        self.runner.run(&["send-keys", "-t", &pane.id, "Enter"])?;
        tracing::debug!(pane = %pane.id, index, path, "sent cd");
        Ok(pane)
    }

    /// Make pane `index` the active pane.
    pub fn focus_pane(&self, index: u32) -> Result<Pane, PaneTargetError> {
        let pane = self.validate_target(index)?;
        self.runner.run(&["select-pane", "-t", &pane.id])?;
        Ok(pane)
    }

    /// The index must exist in a fresh listing and must not be self. The
    /// returned pane carries the stable id, which later commands address.
    fn validate_target(&self, index: u32) -> Result<Pane, PaneTargetError> {
        let panes = self.pane_locations()?;
        let Some(pane) = panes.iter().find(|p| p.index == index) else {
            return Err(PaneTargetError::NotFound {
                index,
                valid: panes.iter().map(|p| p.index).collect(),
            });
        };
        if self.is_self(pane) {
            return Err(PaneTargetError::IsSelf { index });
        }
        Ok(pane.clone())
    }
}

impl<R: TmuxCommandRunner> PaneLocator for PaneInspector<R> {
    fn panes_matching_path(&self, path: &str) -> Vec<Pane> {
        self.find_panes_matching_path(path)
    }
}

/// Single-quote `s` for POSIX shells.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
