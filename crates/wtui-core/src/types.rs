use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::serde_helpers::flexible_timestamp;

// ─── Working trees ────────────────────────────────────────────────

/// One git working-tree checkout. Identity across polls is `path`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkingTree {
    pub path: String,
    pub name: String,
    /// Branch without the `refs/heads/` prefix; empty when detached.
    pub branch: String,
    pub commit_short: String,
    /// Directory mtime, only used for recency ordering.
    pub mtime: Option<DateTime<Utc>>,
}

impl WorkingTree {
    pub fn is_detached(&self) -> bool {
        self.branch.is_empty()
    }

    /// Label shown for the branch column.
    pub fn branch_label(&self) -> &str {
        if self.is_detached() {
            "(detached)"
        } else {
            &self.branch
        }
    }
}

/// Per-tree ahead/behind and working-directory change counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncCounters {
    pub ahead: u32,
    pub behind: u32,
    pub staged: u32,
    pub modified: u32,
    pub untracked: u32,
}

impl SyncCounters {
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.modified == 0 && self.untracked == 0
    }

    pub fn is_synced(&self) -> bool {
        self.ahead == 0 && self.behind == 0
    }
}

// ─── Panes ────────────────────────────────────────────────────────

/// A tmux pane in the dashboard's window.
///
/// `index` is positional and may be renumbered when panes are created or
/// destroyed; `id` (`%N`) is stable for the pane's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pane {
    pub index: u32,
    pub id: String,
    pub cwd: String,
    pub command: String,
    pub pid: Option<u32>,
    pub window_name: String,
}

// ─── Assistant sessions ───────────────────────────────────────────

/// Whether an assistant is blocked on user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputState {
    Waiting,
    Working,
    /// No plugin state was available for the pane.
    #[default]
    Unknown,
}

impl InputState {
    pub fn is_waiting(self) -> bool {
        self == Self::Waiting
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Working => "working",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for InputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected assistant process bound to a pane.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssistantSession {
    pub pane_index: u32,
    pub pane_id: String,
    pub cwd: String,
    pub window_name: String,
    pub pid: Option<u32>,
    pub summary: Option<String>,
    pub input_state: InputState,
    pub hostname: Option<String>,
    pub is_devcontainer: bool,
}

// ─── Plugin state files ───────────────────────────────────────────

/// Lifecycle value written by the companion plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginLifecycle {
    Start,
    Working,
    Waiting,
}

impl From<PluginLifecycle> for InputState {
    fn from(value: PluginLifecycle) -> Self {
        match value {
            PluginLifecycle::Waiting => InputState::Waiting,
            PluginLifecycle::Start | PluginLifecycle::Working => InputState::Working,
        }
    }
}

/// One plugin-emitted session state file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PluginState {
    pub session_id: String,
    pub cwd: String,
    pub state: PluginLifecycle,
    pub pane_id: String,
    #[serde(deserialize_with = "flexible_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub is_devcontainer: bool,
}

impl PluginState {
    /// Fresh when no older than `window` relative to `now`.
    /// Timestamps in the future (clock skew) count as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        now.signed_duration_since(self.timestamp) <= window
    }
}
