//! Real tool executors and the components built on them.

use std::sync::Arc;

use anyhow::bail;
use wtui_git::{GitExecutor, WorktreeLifecycle};
use wtui_sessions::{PsProcessTable, SessionReconciler};
use wtui_tmux::{PaneInspector, PaneLayoutController, SELF_PANE_ENV, TmuxExecutor};

use crate::config::Config;

pub type Tmux = Arc<TmuxExecutor>;
pub type Git = Arc<GitExecutor>;

/// Fails unless running inside a tmux client.
pub fn require_tmux() -> anyhow::Result<()> {
    if std::env::var_os("TMUX").is_none_or(|v| v.is_empty()) {
        bail!("not running inside tmux (TMUX is unset); start wtui from a tmux pane");
    }
    Ok(())
}

pub struct Services {
    pub tmux: Tmux,
    pub git: Git,
    /// `$TMUX_PANE` of the dashboard.
    pub self_pane: Option<String>,
}

impl Services {
    pub fn from_config(config: &Config) -> Self {
        let tmux = TmuxExecutor::new(config.tmux_socket.clone());
        let self_pane = std::env::var(SELF_PANE_ENV).ok().filter(|v| !v.is_empty());
        tracing::debug!(self_pane = ?self_pane, socket = ?config.tmux_socket, "tmux target");
        Self {
            tmux: Arc::new(tmux),
            git: Arc::new(GitExecutor::default()),
            self_pane,
        }
    }

    pub fn inspector(&self) -> PaneInspector<Tmux> {
        PaneInspector::new(Arc::clone(&self.tmux), self.self_pane.clone())
    }

    pub fn layout(&self) -> PaneLayoutController<Tmux> {
        PaneLayoutController::new(Arc::clone(&self.tmux), self.self_pane.clone())
    }

    pub fn reconciler(&self, config: &Config) -> SessionReconciler<Tmux, PsProcessTable> {
        SessionReconciler::new(self.inspector(), PsProcessTable, config.sources.clone())
    }

    pub fn lifecycle(&self, config: &Config) -> WorktreeLifecycle<Git> {
        WorktreeLifecycle::new(Arc::clone(&self.git), config.root.clone(), config.hooks.clone())
    }
}
