//! Immutable runtime configuration, resolved once from the CLI.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use wtui_git::{HookCommands, SortMode};
use wtui_sessions::SessionSources;

use crate::cli::Cli;

/// Sync counters are never polled faster than this.
const COUNTERS_FLOOR: Duration = Duration::from_millis(2000);
/// Sessions are never polled faster than this.
const SESSIONS_FLOOR: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    /// Base poll interval. Zero disables periodic polling.
    pub interval: Duration,
    pub sort: SortMode,
    pub flash_duration: Duration,
    pub tmux_socket: Option<String>,
    pub hooks: HookCommands,
    pub sources: SessionSources,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let root = match &cli.root {
            Some(r) if r.is_absolute() => r.clone(),
            Some(r) => cwd.join(r),
            None => cwd,
        };
        let defaults = SessionSources::from_home();

        Ok(Self {
            root,
            interval: Duration::from_millis(cli.interval_ms),
            sort: cli.sort,
            flash_duration: Duration::from_millis(cli.flash_duration_ms),
            tmux_socket: cli.tmux_socket.clone().filter(|s| !s.is_empty()),
            hooks: HookCommands {
                pre_add: cli.hooks.hook_pre_add.clone(),
                post_add: cli.hooks.hook_post_add.clone(),
                pre_remove: cli.hooks.hook_pre_remove.clone(),
                post_remove: cli.hooks.hook_post_remove.clone(),
            },
            sources: SessionSources {
                plugin_state_dir: cli.state_dir.clone().or(defaults.plugin_state_dir),
                projects_dir: cli.projects_dir.clone().or(defaults.projects_dir),
            },
        })
    }

    pub fn tree_interval(&self) -> Option<Duration> {
        self.periodic(Duration::ZERO)
    }

    pub fn counters_interval(&self) -> Option<Duration> {
        self.periodic(COUNTERS_FLOOR)
    }

    pub fn sessions_interval(&self) -> Option<Duration> {
        self.periodic(SESSIONS_FLOOR)
    }

    fn periodic(&self, floor: Duration) -> Option<Duration> {
        (!self.interval.is_zero()).then(|| self.interval.max(floor))
    }
}
