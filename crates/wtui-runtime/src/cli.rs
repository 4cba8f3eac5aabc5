//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wtui_git::SortMode;
use wtui_tmux::MoveDirection;

#[derive(Parser, Debug)]
#[command(name = "wtui", about = "git worktree dashboard for tmux", version)]
pub struct Cli {
    /// Checkout whose working trees are listed (default: current directory)
    #[arg(long, short = 'C', global = true)]
    pub root: Option<PathBuf>,

    /// Base poll interval in milliseconds; 0 polls once and then only on request
    #[arg(long, env = "WTUI_INTERVAL_MS", default_value_t = 1000, global = true)]
    pub interval_ms: u64,

    /// Initial tree order: recent | branch
    #[arg(long, default_value = "recent", global = true)]
    pub sort: SortMode,

    /// How long a waiting session blinks, in milliseconds (0 = forever)
    #[arg(
        long,
        env = "WTUI_FLASH_DURATION_MS",
        default_value_t = 10_000,
        global = true
    )]
    pub flash_duration_ms: u64,

    /// tmux server socket path
    #[arg(long, env = "WTUI_TMUX_SOCKET", global = true)]
    pub tmux_socket: Option<String>,

    /// Plugin session state directory (default: ~/.claude/wtui/sessions)
    #[arg(long, env = "WTUI_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Assistant transcript directory (default: ~/.claude/projects)
    #[arg(long, env = "WTUI_PROJECTS_DIR", global = true)]
    pub projects_dir: Option<PathBuf>,

    #[command(flatten)]
    pub hooks: HookOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Shell commands run around worktree add/remove.
#[derive(Args, Debug, Default, Clone)]
pub struct HookOpts {
    #[arg(long, env = "WTUI_HOOK_PRE_ADD", global = true)]
    pub hook_pre_add: Option<String>,

    #[arg(long, env = "WTUI_HOOK_POST_ADD", global = true)]
    pub hook_post_add: Option<String>,

    #[arg(long, env = "WTUI_HOOK_PRE_REMOVE", global = true)]
    pub hook_pre_remove: Option<String>,

    #[arg(long, env = "WTUI_HOOK_POST_REMOVE", global = true)]
    pub hook_post_remove: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Live dashboard (default)
    Watch,
    /// Print working trees, counters and assistant sessions once
    Ls(LsOpts),
    /// cd a pane into a working tree
    Send(SendOpts),
    /// Select a pane in the dashboard's window
    Focus {
        /// Pane index
        pane: u32,
    },
    /// Move the current pane to the left or right edge of its window
    MovePane {
        /// left | right
        direction: MoveDirection,
    },
    /// Minimize the current pane, or restore it to a stored width
    ToggleWidth {
        /// Width reported by the previous minimize
        #[arg(long)]
        stored: Option<u16>,
    },
    /// Create a working tree next to the root checkout
    Add {
        name: String,
        /// Branch to check out or create (default: the tree name)
        #[arg(long, short = 'b')]
        branch: Option<String>,
    },
    /// Remove a working tree by name
    Remove {
        name: String,
        #[arg(long, short = 'f')]
        force: bool,
    },
}

impl Command {
    /// Worktree add/remove only talk to git.
    pub fn needs_tmux(&self) -> bool {
        !matches!(self, Self::Add { .. } | Self::Remove { .. })
    }
}

#[derive(Args, Debug, Default)]
pub struct LsOpts {
    /// Emit the snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SendOpts {
    /// Working tree path
    pub path: String,

    /// Target pane index; without it the pane is found by working directory
    #[arg(long, short = 'p')]
    pub pane: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["wtui"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.sort, SortMode::Recent);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["wtui", "ls", "--interval-ms", "0", "--json"]).expect("parse");
        assert_eq!(cli.interval_ms, 0);
        assert!(matches!(cli.command, Some(Command::Ls(LsOpts { json: true }))));
    }

    #[test]
    fn move_pane_parses_direction() {
        let cli = Cli::try_parse_from(["wtui", "move-pane", "left"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Command::MovePane {
                direction: MoveDirection::Left
            })
        ));
        assert!(Cli::try_parse_from(["wtui", "move-pane", "up"]).is_err());
    }

    #[test]
    fn send_with_explicit_pane() {
        let cli = Cli::try_parse_from(["wtui", "send", "/repo/wt", "--pane", "2"]).expect("parse");
        let Some(Command::Send(opts)) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(opts.path, "/repo/wt");
        assert_eq!(opts.pane, Some(2));
    }
}
