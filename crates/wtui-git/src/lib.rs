//! wtui-git: git IO boundary.
//! Working-tree enumeration, display ordering, per-tree sync counters and
//! worktree add/remove with lifecycle hooks.

pub mod error;
pub mod executor;
pub mod hooks;
pub mod sort;
pub mod status;
pub mod worktree;

pub use error::{GitError, HookError};
pub use executor::{GitCommandRunner, GitExecutor};
pub use hooks::{HookCommands, HookKind, LifecycleOutcome, WorktreeLifecycle};
pub use sort::{SortMode, sort_working_trees};
pub use status::{fetch_sync_counters, sync_counters_for};
pub use worktree::{list_working_trees, parse_worktree_porcelain};
