//! wtui-core: shared data model for the worktree dashboard.
//! Working trees, panes, assistant sessions and plugin state records.
//! No IO here apart from home-directory lookup.

pub mod paths;
pub mod serde_helpers;
pub mod types;

pub use types::{
    AssistantSession, InputState, Pane, PluginLifecycle, PluginState, SyncCounters, WorkingTree,
};
