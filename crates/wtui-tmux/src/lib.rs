//! wtui-tmux: tmux IO boundary for the dashboard.
//! Pane enumeration, cd/focus injection, and pane geometry moves.
//! Every tmux call goes through [`TmuxCommandRunner`] so tests can fake it.

pub mod error;
pub mod executor;
pub mod inspector;
pub mod layout;
pub mod pane_info;

pub use error::{LayoutError, PaneTargetError, TmuxError};
pub use executor::{TmuxCommandRunner, TmuxExecutor};
pub use inspector::{PaneInspector, PaneLocator, SELF_PANE_ENV};
pub use layout::{MIN_PANE_WIDTH, MoveDirection, PaneLayoutController, WidthToggle};
pub use pane_info::{FULL_FORMAT, LOCATION_FORMAT, PaneShape, list_panes, parse_list_panes_output};
