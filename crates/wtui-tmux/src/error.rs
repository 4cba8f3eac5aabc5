//! Error types for the tmux boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TmuxError {
    #[error("tmux command failed: {0}")]
    CommandFailed(String),

    #[error("failed to parse list-panes line {line_num}: {detail}")]
    ParseError { line_num: usize, detail: String },

    #[error("tmux io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a pane-addressed command (cd, focus) was refused or failed.
///
/// The `Display` text is shown to the user verbatim as a status message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaneTargetError {
    #[error("Pane {index} not found. Valid panes: {}", join_indices(.valid))]
    NotFound { index: u32, valid: Vec<u32> },

    #[error("Pane {index} is the current pane")]
    IsSelf { index: u32 },

    #[error("tmux: {0}")]
    Tmux(String),
}

impl From<TmuxError> for PaneTargetError {
    fn from(e: TmuxError) -> Self {
        Self::Tmux(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("no current pane: the dashboard is not running inside tmux")]
    NoCurrentPane,

    #[error("unexpected display-message output: {0:?}")]
    BadGeometry(String),

    /// A step of the break/join/resize sequence failed. Earlier steps are not
    /// undone, so the pane may already sit in its own window.
    #[error("pane move failed at {step}: {source}")]
    MoveStep {
        step: &'static str,
        #[source]
        source: TmuxError,
    },

    #[error(transparent)]
    Tmux(#[from] TmuxError),
}

fn join_indices(indices: &[u32]) -> String {
    indices
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_valid_panes() {
        let e = PaneTargetError::NotFound {
            index: 7,
            valid: vec![0, 1, 2],
        };
        assert_eq!(e.to_string(), "Pane 7 not found. Valid panes: 0, 1, 2");
    }

    #[test]
    fn self_target_has_its_own_message() {
        let e = PaneTargetError::IsSelf { index: 1 };
        assert_eq!(e.to_string(), "Pane 1 is the current pane");
    }
}
