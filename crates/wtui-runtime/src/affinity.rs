//! Pane affinity: which pane a working tree was last sent to.
//!
//! Process-lifetime only. Entries may point at panes that have since closed
//! or been renumbered; that surfaces as a send error at use time.

use std::collections::HashMap;
use std::fmt;

use wtui_core::paths::normalize_path_for_compare;
use wtui_tmux::PaneLocator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Pane(u32),
    /// Several panes sit in the tree; the user has to pick one by index.
    Ambiguous(Vec<u32>),
    None,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pane(index) => write!(f, "pane {index}"),
            Self::Ambiguous(candidates) => {
                let list = candidates
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Multiple panes match: {list}. Send with an explicit pane index")
            }
            Self::None => f.write_str("No pane is open in this working tree"),
        }
    }
}

#[derive(Debug, Default)]
pub struct PaneAffinity {
    by_path: HashMap<String, u32>,
}

impl PaneAffinity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<u32> {
        self.by_path.get(normalize_path_for_compare(path)).copied()
    }

    /// Record an explicit send.
    pub fn remember(&mut self, path: &str, index: u32) {
        self.by_path
            .insert(normalize_path_for_compare(path).to_string(), index);
    }

    /// Cached index if any, otherwise the unique pane whose cwd is `path`
    /// (which is then cached). Never picks among several matches.
    pub fn resolve_target(&mut self, path: &str, locator: &impl PaneLocator) -> Resolution {
        if let Some(index) = self.get(path) {
            return Resolution::Pane(index);
        }
        let mut matches = locator.panes_matching_path(path);
        match matches.len() {
            0 => Resolution::None,
            1 => {
                let index = matches.remove(0).index;
                self.remember(path, index);
                Resolution::Pane(index)
            }
            _ => Resolution::Ambiguous(matches.into_iter().map(|p| p.index).collect()),
        }
    }
}
