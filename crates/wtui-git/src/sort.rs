//! Display ordering for working trees.

use wtui_core::WorkingTree;

/// Branches always listed first, in listing order.
const PINNED_BRANCHES: &[&str] = &["main", "master"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Most recently modified directory first.
    #[default]
    Recent,
    /// Lexicographic by branch name.
    Branch,
}

impl SortMode {
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Recent => Self::Branch,
            Self::Branch => Self::Recent,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Branch => "branch",
        }
    }
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recent" | "mtime" => Ok(Self::Recent),
            "branch" | "name" => Ok(Self::Branch),
            other => Err(format!("unknown sort mode {other:?} (expected recent|branch)")),
        }
    }
}

fn is_pinned(wt: &WorkingTree) -> bool {
    PINNED_BRANCHES.contains(&wt.branch.as_str())
}

/// Order trees for display. `main`/`master` come first in either mode;
/// ties keep listing order (the sort is stable).
pub fn sort_working_trees(trees: &[WorkingTree], mode: SortMode) -> Vec<WorkingTree> {
    let mut sorted = trees.to_vec();
    sorted.sort_by(|a, b| {
        is_pinned(b)
            .cmp(&is_pinned(a))
            .then_with(|| match mode {
                // None (unreadable mtime) sorts last.
                SortMode::Recent => b.mtime.cmp(&a.mtime),
                SortMode::Branch => a.branch.cmp(&b.branch),
            })
    });
    sorted
}
