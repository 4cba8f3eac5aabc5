//! `git worktree list --porcelain` reader.

use std::path::Path;

use chrono::{DateTime, Utc};
use wtui_core::WorkingTree;
use wtui_core::paths::last_segment;

use crate::executor::GitCommandRunner;

const HEADS_PREFIX: &str = "refs/heads/";
const SHORT_COMMIT_LEN: usize = 7;

/// Enumerate the working trees of the repository at `root`.
///
/// Any git failure yields an empty list: "no trees" is a displayable state.
pub fn list_working_trees(runner: &impl GitCommandRunner, root: &Path) -> Vec<WorkingTree> {
    let output = match runner.run(root, &["worktree", "list", "--porcelain"]) {
        Ok(out) => out,
        Err(e) => {
            tracing::debug!(root = %root.display(), "worktree listing failed: {e}");
            return Vec::new();
        }
    };
    parse_worktree_porcelain(&output)
        .into_iter()
        .map(|mut wt| {
            wt.mtime = dir_mtime(Path::new(&wt.path));
            wt
        })
        .collect()
}

/// Parse porcelain output: one blank-line-terminated group per tree.
/// `mtime` is left unset. Bare entries have no checkout and are skipped.
pub fn parse_worktree_porcelain(output: &str) -> Vec<WorkingTree> {
    let mut trees = Vec::new();
    let mut current: Option<WorkingTree> = None;
    let mut bare = false;

    let mut flush = |current: &mut Option<WorkingTree>, bare: &mut bool| {
        if let Some(wt) = current.take()
            && !*bare
        {
            trees.push(wt);
        }
        *bare = false;
    };

    for line in output.lines() {
        if line.is_empty() {
            flush(&mut current, &mut bare);
        } else if let Some(path) = line.strip_prefix("worktree ") {
            // A new header without a separating blank line still starts a group.
            flush(&mut current, &mut bare);
            current = Some(WorkingTree {
                path: path.to_string(),
                name: last_segment(path).to_string(),
                ..WorkingTree::default()
            });
        } else if let Some(wt) = current.as_mut() {
            if let Some(head) = line.strip_prefix("HEAD ") {
                wt.commit_short = head.chars().take(SHORT_COMMIT_LEN).collect();
            } else if let Some(branch) = line.strip_prefix("branch ") {
                wt.branch = branch.strip_prefix(HEADS_PREFIX).unwrap_or(branch).to_string();
            } else if line == "bare" {
                bare = true;
            }
        }
    }
    flush(&mut current, &mut bare);
    trees
}

fn dir_mtime(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitError;

    const LISTING: &str = "\
worktree /home/me/src/app
HEAD 3f9a1c2d4e5f60718293a4b5c6d7e8f901234567
branch refs/heads/main

worktree /home/me/src/feature-x
HEAD aa11bb22cc33dd44ee55ff6600112233aabbccdd
branch refs/heads/feature/x-y

worktree /home/me/src/probe
HEAD 0123456789abcdef0123456789abcdef01234567
detached

";

    #[test]
    fn one_tree_per_group() {
        let trees = parse_worktree_porcelain(LISTING);
        assert_eq!(trees.len(), 3);
        assert_eq!(trees[0].path, "/home/me/src/app");
        assert_eq!(trees[0].name, "app");
        assert_eq!(trees[0].branch, "main");
        assert_eq!(trees[0].commit_short, "3f9a1c2");
        assert_eq!(trees[1].branch, "feature/x-y");
        assert_eq!(trees[1].name, "feature-x");
    }

    #[test]
    fn detached_tree_has_empty_branch() {
        let trees = parse_worktree_porcelain(LISTING);
        assert!(trees[2].is_detached());
        assert_eq!(trees[2].commit_short, "0123456");
    }

    #[test]
    fn bare_entry_is_skipped() {
        let out = "worktree /srv/repo.git\nbare\n\nworktree /srv/wt\nHEAD abcdef0123\nbranch refs/heads/dev\n\n";
        let trees = parse_worktree_porcelain(out);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].path, "/srv/wt");
    }

    #[test]
    fn missing_trailing_blank_line_still_emits_last_group() {
        let out = "worktree /a\nbranch refs/heads/main\n\nworktree /b\nbranch refs/heads/dev";
        let trees = parse_worktree_porcelain(out);
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[1].branch, "dev");
    }

    #[test]
    fn empty_output_is_empty() {
        assert!(parse_worktree_porcelain("").is_empty());
    }

    struct Canned(Result<String, String>);

    impl GitCommandRunner for Canned {
        fn run(&self, _cwd: &Path, args: &[&str]) -> Result<String, GitError> {
            assert_eq!(args, ["worktree", "list", "--porcelain"]);
            self.0.clone().map_err(GitError::CommandFailed)
        }
    }

    #[test]
    fn tool_failure_yields_empty() {
        let runner = Canned(Err("not a git repository".into()));
        assert!(list_working_trees(&runner, Path::new("/tmp")).is_empty());
    }

    #[test]
    fn missing_binary_yields_empty() {
        let runner = crate::executor::GitExecutor::new("/nonexistent/git");
        assert!(list_working_trees(&runner, Path::new("/")).is_empty());
    }

    #[test]
    fn mtime_is_read_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().to_string_lossy().into_owned();
        let runner = Canned(Ok(format!(
            "worktree {path}\nbranch refs/heads/main\n\nworktree /nonexistent/wt\nbranch refs/heads/gone\n\n"
        )));
        let trees = list_working_trees(&runner, dir.path());
        assert!(trees[0].mtime.is_some());
        assert!(trees[1].mtime.is_none());
    }
}
