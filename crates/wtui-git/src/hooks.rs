//! Worktree add/remove with user-configured lifecycle hooks.
//!
//! Hooks are shell commands run through `sh -c` with a fixed environment.
//! A failing pre-hook cancels the operation. A failing post-hook is reported
//! alongside the completed git operation, which is never rolled back.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{GitError, HookError};
use crate::executor::GitCommandRunner;
use crate::worktree::list_working_trees;

/// Optional shell command per lifecycle point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookCommands {
    pub pre_add: Option<String>,
    pub post_add: Option<String>,
    pub pre_remove: Option<String>,
    pub post_remove: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    PreAdd,
    PostAdd,
    PreRemove,
    PostRemove,
}

impl HookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreAdd => "pre-add",
            Self::PostAdd => "post-add",
            Self::PreRemove => "pre-remove",
            Self::PostRemove => "post-remove",
        }
    }

    fn action(self) -> &'static str {
        match self {
            Self::PreAdd | Self::PostAdd => "add",
            Self::PreRemove | Self::PostRemove => "remove",
        }
    }
}

impl HookCommands {
    fn get(&self, kind: HookKind) -> Option<&str> {
        match kind {
            HookKind::PreAdd => self.pre_add.as_deref(),
            HookKind::PostAdd => self.post_add.as_deref(),
            HookKind::PreRemove => self.pre_remove.as_deref(),
            HookKind::PostRemove => self.post_remove.as_deref(),
        }
        .filter(|c| !c.trim().is_empty())
    }
}

/// Values exported to every hook.
#[derive(Debug, Clone)]
struct HookContext<'a> {
    name: &'a str,
    path: &'a Path,
    branch: &'a str,
    root: &'a Path,
    commit: Option<String>,
}

impl HookContext<'_> {
    fn env(&self, kind: HookKind) -> Vec<(&'static str, String)> {
        let mut env = vec![
            ("WTUI_ACTION", kind.action().to_string()),
            ("WTUI_WORKTREE_NAME", self.name.to_string()),
            ("WTUI_WORKTREE_PATH", self.path.to_string_lossy().into_owned()),
            ("WTUI_WORKTREE_BRANCH", self.branch.to_string()),
            ("WTUI_ROOT", self.root.to_string_lossy().into_owned()),
        ];
        if let Some(ref commit) = self.commit {
            env.push(("WTUI_COMMIT", commit.clone()));
        }
        env
    }
}

/// Result of an add/remove whose git step succeeded.
#[derive(Debug)]
pub enum LifecycleOutcome {
    Completed { path: PathBuf },
    /// The tree was created/removed but the post-hook failed.
    PartialSuccess { path: PathBuf, hook_error: HookError },
}

impl LifecycleOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Completed { path } | Self::PartialSuccess { path, .. } => path,
        }
    }
}

pub struct WorktreeLifecycle<R> {
    runner: R,
    root: PathBuf,
    hooks: HookCommands,
}

impl<R: GitCommandRunner> WorktreeLifecycle<R> {
    pub fn new(runner: R, root: impl Into<PathBuf>, hooks: HookCommands) -> Self {
        Self {
            runner,
            root: root.into(),
            hooks,
        }
    }

    /// Where `add(name)` places the new tree: a sibling of the root checkout.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.parent().unwrap_or(&self.root).join(name)
    }

    /// Create a working tree named `name` on `branch` (default: `name`).
    /// An existing local branch is checked out, otherwise it is created.
    pub fn add(&self, name: &str, branch: Option<&str>) -> Result<LifecycleOutcome, GitError> {
        let path = self.path_for(name);
        let branch = branch.unwrap_or(name);
        let mut ctx = HookContext {
            name,
            path: &path,
            branch,
            root: &self.root,
            commit: None,
        };

        self.run_hook(HookKind::PreAdd, &ctx)?;

        let path_arg = path.to_string_lossy().into_owned();
        let branch_ref = format!("refs/heads/{branch}");
        let branch_exists = self
            .runner
            .run(&self.root, &["rev-parse", "--verify", "--quiet", &branch_ref])
            .is_ok();
        let args: Vec<&str> = if branch_exists {
            vec!["worktree", "add", path_arg.as_str(), branch]
        } else {
            vec!["worktree", "add", "-b", branch, path_arg.as_str()]
        };
        self.runner.run(&self.root, &args)?;
        tracing::info!(path = %path.display(), branch, "worktree added");

        ctx.commit = self
            .runner
            .run(&path, &["rev-parse", "--short=7", "HEAD"])
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(self.finish(HookKind::PostAdd, &ctx, path.clone()))
    }

    /// Remove the working tree whose directory name is `name`.
    pub fn remove(&self, name: &str, force: bool) -> Result<LifecycleOutcome, GitError> {
        let tree = list_working_trees(&self.runner, &self.root)
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| GitError::CommandFailed(format!("no working tree named {name:?}")))?;
        let path = PathBuf::from(&tree.path);
        let ctx = HookContext {
            name,
            path: &path,
            branch: &tree.branch,
            root: &self.root,
            commit: Some(tree.commit_short.clone()).filter(|c| !c.is_empty()),
        };

        self.run_hook(HookKind::PreRemove, &ctx)?;

        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&tree.path);
        self.runner.run(&self.root, &args)?;
        tracing::info!(path = %tree.path, "worktree removed");

        Ok(self.finish(HookKind::PostRemove, &ctx, path.clone()))
    }

    fn finish(&self, kind: HookKind, ctx: &HookContext<'_>, path: PathBuf) -> LifecycleOutcome {
        match self.run_hook(kind, ctx) {
            Ok(()) => LifecycleOutcome::Completed { path },
            Err(hook_error) => {
                tracing::warn!("{hook_error}");
                LifecycleOutcome::PartialSuccess { path, hook_error }
            }
        }
    }

    fn run_hook(&self, kind: HookKind, ctx: &HookContext<'_>) -> Result<(), HookError> {
        let Some(command) = self.hooks.get(kind) else {
            return Ok(());
        };
        let hook = kind.as_str();
        // Hooks run inside the tree when it exists, else in the root checkout.
        let cwd = if ctx.path.is_dir() { ctx.path } else { ctx.root };
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .envs(ctx.env(kind))
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| HookError::Spawn { hook, source })?;
        if !output.status.success() {
            return Err(HookError::Failed {
                hook,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        tracing::debug!(hook, "hook succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fake git that knows one existing tree and records mutating calls.
    struct FakeGit {
        existing_branch: Option<&'static str>,
        listing: String,
        calls: Mutex<Vec<String>>,
    }

    impl FakeGit {
        fn new(root: &Path) -> Self {
            Self {
                existing_branch: None,
                listing: format!(
                    "worktree {}\nHEAD 1111111aaaa\nbranch refs/heads/main\n\nworktree /nonexistent/feat\nHEAD 2222222bbbb\nbranch refs/heads/feat\n\n",
                    root.display()
                ),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }
    }

    impl GitCommandRunner for FakeGit {
        fn run(&self, _cwd: &Path, args: &[&str]) -> Result<String, GitError> {
            match args {
                ["rev-parse", "--verify", "--quiet", r] => {
                    if Some(r.trim_start_matches("refs/heads/")) == self.existing_branch {
                        Ok("abc\n".into())
                    } else {
                        Err(GitError::CommandFailed("missing".into()))
                    }
                }
                ["rev-parse", "--short=7", "HEAD"] => Ok("abc1234\n".into()),
                ["worktree", "list", "--porcelain"] => Ok(self.listing.clone()),
                _ => {
                    self.calls.lock().expect("lock").push(args.join(" "));
                    Ok(String::new())
                }
            }
        }
    }

    fn lifecycle(hooks: HookCommands) -> (tempfile::TempDir, WorktreeLifecycle<FakeGit>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("app");
        std::fs::create_dir_all(&root).expect("mkdir");
        let git = FakeGit::new(&root);
        (dir, WorktreeLifecycle::new(git, root, hooks))
    }

    #[test]
    fn add_creates_branch_when_missing() {
        let (_dir, lc) = lifecycle(HookCommands::default());
        let outcome = lc.add("feat", None).expect("add");
        assert!(matches!(outcome, LifecycleOutcome::Completed { .. }));
        let path = lc.path_for("feat");
        assert_eq!(
            lc.runner.calls(),
            vec![format!("worktree add -b feat {}", path.display())]
        );
    }

    #[test]
    fn add_checks_out_existing_branch() {
        let (_dir, mut lc) = lifecycle(HookCommands::default());
        lc.runner.existing_branch = Some("dev");
        lc.add("dev-wt", Some("dev")).expect("add");
        let path = lc.path_for("dev-wt");
        assert_eq!(
            lc.runner.calls(),
            vec![format!("worktree add {} dev", path.display())]
        );
    }

    #[test]
    fn failing_pre_hook_aborts() {
        let (_dir, lc) = lifecycle(HookCommands {
            pre_add: Some("echo nope >&2; exit 3".into()),
            ..Default::default()
        });
        let err = lc.add("feat", None).expect_err("abort");
        match err {
            GitError::Hook(HookError::Failed { hook, code, stderr }) => {
                assert_eq!(hook, "pre-add");
                assert_eq!(code, 3);
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(lc.runner.calls().is_empty(), "git must not run");
    }

    #[test]
    fn failing_post_hook_is_partial_success() {
        let (_dir, lc) = lifecycle(HookCommands {
            post_add: Some("false".into()),
            ..Default::default()
        });
        let outcome = lc.add("feat", None).expect("add");
        assert!(matches!(outcome, LifecycleOutcome::PartialSuccess { .. }));
        assert_eq!(lc.runner.calls().len(), 1, "no rollback");
    }

    #[test]
    fn hooks_receive_environment() {
        let (_dir, lc) = lifecycle(HookCommands {
            post_add: Some(
                r#"test "$WTUI_ACTION" = add && test "$WTUI_WORKTREE_NAME" = feat && test "$WTUI_WORKTREE_BRANCH" = topic && test "$WTUI_COMMIT" = abc1234 && test -n "$WTUI_ROOT""#
                    .into(),
            ),
            ..Default::default()
        });
        let outcome = lc.add("feat", Some("topic")).expect("add");
        assert!(
            matches!(outcome, LifecycleOutcome::Completed { .. }),
            "{outcome:?}"
        );
    }

    #[test]
    fn remove_uses_listed_path_and_force() {
        let (_dir, lc) = lifecycle(HookCommands {
            pre_remove: Some(r#"test "$WTUI_ACTION" = remove && test "$WTUI_WORKTREE_BRANCH" = feat"#.into()),
            ..Default::default()
        });
        let outcome = lc.remove("feat", true).expect("remove");
        assert_eq!(outcome.path(), Path::new("/nonexistent/feat"));
        assert_eq!(
            lc.runner.calls(),
            vec!["worktree remove --force /nonexistent/feat".to_string()]
        );
    }

    #[test]
    fn remove_unknown_name_fails() {
        let (_dir, lc) = lifecycle(HookCommands::default());
        assert!(lc.remove("ghost", false).is_err());
    }

    #[test]
    fn blank_hook_is_ignored() {
        let hooks = HookCommands {
            pre_add: Some("   ".into()),
            ..Default::default()
        };
        assert!(hooks.get(HookKind::PreAdd).is_none());
    }
}
