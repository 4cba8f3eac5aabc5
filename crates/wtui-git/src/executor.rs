//! GitCommandRunner trait and the subprocess-backed GitExecutor.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::GitError;

/// Runs one git invocation in `cwd` and returns its stdout.
pub trait GitCommandRunner: Send + Sync {
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<String, GitError>;
}

impl<T: GitCommandRunner + ?Sized> GitCommandRunner for &T {
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<String, GitError> {
        (**self).run(cwd, args)
    }
}

impl<T: GitCommandRunner + ?Sized> GitCommandRunner for std::sync::Arc<T> {
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<String, GitError> {
        (**self).run(cwd, args)
    }
}

#[derive(Debug, Clone)]
pub struct GitExecutor {
    git_bin: String,
}

impl GitExecutor {
    pub fn new(git_bin: impl Into<String>) -> Self {
        Self {
            git_bin: git_bin.into(),
        }
    }
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCommandRunner for GitExecutor {
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<String, GitError> {
        let output = Command::new(&self.git_bin)
            .arg("-C")
            .arg(cwd)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed(format!(
                "git {}: exit code {}: {}",
                args.first().copied().unwrap_or_default(),
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_io_error() {
        let exec = GitExecutor::new("/nonexistent/git-binary");
        let r = exec.run(Path::new("/"), &["status"]);
        assert!(matches!(r, Err(GitError::Io(_))));
    }
}
