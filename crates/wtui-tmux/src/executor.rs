//! The tmux subprocess seam.
//!
//! Everything that talks to tmux goes through [`TmuxCommandRunner`], so the
//! inspector and layout controller can be driven by canned output in tests.

use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::error::TmuxError;

/// Runs one tmux invocation and returns its stdout.
pub trait TmuxCommandRunner: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError>;
}

impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for &T {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        (**self).run(args)
    }
}

impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for Arc<T> {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        (**self).run(args)
    }
}

/// Shells out to the `tmux` binary, optionally against a specific server
/// socket (`-S`).
#[derive(Debug, Clone)]
pub struct TmuxExecutor {
    program: String,
    socket: Option<String>,
}

impl TmuxExecutor {
    pub fn new(socket: Option<String>) -> Self {
        Self {
            program: "tmux".to_string(),
            socket,
        }
    }

    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn argv<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut argv = Vec::with_capacity(args.len() + 2);
        if let Some(socket) = self.socket.as_deref() {
            argv.extend(["-S", socket]);
        }
        argv.extend_from_slice(args);
        argv
    }
}

impl Default for TmuxExecutor {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TmuxCommandRunner for TmuxExecutor {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        let output = Command::new(&self.program)
            .args(self.argv(args))
            .stdin(Stdio::null())
            .output()?;
        let subcommand = args.first().copied().unwrap_or_default();
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        tracing::debug!(subcommand, status = ?output.status.code(), stderr, "tmux failed");
        Err(TmuxError::CommandFailed(format!("{subcommand}: {stderr}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_is_passed_before_subcommand() {
        let exec = TmuxExecutor::new(Some("/tmp/wtui.sock".into()));
        assert_eq!(
            exec.argv(&["select-pane", "-t", "%3"]),
            vec!["-S", "/tmp/wtui.sock", "select-pane", "-t", "%3"]
        );
    }

    #[test]
    fn default_targets_ambient_server() {
        assert_eq!(TmuxExecutor::default().argv(&["list-panes"]), vec!["list-panes"]);
    }

    #[test]
    fn missing_binary_is_io_error() {
        let exec = TmuxExecutor::default().with_program("/nonexistent/tmux-binary");
        assert!(matches!(exec.run(&["list-panes"]), Err(TmuxError::Io(_))));
    }
}
