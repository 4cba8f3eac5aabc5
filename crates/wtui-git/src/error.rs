//! Error types for the git boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git command failed: {0}")]
    CommandFailed(String),

    #[error("unexpected git output: {0}")]
    Parse(String),

    #[error("git io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Hook(#[from] HookError),
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("{hook} hook exited with {code}: {stderr}")]
    Failed {
        hook: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("{hook} hook could not be started: {source}")]
    Spawn {
        hook: &'static str,
        #[source]
        source: std::io::Error,
    },
}
