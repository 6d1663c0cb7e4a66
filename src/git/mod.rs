//! Local git operations for the replay engine.
//!
//! This module provides the subprocess plumbing (clean environment, error
//! classification) and [`workspace::WorkingCopy`], the disposable clone one
//! replay run exclusively owns.

pub mod workspace;

use std::path::Path;
use std::process::Output;

use thiserror::Error;

pub use workspace::{CommitIdentity, WorkingCopy};

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command failed.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// A patch failed to apply onto the current branch.
    ///
    /// Distinguished from [`GitError::CommandFailed`] so callers can report
    /// a conflict rather than an infrastructure failure.
    #[error("patch does not apply: {details}")]
    PatchConflict { details: String },

    /// IO error (spawning git, removing the working copy).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Create a git Command with clean environment (no system/user config).
///
/// This ensures consistent behavior across different machines by ignoring
/// system and user git configuration (hooks, aliases, credential prompts).
pub(crate) fn git_command(workdir: &Path) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("git");
    cmd.current_dir(workdir);

    // Disable system and user config for reproducible behavior
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");

    // Disable terminal prompts
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd
}

/// Run a git command in the given working directory.
///
/// Returns the command output on success, or a [`GitError`] when the
/// command exits nonzero.
pub async fn run_git(workdir: &Path, args: &[&str]) -> GitResult<Output> {
    let output = git_command(workdir).args(args).output().await?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let command = format!("git {}", args.join(" "));
        Err(GitError::CommandFailed { command, stderr })
    }
}

/// Run a git command and return stdout as a trimmed string.
pub async fn run_git_stdout(workdir: &Path, args: &[&str]) -> GitResult<String> {
    let output = run_git(workdir, args).await?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
