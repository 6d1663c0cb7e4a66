//! Disposable working copies.
//!
//! A [`WorkingCopy`] is an exclusively-owned clone of one repository, rooted
//! in a temporary directory. It is owned by exactly one replay run, never
//! shared, and removed when dropped - release is guaranteed on every exit
//! path, including early returns and errors, without manual cleanup calls
//! scattered through the flow.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::{git_command, run_git, GitError, GitResult};

/// Identity used for creating commits.
///
/// Passed via `-c` flags so commits can be created even with system/user
/// git config disabled.
#[derive(Debug, Clone)]
pub struct CommitIdentity {
    /// The committer/author name (git `user.name`).
    pub name: String,

    /// The committer/author email (git `user.email`).
    pub email: String,
}

/// An exclusively-owned, disposable clone of a repository.
///
/// The clone lives under a scratch directory that also holds non-repository
/// files (the downloaded patch), keeping the working tree itself clean.
/// Commit-creating operations use the identity supplied at clone time via
/// `-c` flags; no persistent `.git/config` changes are made.
pub struct WorkingCopy {
    root: TempDir,
    repo_dir: PathBuf,
    identity: CommitIdentity,
}

impl WorkingCopy {
    /// Clones `url` into a fresh scratch directory.
    pub async fn clone(url: &str, identity: CommitIdentity) -> GitResult<Self> {
        let root = tempfile::Builder::new().prefix("cherrypick-").tempdir()?;
        let repo_dir = root.path().join("repo");

        tracing::info!(path = %repo_dir.display(), "creating a clone of the repo");
        run_git(
            root.path(),
            &["clone", url, &repo_dir.display().to_string()],
        )
        .await?;

        Ok(Self {
            root,
            repo_dir,
            identity,
        })
    }

    /// Runs a commit-creating git command with the identity `-c` flags
    /// prepended, returning stderr on nonzero exit.
    async fn run_with_identity(&self, args: &[&str]) -> GitResult<()> {
        let mut cmd = git_command(&self.repo_dir);
        cmd.arg("-c")
            .arg(format!("user.name={}", self.identity.name))
            .arg("-c")
            .arg(format!("user.email={}", self.identity.email))
            .args(args);
        let output = cmd.output().await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }

    /// The directory in which the repository has been cloned.
    pub fn directory(&self) -> &Path {
        &self.repo_dir
    }

    /// A scratch directory outside the working tree, removed together with
    /// the clone. Used for the downloaded patch file.
    pub fn scratch_dir(&self) -> &Path {
        self.root.path()
    }

    /// Runs `git checkout` to an arbitrary ref.
    pub async fn checkout(&mut self, commitlike: &str) -> GitResult<()> {
        tracing::info!(commitlike, "checking out");
        run_git(&self.repo_dir, &["checkout", commitlike]).await?;
        Ok(())
    }

    /// Creates a new branch from HEAD and checks it out. Fails if the
    /// branch already exists.
    pub async fn checkout_new_branch(&mut self, branch: &str) -> GitResult<()> {
        tracing::info!(branch, "checking out new branch");
        run_git(&self.repo_dir, &["checkout", "-b", branch]).await?;
        Ok(())
    }

    /// Returns true if `branch` exists in the heads of the named remote.
    pub async fn branch_exists(&mut self, remote: &str, branch: &str) -> bool {
        run_git(
            &self.repo_dir,
            &["ls-remote", "--exit-code", "--heads", remote, branch],
        )
        .await
        .is_ok()
    }

    /// Applies the patch at `path` as commits, preserving author and
    /// message from the patch, via a three-way merge (`git am --3way`).
    ///
    /// On failure the in-progress mailbox is aborted so the working copy is
    /// left on a clean HEAD. A genuine apply conflict is reported as
    /// [`GitError::PatchConflict`] carrying git's explanation; anything else
    /// (a corrupt or malformed patch file, say) stays a
    /// [`GitError::CommandFailed`] so callers treat it as an infrastructure
    /// failure rather than a conflict needing a manual pick.
    pub async fn am(&mut self, path: &Path) -> GitResult<()> {
        tracing::info!(path = %path.display(), "applying patch");
        let patch = path.display().to_string();

        match self.run_with_identity(&["am", "--3way", &patch]).await {
            Ok(()) => Ok(()),
            Err(GitError::CommandFailed { command, stderr }) => {
                tracing::info!(stderr = %stderr, "patch apply failed, aborting");
                if let Err(abort_err) = run_git(&self.repo_dir, &["am", "--abort"]).await {
                    tracing::warn!(error = %abort_err, "aborting patch apply failed");
                }
                if is_apply_conflict(&stderr) {
                    Err(GitError::PatchConflict { details: stderr })
                } else {
                    Err(GitError::CommandFailed { command, stderr })
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Stages all changes and commits them with a two-part message.
    ///
    /// Used for supplementary, non-patch commits (metadata amendments); the
    /// replayed change itself is committed by [`WorkingCopy::am`].
    pub async fn commit(&mut self, title: &str, body: &str) -> GitResult<()> {
        tracing::info!(title, "committing changes");
        run_git(&self.repo_dir, &["add", "--all"]).await?;

        if body.is_empty() {
            self.run_with_identity(&["commit", "--message", title])
                .await
        } else {
            self.run_with_identity(&["commit", "--message", title, "--message", body])
                .await
        }
    }

    /// Pushes the local `branch` to the named fork remote, optionally
    /// forced. Force is what makes re-runs converge on the same remote
    /// state instead of failing on the pre-existing branch.
    pub async fn push_to_named_fork(
        &mut self,
        fork_name: &str,
        branch: &str,
        force: bool,
    ) -> GitResult<()> {
        tracing::info!(branch, remote = fork_name, force, "pushing branch");
        let mut args = vec!["push"];
        if force {
            args.push("--force");
        }
        args.push(fork_name);
        args.push(branch);
        run_git(&self.repo_dir, &args).await?;
        Ok(())
    }

    /// Releases the working copy eagerly, surfacing removal errors.
    ///
    /// Dropping the value releases it too; this exists for the paths that
    /// want to observe the error.
    pub fn clean(self) -> std::io::Result<()> {
        self.root.close()
    }
}

/// Whether `git am` stderr describes the patch conflicting with the branch,
/// as opposed to the patch file itself being unusable ("Patch format
/// detection failed", a corrupt hunk).
fn is_apply_conflict(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("patch failed")
        || stderr.contains("does not apply")
        || stderr.contains("failed to merge")
        || stderr.contains("merge conflict")
}
