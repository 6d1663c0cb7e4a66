//! The replay engine: one target branch's cherry-pick attempt.
//!
//! Orchestration depends on the [`Replayer`] trait rather than on git and
//! the network directly, so the state machine is testable with a mock. The
//! real implementation, [`GitReplayer`], drives a disposable working copy of
//! the fork through checkout, patch application, and push, then opens the
//! pull request on the base repository.

use std::future::Future;

use crate::git::{CommitIdentity, GitError, WorkingCopy};
use crate::github::{download_patch, ForkHandle, GitHubApi};
use crate::types::{PrNumber, RepoId};

use super::report;

/// Everything one replay run needs, resolved up front by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRequest {
    /// The base repository the new PR targets.
    pub repo: RepoId,
    /// The merged PR being replayed.
    pub source_pr: PrNumber,
    /// Title of the source PR, reused for the new PR's title.
    pub title: String,
    /// The branch the patch is replayed onto.
    pub target_branch: String,
    /// The bot-owned fork the replay branch is pushed to.
    pub fork: ForkHandle,
    /// URL of the source PR's patch artifact.
    pub patch_url: String,
    /// Labels to copy onto the new PR.
    pub labels: Vec<String>,
    /// Issue numbers whose closing references are re-attached to the new PR.
    pub issue_refs: Vec<u64>,
}

/// Outcome of one (source PR, target branch) replay run.
///
/// One instance per pair; never retried automatically; reported exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// The patch applied cleanly and a pull request was opened.
    Success {
        pr_number: PrNumber,
        html_url: String,
    },
    /// The patch does not apply onto the target branch. No branch was
    /// pushed; `details` carries git's explanation of the conflicting hunks.
    Conflict { details: String },
    /// Anything else went wrong: invalid target branch, network, push.
    Failure { cause: String },
}

/// Materializes one target branch's cherry-pick attempt.
pub trait Replayer: Send + Sync {
    fn replay(&self, request: &ReplayRequest) -> impl Future<Output = ReplayOutcome> + Send;
}

/// Deterministic name for the replay branch.
///
/// Keying the branch on (source PR, target branch) is what makes re-runs
/// idempotent: a duplicate webhook delivery force-pushes the same branch and
/// converges on the same remote state.
///
/// # Examples
///
/// ```
/// use cherrypicker::picker::replay::replay_branch_name;
/// use cherrypicker::types::PrNumber;
///
/// assert_eq!(
///     replay_branch_name(PrNumber(42), "release/v1.2"),
///     "cherry-pick-42-to-release/v1.2"
/// );
/// ```
pub fn replay_branch_name(source_pr: PrNumber, target_branch: &str) -> String {
    format!("cherry-pick-{}-to-{}", source_pr.0, target_branch)
}

/// The real replay engine: git subprocesses against a clone of the fork.
pub struct GitReplayer<A> {
    api: A,
    identity: CommitIdentity,
    token: String,
}

impl<A> GitReplayer<A> {
    pub fn new(api: A, identity: CommitIdentity, token: String) -> Self {
        Self {
            api,
            identity,
            token,
        }
    }

    /// Authenticated clone/push URL for the fork. The token rides in the URL
    /// so no credential helper is needed in the clean git environment.
    fn clone_url(&self, fork: &ForkHandle) -> String {
        format!(
            "https://x-access-token:{}@github.com/{}/{}.git",
            self.token, fork.owner, fork.repo_name
        )
    }
}

impl<A: GitHubApi> Replayer for GitReplayer<A> {
    async fn replay(&self, request: &ReplayRequest) -> ReplayOutcome {
        // The working copy is a clone of the fork, never the upstream
        // repository: the bot may lack push permission on upstream.
        let mut work = match WorkingCopy::clone(
            &self.clone_url(&request.fork),
            self.identity.clone(),
        )
        .await
        {
            Ok(work) => work,
            Err(err) => {
                return ReplayOutcome::Failure {
                    cause: format!("could not clone the fork: {err}"),
                }
            }
        };

        // An invalid target branch fails the run; it is not a patch conflict.
        if let Err(err) = work.checkout(&request.target_branch).await {
            return ReplayOutcome::Failure {
                cause: format!(
                    "target branch `{}` is not usable: {err}",
                    request.target_branch
                ),
            };
        }

        let branch = replay_branch_name(request.source_pr, &request.target_branch);
        if work.branch_exists("origin", &branch).await {
            tracing::info!(%branch, "replay branch already on the fork; will force-push");
        }
        if let Err(err) = work.checkout_new_branch(&branch).await {
            return ReplayOutcome::Failure {
                cause: format!("could not create branch `{branch}`: {err}"),
            };
        }

        let patch = match download_patch(
            &request.patch_url,
            work.scratch_dir(),
            &request.repo,
            request.source_pr,
            &request.target_branch,
        )
        .await
        {
            Ok(patch) => patch,
            Err(err) => {
                return ReplayOutcome::Failure {
                    cause: format!("could not fetch the patch: {err}"),
                }
            }
        };

        match work.am(&patch).await {
            Ok(()) => {}
            // Conflicts are reported, not fatal; `am` has already aborted
            // the mailbox so no branch is pushed.
            Err(GitError::PatchConflict { details }) => {
                return ReplayOutcome::Conflict { details }
            }
            Err(err) => {
                return ReplayOutcome::Failure {
                    cause: format!("could not apply the patch: {err}"),
                }
            }
        }

        if let Err(err) = work.push_to_named_fork("origin", &branch, true).await {
            return ReplayOutcome::Failure {
                cause: format!("could not push `{branch}` to the fork: {err}"),
            };
        }

        let title = report::new_pull_title(&request.title, &request.target_branch);
        let body = report::new_pull_body(
            request.source_pr,
            &request.target_branch,
            &request.issue_refs,
        );
        let head = format!("{}:{}", request.fork.owner, branch);
        let created = match self
            .api
            .create_pull(
                &request.repo,
                &title,
                &body,
                &head,
                &request.target_branch,
            )
            .await
        {
            Ok(created) => created,
            Err(err) => {
                return ReplayOutcome::Failure {
                    cause: format!("pushed `{branch}` but could not open the pull request: {err}"),
                }
            }
        };

        if !request.labels.is_empty() {
            // The PR exists; failing to decorate it is not worth reporting
            // the whole run as a failure.
            if let Err(err) = self
                .api
                .add_labels(&request.repo, created.number.0, &request.labels)
                .await
            {
                tracing::warn!(error = %err, "could not copy labels onto the new pull request");
            }
        }

        if let Err(err) = work.clean() {
            tracing::warn!(error = %err, "could not remove the working copy");
        }

        ReplayOutcome::Success {
            pr_number: created.number,
            html_url: created.html_url,
        }
    }
}
