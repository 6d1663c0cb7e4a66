//! Fork lifecycle management.
//!
//! The bot never pushes to the upstream repository; it pushes the replay
//! branch to a fork owned by the bot identity and opens the PR from there.
//! `ensure_fork` resolves the fork lazily: an existing fork with the right
//! parent is reused as-is, otherwise a fork is requested and polled for
//! (GitHub provisions forks asynchronously). Handles are never cached across
//! runs, so an externally deleted or renamed fork is tolerated by
//! re-derivation.

use std::time::Duration;

use thiserror::Error;

use crate::types::RepoId;

use super::error::GitHubApiError;
use super::GitHubApi;

/// How often the provisioning poll checks for the fork.
const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// How long the provisioning poll waits in total before giving up. GitHub's
/// documentation instructs contacting support if forking takes longer than
/// five minutes.
const POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Errors from fork resolution.
#[derive(Debug, Error)]
pub enum ForkError {
    /// A platform API call failed during lookup or creation.
    #[error(transparent)]
    Api(#[from] GitHubApiError),

    /// The fork did not become available within the provisioning window.
    #[error("timed out waiting for {fork} to appear on GitHub")]
    Unavailable { fork: String },

    /// The platform allocated a different name for the fork (naming
    /// collision under the bot account). The run fails rather than guessing
    /// at the renamed identity.
    #[error("fork of {upstream} was created as {actual}, expected {expected}")]
    Renamed {
        upstream: String,
        expected: String,
        actual: String,
    },
}

/// Coordinates of a bot-owned fork believed to mirror a target repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkHandle {
    /// The fork owner (the bot identity).
    pub owner: String,
    /// The fork's repository name.
    pub repo_name: String,
    /// Full name of the upstream repository the fork mirrors.
    pub base_full_name: String,
}

impl ForkHandle {
    /// Returns the fork as a [`RepoId`].
    pub fn repo_id(&self) -> RepoId {
        RepoId::new(self.owner.clone(), self.repo_name.clone())
    }
}

/// Ensures a fork of `upstream` exists under `forking_user`.
///
/// If a repository named like the upstream already exists under the bot
/// account, is marked as a fork, and has the upstream as its parent, it is
/// returned without any network write. Otherwise a fork is requested and the
/// provisioning poll waits (bounded) for it to become retrievable.
pub async fn ensure_fork<A: GitHubApi>(
    api: &A,
    forking_user: &str,
    upstream: &RepoId,
) -> Result<ForkHandle, ForkError> {
    if is_forked(api, forking_user, upstream).await? {
        tracing::debug!(user = forking_user, upstream = %upstream, "fork already exists");
        return Ok(ForkHandle {
            owner: forking_user.to_string(),
            repo_name: upstream.repo.clone(),
            base_full_name: upstream.full_name(),
        });
    }

    tracing::info!(user = forking_user, upstream = %upstream, "creating fork");
    let forked = api.create_fork(upstream).await?;
    if forked.name != upstream.repo {
        return Err(ForkError::Renamed {
            upstream: upstream.full_name(),
            expected: upstream.repo.clone(),
            actual: forked.name,
        });
    }

    wait_for_repo(api, forking_user, &upstream.repo).await?;

    Ok(ForkHandle {
        owner: forking_user.to_string(),
        repo_name: upstream.repo.clone(),
        base_full_name: upstream.full_name(),
    })
}

/// Returns true if `forking_user` already owns a valid fork of `upstream`.
///
/// Valid means: listed under the user's repositories, marked as a fork, and
/// (checked with a direct lookup) carrying the upstream as its parent. A
/// same-named repository with a different parent is not a usable fork.
async fn is_forked<A: GitHubApi>(
    api: &A,
    forking_user: &str,
    upstream: &RepoId,
) -> Result<bool, GitHubApiError> {
    let fork_full_name = format!("{}/{}", forking_user, upstream.repo);

    let repos = api.list_repos_for_user(forking_user).await?;
    let Some(candidate) = repos
        .into_iter()
        .find(|repo| repo.fork && repo.full_name == fork_full_name)
    else {
        return Ok(false);
    };

    let parent = api
        .get_repo(forking_user, &candidate.name)
        .await?
        .parent_full_name;

    Ok(parent.as_deref() == Some(upstream.full_name().as_str()))
}

/// Polls until the freshly requested fork is retrievable, bounded by
/// [`POLL_TIMEOUT`].
async fn wait_for_repo<A: GitHubApi>(
    api: &A,
    owner: &str,
    repo: &str,
) -> Result<(), ForkError> {
    let mut interval = tokio::time::interval(POLL_INTERVAL);

    let poll = async {
        loop {
            interval.tick().await;
            match api.get_repo(owner, repo).await {
                Ok(data) if data.fork => return,
                Ok(_) => {
                    tracing::debug!(owner, repo, "repository exists but is not a fork yet");
                }
                Err(err) => {
                    tracing::warn!(owner, repo, error = %err, "error polling for fork");
                }
            }
        }
    };

    tokio::time::timeout(POLL_TIMEOUT, poll)
        .await
        .map_err(|_| ForkError::Unavailable {
            fork: format!("{}/{}", owner, repo),
        })
}
