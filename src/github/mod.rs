//! GitHub API boundary.
//!
//! The orchestrator talks to GitHub through the [`GitHubApi`] trait, which
//! lists exactly the capability groups the bot consumes: pulls, issue
//! comments and labels, membership checks, and repository/fork operations.
//! The trait-based design enables mock implementations for testing; the real
//! implementation lives in [`client`] and is backed by octocrab.

pub mod client;
pub mod error;
pub mod fork;
pub mod patch;

use std::future::Future;

use crate::types::{PrNumber, RepoId};

pub use client::OctocrabApi;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use fork::{ensure_fork, ForkError, ForkHandle};
pub use patch::download_patch;

/// Pull request data the bot reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullData {
    /// The PR number.
    pub number: PrNumber,
    /// The PR title.
    pub title: String,
    /// Whether the PR has been merged.
    pub merged: bool,
    /// The merge commit SHA, if merged.
    pub merge_commit_sha: Option<String>,
    /// URL of the PR's patch artifact.
    pub patch_url: Option<String>,
    /// Names of the labels currently on the PR.
    pub labels: Vec<String>,
}

/// A pull request created by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPull {
    /// The new PR's number.
    pub number: PrNumber,
    /// The new PR's web URL.
    pub html_url: String,
}

/// An issue created by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    /// The new issue's number.
    pub number: u64,
    /// The new issue's web URL.
    pub html_url: String,
}

/// An issue comment, as returned when listing comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentData {
    /// The comment author's login name.
    pub author_login: String,
    /// The comment body.
    pub body: String,
}

/// Summary of a repository from a user's repository listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSummary {
    /// The repository name.
    pub name: String,
    /// The `owner/repo` full name.
    pub full_name: String,
    /// Whether the repository is a fork.
    pub fork: bool,
}

/// Full repository data from a direct repository lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoData {
    /// The repository name.
    pub name: String,
    /// Whether the repository is a fork.
    pub fork: bool,
    /// Full name of the fork's parent repository, if any.
    pub parent_full_name: Option<String>,
}

/// The platform API operations the bot consumes.
///
/// All operations return [`GitHubApiError`] so callers can distinguish
/// transient from permanent failures. Implementations must be cheap to
/// share across the orchestrator and the replay engine.
pub trait GitHubApi: Send + Sync {
    /// Fetch a single PR.
    fn get_pull(
        &self,
        repo: &RepoId,
        number: PrNumber,
    ) -> impl Future<Output = Result<PullData, GitHubApiError>> + Send;

    /// Open a pull request from `head` (possibly `owner:branch`) into `base`.
    fn create_pull(
        &self,
        repo: &RepoId,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> impl Future<Output = Result<CreatedPull, GitHubApiError>> + Send;

    /// Post a comment on an issue or PR.
    fn create_comment(
        &self,
        repo: &RepoId,
        issue: u64,
        body: &str,
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    /// List all comments on an issue or PR.
    fn list_comments(
        &self,
        repo: &RepoId,
        issue: u64,
    ) -> impl Future<Output = Result<Vec<CommentData>, GitHubApiError>> + Send;

    /// Add labels to an issue or PR.
    fn add_labels(
        &self,
        repo: &RepoId,
        issue: u64,
        labels: &[String],
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    /// Open a new issue.
    fn create_issue(
        &self,
        repo: &RepoId,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> impl Future<Output = Result<CreatedIssue, GitHubApiError>> + Send;

    /// Check whether `user` is a member of `org`.
    fn is_org_member(
        &self,
        org: &str,
        user: &str,
    ) -> impl Future<Output = Result<bool, GitHubApiError>> + Send;

    /// Check whether `user` is a collaborator on the repository.
    fn is_collaborator(
        &self,
        repo: &RepoId,
        user: &str,
    ) -> impl Future<Output = Result<bool, GitHubApiError>> + Send;

    /// List the repositories owned by `user`.
    fn list_repos_for_user(
        &self,
        user: &str,
    ) -> impl Future<Output = Result<Vec<RepoSummary>, GitHubApiError>> + Send;

    /// Fetch a single repository.
    fn get_repo(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<RepoData, GitHubApiError>> + Send;

    /// Request creation of a fork of the repository under the authenticated
    /// user. Fork provisioning is asynchronous on GitHub's side; the returned
    /// data describes the fork as initially reported.
    fn create_fork(
        &self,
        repo: &RepoId,
    ) -> impl Future<Output = Result<RepoData, GitHubApiError>> + Send;

    /// Fetch the commit message for a commit SHA.
    fn get_commit_message(
        &self,
        repo: &RepoId,
        sha: &str,
    ) -> impl Future<Output = Result<String, GitHubApiError>> + Send;
}
