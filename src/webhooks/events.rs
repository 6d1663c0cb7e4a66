//! Typed GitHub webhook events.
//!
//! Each type carries exactly the fields the orchestrator reads. The two
//! event classes are modelled as a tagged union so handling is exhaustive -
//! there is no shared mutable payload object inspected ad hoc.

use serde::{Deserialize, Serialize};

use crate::types::{PrNumber, RepoId};

/// A parsed GitHub webhook event the bot may act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// An issue or PR comment was created, edited, or deleted.
    ///
    /// In GitHub's API, PR comments on the conversation tab are delivered as
    /// `issue_comment` events.
    IssueComment(IssueCommentEvent),

    /// A pull request was labeled or unlabeled.
    PullRequest(PullRequestEvent),
}

impl Event {
    /// Returns the repository this event belongs to.
    pub fn repo_id(&self) -> &RepoId {
        match self {
            Event::IssueComment(e) => &e.repo,
            Event::PullRequest(e) => &e.repo,
        }
    }
}

/// Action performed on an issue comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    /// Comment was created. Only this action can trigger a pick.
    Created,
    /// Comment was edited.
    Edited,
    /// Comment was deleted.
    Deleted,
}

/// An issue/PR comment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    /// The repository.
    pub repo: RepoId,

    /// The action that triggered this event.
    pub action: CommentAction,

    /// The PR number. Only set if the comment is on a pull request, not a
    /// regular issue; commands are only valid on PRs.
    pub pr_number: Option<PrNumber>,

    /// Whether the issue/PR is open.
    pub issue_open: bool,

    /// The comment body text. Empty for `deleted` actions.
    pub body: String,

    /// The comment author's login name.
    pub author_login: String,
}

/// Action performed on a pull request.
///
/// Only label changes are relevant to the bot; the parser maps every other
/// PR action to "no event".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    /// A label was added to the PR.
    Labeled,
    /// A label was removed from the PR.
    Unlabeled,
}

/// A pull request label event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// The repository.
    pub repo: RepoId,

    /// The action that triggered this event.
    pub action: PrAction,

    /// The PR number.
    pub pr_number: PrNumber,

    /// The name of the label that was added or removed.
    pub label: Option<String>,
}
