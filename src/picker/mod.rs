//! The cherry-pick orchestrator.
//!
//! [`Cherrypicker`] is the top-level state machine: it receives one parsed
//! webhook event, decides whether it is actionable, resolves the target
//! branches and the fork, drives one replay run per branch sequentially, and
//! reports every outcome back onto the source PR. Nothing is persisted
//! across events beyond what GitHub itself records (labels, comments, PR
//! state).

pub mod authz;
pub mod issue_refs;
pub mod replay;
pub mod report;

#[cfg(test)]
mod tests;

use thiserror::Error;

use crate::commands::{is_cherry_pick_invite_command, match_cherry_pick_command, match_label};
use crate::config::Config;
use crate::github::{ensure_fork, GitHubApi, GitHubApiError, PullData};
use crate::types::{PrNumber, RepoId};
use crate::webhooks::{CommentAction, Event, IssueCommentEvent, PrAction, PullRequestEvent};

use authz::Evidence;
use replay::{ReplayRequest, Replayer};

pub use replay::{GitReplayer, ReplayOutcome};

/// Errors that end an orchestration run without a user-visible report.
///
/// Almost everything is reported on the PR instead; only failures of the
/// reporting channel itself surface here.
#[derive(Debug, Error)]
pub enum PickerError {
    #[error(transparent)]
    Api(#[from] GitHubApiError),
}

/// What caused a pick request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A `/cherrypick` comment.
    Comment,
    /// A `<label_prefix><branch>` label.
    Label,
}

/// One actionable pick request, immutable once constructed and consumed
/// synchronously by a single orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CherryPickRequest {
    pub repo: RepoId,
    pub source_pr: PrNumber,
    /// Distinct target branches, in first-seen order.
    pub target_branches: Vec<String>,
    /// The requesting user, when the trigger carries one.
    pub requester: Option<String>,
    pub trigger: Trigger,
}

/// The top-level orchestrator.
pub struct Cherrypicker<A, R> {
    api: A,
    replayer: R,
    config: Config,
    /// Login of the authenticated bot user; owner of the forks.
    bot_user: String,
}

impl<A: GitHubApi, R: Replayer> Cherrypicker<A, R> {
    pub fn new(api: A, replayer: R, config: Config, bot_user: String) -> Self {
        Self {
            api,
            replayer,
            config,
            bot_user,
        }
    }

    /// Dispatches one webhook event to a terminal state.
    pub async fn handle_event(&self, event: &Event) -> Result<(), PickerError> {
        match event {
            Event::IssueComment(event) => self.on_issue_comment(event).await,
            Event::PullRequest(event) => self.on_pull_request(event).await,
        }
    }

    /// Comment path: invites and `/cherrypick` commands.
    async fn on_issue_comment(&self, event: &IssueCommentEvent) -> Result<(), PickerError> {
        if event.action != CommentAction::Created {
            tracing::debug!(action = ?event.action, "ignoring non-created comment");
            return Ok(());
        }
        let Some(source_pr) = event.pr_number else {
            tracing::debug!("ignoring comment on a plain issue");
            return Ok(());
        };
        if !event.issue_open {
            tracing::debug!(%source_pr, "ignoring comment on a closed pull request");
            return Ok(());
        }
        if event.author_login == self.bot_user {
            // The bot quotes commands in its own reports; never self-trigger.
            return Ok(());
        }

        if is_cherry_pick_invite_command(&event.body) {
            self.on_invite(&event.repo, source_pr, &event.author_login)
                .await?;
        }

        let command = match_cherry_pick_command(&event.body);
        if !command.matched {
            return Ok(());
        }

        let evidence = self
            .gather_evidence(&event.repo, source_pr, &event.author_login)
            .await?;
        if !authz::is_pick_allowed(self.config.allow_all, evidence) {
            tracing::info!(user = %event.author_login, "rejecting unauthorized pick request");
            self.api
                .create_comment(
                    &event.repo,
                    source_pr.0,
                    &report::unauthorized_comment(&event.author_login),
                )
                .await?;
            return Ok(());
        }

        self.cherry_pick(CherryPickRequest {
            repo: event.repo.clone(),
            source_pr,
            target_branches: command.branches,
            requester: Some(event.author_login.clone()),
            trigger: Trigger::Comment,
        })
        .await
    }

    /// Label path: a freshly applied `<label_prefix><branch>` label.
    ///
    /// No authorization check here; applying labels already requires write
    /// access to the repository.
    async fn on_pull_request(&self, event: &PullRequestEvent) -> Result<(), PickerError> {
        if event.action != PrAction::Labeled {
            tracing::debug!(action = ?event.action, "ignoring non-labeled PR event");
            return Ok(());
        }
        let prefixes = [self.config.label_prefix.clone()];
        let Some(branch) = event
            .label
            .as_deref()
            .and_then(|label| match_label(&prefixes, label))
        else {
            tracing::debug!(label = ?event.label, "label does not match the trigger prefix");
            return Ok(());
        };

        self.cherry_pick(CherryPickRequest {
            repo: event.repo.clone(),
            source_pr: event.pr_number,
            target_branches: vec![branch],
            requester: None,
            trigger: Trigger::Label,
        })
        .await
    }

    /// Records an invite if the inviter has standing, otherwise reports the
    /// rejection.
    async fn on_invite(
        &self,
        repo: &RepoId,
        source_pr: PrNumber,
        inviter: &str,
    ) -> Result<(), PickerError> {
        let evidence = self.gather_evidence(repo, source_pr, inviter).await?;
        if !authz::is_invite_allowed(self.config.allow_all, evidence) {
            self.api
                .create_comment(repo, source_pr.0, &report::unauthorized_comment(inviter))
                .await?;
            return Ok(());
        }
        if evidence.invited {
            tracing::debug!(%source_pr, "comment triggers already enabled");
            return Ok(());
        }
        tracing::info!(%source_pr, inviter, "enabling comment triggers");
        self.api
            .create_comment(repo, source_pr.0, &report::invite_granted_comment())
            .await?;
        Ok(())
    }

    /// Gathers the authorization evidence for one requester.
    async fn gather_evidence(
        &self,
        repo: &RepoId,
        source_pr: PrNumber,
        user: &str,
    ) -> Result<Evidence, PickerError> {
        // Membership lookup against a user-owned repository answers 404,
        // which the client maps to false.
        let org_member = self.api.is_org_member(&repo.owner, user).await?;
        let collaborator = self.api.is_collaborator(repo, user).await?;
        let invited = self.has_invite_marker(repo, source_pr).await?;
        Ok(Evidence {
            org_member,
            collaborator,
            invited,
        })
    }

    /// Whether a bot comment on the PR carries the invite marker.
    async fn has_invite_marker(
        &self,
        repo: &RepoId,
        source_pr: PrNumber,
    ) -> Result<bool, PickerError> {
        let comments = self.api.list_comments(repo, source_pr.0).await?;
        Ok(comments.iter().any(|comment| {
            comment.author_login == self.bot_user && comment.body.contains(report::INVITE_MARKER)
        }))
    }

    /// Runs one pick request to its terminal state: resolve the source PR
    /// and fork, then replay and report per target branch.
    async fn cherry_pick(&self, request: CherryPickRequest) -> Result<(), PickerError> {
        tracing::info!(
            repo = %request.repo,
            source_pr = %request.source_pr,
            branches = ?request.target_branches,
            trigger = ?request.trigger,
            "starting cherry-pick run"
        );

        let pull = self.api.get_pull(&request.repo, request.source_pr).await?;
        if !pull.merged {
            self.api
                .create_comment(
                    &request.repo,
                    request.source_pr.0,
                    &report::unmerged_comment(request.source_pr),
                )
                .await?;
            return Ok(());
        }
        let Some(patch_url) = pull.patch_url.clone() else {
            self.api
                .create_comment(
                    &request.repo,
                    request.source_pr.0,
                    &report::run_failure_comment("the pull request has no patch artifact"),
                )
                .await?;
            return Ok(());
        };

        // The fork is resolved once per run and cached only for its
        // duration; the next event re-derives it.
        let fork = match ensure_fork(&self.api, &self.bot_user, &request.repo).await {
            Ok(fork) => fork,
            Err(err) => {
                tracing::warn!(error = %err, "fork resolution failed");
                self.api
                    .create_comment(
                        &request.repo,
                        request.source_pr.0,
                        &report::run_failure_comment(&err.to_string()),
                    )
                    .await?;
                return Ok(());
            }
        };

        let issue_refs = self.mined_issue_refs(&request.repo, &pull).await;
        let labels = self.labels_to_copy(&pull);

        // Sequential on purpose: each run exclusively owns one working copy
        // and one fork branch name.
        for target_branch in &request.target_branches {
            if is_picked(&pull.labels, &self.config.picked_label_prefix, target_branch) {
                tracing::info!(%target_branch, "already picked; skipping");
                self.api
                    .create_comment(
                        &request.repo,
                        request.source_pr.0,
                        &report::already_picked_comment(target_branch),
                    )
                    .await?;
                continue;
            }

            let outcome = self
                .replayer
                .replay(&ReplayRequest {
                    repo: request.repo.clone(),
                    source_pr: request.source_pr,
                    title: pull.title.clone(),
                    target_branch: target_branch.clone(),
                    fork: fork.clone(),
                    patch_url: patch_url.clone(),
                    labels: labels.clone(),
                    issue_refs: issue_refs.clone(),
                })
                .await;

            // Outcomes are resolved per branch; one branch's conflict never
            // hides another branch's success.
            report::report_outcome(
                &self.api,
                &self.config,
                &request.repo,
                request.source_pr,
                target_branch,
                &outcome,
            )
            .await?;
        }

        Ok(())
    }

    /// Closing references from the squashed commit, when configured and
    /// available. Lookup failures degrade to "no references".
    async fn mined_issue_refs(&self, repo: &RepoId, pull: &PullData) -> Vec<u64> {
        if !self.config.copy_issue_numbers_from_squashed_commit {
            return Vec::new();
        }
        let Some(sha) = pull.merge_commit_sha.as_deref() else {
            return Vec::new();
        };
        match self.api.get_commit_message(repo, sha).await {
            Ok(message) => issue_refs::closing_issue_refs(&message),
            Err(err) => {
                tracing::warn!(error = %err, sha, "could not fetch the squashed commit message");
                Vec::new()
            }
        }
    }

    /// Labels copied from the source PR onto the new PR: the exclusion list
    /// and both bot prefixes are dropped, so a copied label can never
    /// re-trigger a pick.
    fn labels_to_copy(&self, pull: &PullData) -> Vec<String> {
        pull.labels
            .iter()
            .filter(|label| !self.config.exclude_labels.contains(*label))
            .filter(|label| !label.starts_with(&self.config.label_prefix))
            .filter(|label| !label.starts_with(&self.config.picked_label_prefix))
            .cloned()
            .collect()
    }
}

/// Whether the picked status marker for `target_branch` is already present.
fn is_picked(labels: &[String], picked_label_prefix: &str, target_branch: &str) -> bool {
    let marker = format!("{picked_label_prefix}{target_branch}");
    labels.iter().any(|label| *label == marker)
}
