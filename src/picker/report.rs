//! Outcome reporting.
//!
//! Every terminal outcome of a replay run is made user-visible on the source
//! PR: a success links the new pull request and records the picked status
//! label, a conflict is described (optionally with a tracking issue) and
//! marked with the conflict label, a failure is surfaced as a comment with no
//! label. Silent failure is reserved for the explicitly ignored event classes.

use crate::config::Config;
use crate::github::{GitHubApi, GitHubApiError};
use crate::types::{PrNumber, RepoId};

use super::replay::ReplayOutcome;

/// Label applied to the source PR when a pick conflicts.
pub const CONFLICT_LABEL: &str = "cherry-pick-conflict";

/// Hidden marker recording that comment triggers were enabled on a PR.
///
/// Stored inside a bot comment; HTML comments are invisible in the rendered
/// conversation but survive verbatim in the comment body.
pub const INVITE_MARKER: &str = "<!-- cherrypicker: comment triggers enabled -->";

/// Reports one replay outcome on the source PR.
pub async fn report_outcome<A: GitHubApi>(
    api: &A,
    config: &Config,
    repo: &RepoId,
    source_pr: PrNumber,
    target_branch: &str,
    outcome: &ReplayOutcome,
) -> Result<(), GitHubApiError> {
    match outcome {
        ReplayOutcome::Success { html_url, .. } => {
            tracing::info!(%source_pr, target_branch, url = %html_url, "pick succeeded");
            api.create_comment(repo, source_pr.0, &success_comment(target_branch, html_url))
                .await?;
            let picked = format!("{}{}", config.picked_label_prefix, target_branch);
            api.add_labels(repo, source_pr.0, &[picked]).await?;
        }
        ReplayOutcome::Conflict { details } => {
            tracing::info!(%source_pr, target_branch, "pick conflicted");
            let comment = if config.create_issue_on_conflict {
                let issue = api
                    .create_issue(
                        repo,
                        &conflict_issue_title(source_pr, target_branch),
                        &conflict_body(source_pr, target_branch, details),
                        &[CONFLICT_LABEL.to_string()],
                    )
                    .await?;
                conflict_issue_comment(target_branch, &issue.html_url)
            } else {
                conflict_body(source_pr, target_branch, details)
            };
            api.create_comment(repo, source_pr.0, &comment).await?;
            api.add_labels(repo, source_pr.0, &[CONFLICT_LABEL.to_string()])
                .await?;
        }
        ReplayOutcome::Failure { cause } => {
            tracing::warn!(%source_pr, target_branch, cause = %cause, "pick failed");
            api.create_comment(repo, source_pr.0, &failure_comment(target_branch, cause))
                .await?;
        }
    }
    Ok(())
}

pub fn success_comment(target_branch: &str, pull_url: &str) -> String {
    format!("Cherry-picked to `{target_branch}`: {pull_url}")
}

pub fn already_picked_comment(target_branch: &str) -> String {
    format!("Already cherry-picked to `{target_branch}`; nothing to do.")
}

pub fn unmerged_comment(source_pr: PrNumber) -> String {
    format!("Cannot cherry-pick {source_pr}: the pull request has not been merged.")
}

pub fn unauthorized_comment(user: &str) -> String {
    format!(
        "@{user} is not authorized to trigger cherry-picks on this repository. \
         A maintainer can enable comment triggers with `/cherrypick-invite`."
    )
}

pub fn invite_granted_comment() -> String {
    format!(
        "{INVITE_MARKER}\nCherry-pick comment commands are now enabled on this pull request."
    )
}

pub fn failure_comment(target_branch: &str, cause: &str) -> String {
    format!("Cherry-pick to `{target_branch}` failed: {cause}")
}

pub fn run_failure_comment(cause: &str) -> String {
    format!("Cherry-pick could not start: {cause}")
}

fn conflict_issue_title(source_pr: PrNumber, target_branch: &str) -> String {
    format!("Cherry-pick of {source_pr} to `{target_branch}` conflicts")
}

fn conflict_body(source_pr: PrNumber, target_branch: &str, details: &str) -> String {
    format!(
        "The patch for {source_pr} does not apply cleanly onto `{target_branch}` \
         and needs a manual cherry-pick.\n\n```\n{}\n```",
        details.trim_end()
    )
}

fn conflict_issue_comment(target_branch: &str, issue_url: &str) -> String {
    format!("Cherry-pick to `{target_branch}` conflicts; opened {issue_url} to track it.")
}

/// Title for the pull request opened on the target branch.
pub fn new_pull_title(source_title: &str, target_branch: &str) -> String {
    format!("[{target_branch}] {source_title}")
}

/// Body for the pull request opened on the target branch. Closing references
/// mined from the squashed commit are re-attached so the picked copy closes
/// the same issues.
pub fn new_pull_body(source_pr: PrNumber, target_branch: &str, issue_refs: &[u64]) -> String {
    let mut body = format!("Automated cherry-pick of {source_pr} to `{target_branch}`.");
    for number in issue_refs {
        body.push_str(&format!("\n\nCloses #{number}"));
    }
    body
}
