//! GitHub webhook payload parser.
//!
//! This module parses raw webhook JSON payloads into typed [`Event`] values.
//!
//! # Parsing Strategy
//!
//! 1. The event type is determined from the `GITHUB_EVENT_NAME` value (the
//!    same string the `X-GitHub-Event` header carries)
//! 2. The payload is parsed according to the event type
//! 3. Unknown event types and irrelevant PR actions return `Ok(None)`
//! 4. Malformed payloads return `Err` with details

use serde::Deserialize;
use thiserror::Error;

use crate::types::{PrNumber, RepoId};

use super::events::{CommentAction, Event, IssueCommentEvent, PrAction, PullRequestEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Field has invalid value (e.g., unknown comment action).
    #[error("invalid field value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses a webhook payload into a typed event.
///
/// # Returns
///
/// * `Ok(Some(event))` - a known event type the bot may act on
/// * `Ok(None)` - unknown event type or irrelevant PR action (ignored)
/// * `Err(e)` - malformed payload or missing required fields
///
/// # Examples
///
/// ```
/// use cherrypicker::webhooks::parse_webhook;
///
/// let payload = br#"{
///     "action": "created",
///     "comment": {
///         "body": "/cherrypick release/v1.2",
///         "user": { "login": "octocat" }
///     },
///     "issue": {
///         "number": 42,
///         "state": "open",
///         "pull_request": { "url": "..." }
///     },
///     "repository": {
///         "owner": { "login": "owner" },
///         "name": "repo"
///     }
/// }"#;
///
/// assert!(parse_webhook("issue_comment", payload).unwrap().is_some());
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<Event>, ParseError> {
    match event_type {
        "issue_comment" => parse_issue_comment(payload).map(|e| Some(Event::IssueComment(e))),
        "pull_request" => parse_pull_request(payload).map(|opt| opt.map(Event::PullRequest)),
        // Unknown event types are ignored (not an error)
        _ => Ok(None),
    }
}

// ============================================================================
// Raw payload structures for deserialization
//
// These match GitHub's webhook JSON structure. Optional fields are validated
// explicitly after deserialization.
// ============================================================================

/// Minimal repository info present in all webhook payloads.
#[derive(Debug, Deserialize)]
struct RawRepository {
    owner: RawOwner,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

// ============================================================================
// issue_comment event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    action: String,
    comment: RawComment,
    issue: RawIssue,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    body: Option<String>,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    state: Option<String>,
    // If this field is present, the issue is actually a PR
    pull_request: Option<serde_json::Value>,
}

fn parse_issue_comment(payload: &[u8]) -> Result<IssueCommentEvent, ParseError> {
    let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "created" => CommentAction::Created,
        "edited" => CommentAction::Edited,
        "deleted" => CommentAction::Deleted,
        other => {
            return Err(ParseError::InvalidField {
                field: "action",
                value: other.to_string(),
            });
        }
    };

    // Only set pr_number if this is a PR (has pull_request field)
    let pr_number = raw.issue.pull_request.map(|_| PrNumber(raw.issue.number));

    Ok(IssueCommentEvent {
        repo: RepoId::new(raw.repository.owner.login, raw.repository.name),
        action,
        pr_number,
        issue_open: raw.issue.state.as_deref() == Some("open"),
        body: raw.comment.body.unwrap_or_default(),
        author_login: raw.comment.user.login,
    })
}

// ============================================================================
// pull_request event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    number: u64,
    label: Option<RawLabel>,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

fn parse_pull_request(payload: &[u8]) -> Result<Option<PullRequestEvent>, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    // Only label changes matter to the bot; everything else is ignored.
    let action = match raw.action.as_str() {
        "labeled" => PrAction::Labeled,
        "unlabeled" => PrAction::Unlabeled,
        _ => return Ok(None),
    };

    Ok(Some(PullRequestEvent {
        repo: RepoId::new(raw.repository.owner.login, raw.repository.name),
        action,
        pr_number: PrNumber(raw.number),
        label: raw.label.map(|l| l.name),
    }))
}
