//! Orchestrator tests against mock platform and replay implementations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use crate::config::Config;
use crate::github::{
    CommentData, CreatedIssue, CreatedPull, GitHubApi, GitHubApiError, PullData, RepoData,
    RepoSummary,
};
use crate::types::{PrNumber, RepoId};
use crate::webhooks::{CommentAction, Event, IssueCommentEvent, PrAction, PullRequestEvent};

use super::replay::{ReplayOutcome, ReplayRequest, Replayer};
use super::report::{CONFLICT_LABEL, INVITE_MARKER};
use super::Cherrypicker;

const BOT: &str = "pick-bot";
const SOURCE_PR: PrNumber = PrNumber(42);

fn upstream() -> RepoId {
    RepoId::new("acme", "widget")
}

/// Recording mock of the platform API.
#[derive(Default)]
struct MockGitHub {
    pulls: Mutex<HashMap<u64, PullData>>,
    comments_posted: Mutex<Vec<(u64, String)>>,
    existing_comments: Mutex<Vec<CommentData>>,
    labels_added: Mutex<Vec<(u64, Vec<String>)>>,
    issues_created: Mutex<Vec<(String, String, Vec<String>)>>,
    pulls_created: Mutex<Vec<(String, String, String)>>,
    org_members: Mutex<Vec<String>>,
    collaborators: Mutex<Vec<String>>,
    user_repos: Mutex<Vec<RepoSummary>>,
    repos: Mutex<HashMap<String, RepoData>>,
    fork_creations: Mutex<u32>,
    commit_messages: Mutex<HashMap<String, String>>,
}

impl MockGitHub {
    fn with_pull(self, pull: PullData) -> Self {
        self.pulls.lock().unwrap().insert(pull.number.0, pull);
        self
    }

    /// Registers a valid fork of the upstream under the bot account.
    fn with_fork(self) -> Self {
        let fork_full = format!("{}/widget", BOT);
        self.user_repos.lock().unwrap().push(RepoSummary {
            name: "widget".to_string(),
            full_name: fork_full.clone(),
            fork: true,
        });
        self.repos.lock().unwrap().insert(
            fork_full,
            RepoData {
                name: "widget".to_string(),
                fork: true,
                parent_full_name: Some(upstream().full_name()),
            },
        );
        self
    }

    fn comments(&self) -> Vec<String> {
        self.comments_posted
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn labels(&self) -> Vec<String> {
        self.labels_added
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, labels)| labels.clone())
            .collect()
    }
}

impl GitHubApi for Arc<MockGitHub> {
    async fn get_pull(&self, _repo: &RepoId, number: PrNumber) -> Result<PullData, GitHubApiError> {
        self.pulls
            .lock()
            .unwrap()
            .get(&number.0)
            .cloned()
            .ok_or_else(|| GitHubApiError::permanent_without_source("no such pull"))
    }

    async fn create_pull(
        &self,
        _repo: &RepoId,
        title: &str,
        _body: &str,
        head: &str,
        base: &str,
    ) -> Result<CreatedPull, GitHubApiError> {
        let mut created = self.pulls_created.lock().unwrap();
        created.push((title.to_string(), head.to_string(), base.to_string()));
        let number = 1000 + created.len() as u64;
        Ok(CreatedPull {
            number: PrNumber(number),
            html_url: format!("https://github.com/acme/widget/pull/{number}"),
        })
    }

    async fn create_comment(
        &self,
        _repo: &RepoId,
        issue: u64,
        body: &str,
    ) -> Result<(), GitHubApiError> {
        self.comments_posted
            .lock()
            .unwrap()
            .push((issue, body.to_string()));
        Ok(())
    }

    async fn list_comments(
        &self,
        _repo: &RepoId,
        _issue: u64,
    ) -> Result<Vec<CommentData>, GitHubApiError> {
        Ok(self.existing_comments.lock().unwrap().clone())
    }

    async fn add_labels(
        &self,
        _repo: &RepoId,
        issue: u64,
        labels: &[String],
    ) -> Result<(), GitHubApiError> {
        self.labels_added
            .lock()
            .unwrap()
            .push((issue, labels.to_vec()));
        Ok(())
    }

    async fn create_issue(
        &self,
        _repo: &RepoId,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<CreatedIssue, GitHubApiError> {
        self.issues_created
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string(), labels.to_vec()));
        Ok(CreatedIssue {
            number: 900,
            html_url: "https://github.com/acme/widget/issues/900".to_string(),
        })
    }

    async fn is_org_member(&self, _org: &str, user: &str) -> Result<bool, GitHubApiError> {
        Ok(self.org_members.lock().unwrap().iter().any(|m| m == user))
    }

    async fn is_collaborator(&self, _repo: &RepoId, user: &str) -> Result<bool, GitHubApiError> {
        Ok(self.collaborators.lock().unwrap().iter().any(|c| c == user))
    }

    async fn list_repos_for_user(&self, _user: &str) -> Result<Vec<RepoSummary>, GitHubApiError> {
        Ok(self.user_repos.lock().unwrap().clone())
    }

    async fn get_repo(&self, owner: &str, repo: &str) -> Result<RepoData, GitHubApiError> {
        self.repos
            .lock()
            .unwrap()
            .get(&format!("{owner}/{repo}"))
            .cloned()
            .ok_or_else(|| GitHubApiError::permanent_without_source("no such repository"))
    }

    async fn create_fork(&self, repo: &RepoId) -> Result<RepoData, GitHubApiError> {
        *self.fork_creations.lock().unwrap() += 1;
        let data = RepoData {
            name: repo.repo.clone(),
            fork: true,
            parent_full_name: Some(repo.full_name()),
        };
        // Provisioning is instantaneous in the mock.
        self.repos
            .lock()
            .unwrap()
            .insert(format!("{}/{}", BOT, repo.repo), data.clone());
        Ok(data)
    }

    async fn get_commit_message(&self, _repo: &RepoId, sha: &str) -> Result<String, GitHubApiError> {
        Ok(self
            .commit_messages
            .lock()
            .unwrap()
            .get(sha)
            .cloned()
            .unwrap_or_default())
    }
}

/// Mock replay engine: records requests, answers from a per-branch table,
/// succeeds by default.
#[derive(Default)]
struct MockReplayer {
    outcomes: Mutex<HashMap<String, ReplayOutcome>>,
    requests: Mutex<Vec<ReplayRequest>>,
}

impl MockReplayer {
    fn branches_replayed(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.target_branch.clone())
            .collect()
    }
}

impl Replayer for Arc<MockReplayer> {
    async fn replay(&self, request: &ReplayRequest) -> ReplayOutcome {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .get(&request.target_branch)
            .cloned()
            .unwrap_or_else(|| ReplayOutcome::Success {
                pr_number: PrNumber(1001),
                html_url: "https://github.com/acme/widget/pull/1001".to_string(),
            })
    }
}

struct Harness {
    api: Arc<MockGitHub>,
    replayer: Arc<MockReplayer>,
    picker: Cherrypicker<Arc<MockGitHub>, Arc<MockReplayer>>,
}

fn merged_pull() -> PullData {
    PullData {
        number: SOURCE_PR,
        title: "Fix the frobnicator".to_string(),
        merged: true,
        merge_commit_sha: Some("abc123".to_string()),
        patch_url: Some("https://github.com/acme/widget/pull/42.patch".to_string()),
        labels: vec!["bug".to_string()],
    }
}

fn harness_with(config: Config, api: MockGitHub) -> Harness {
    let api = Arc::new(api);
    let replayer = Arc::new(MockReplayer::default());
    let picker = Cherrypicker::new(
        Arc::clone(&api),
        Arc::clone(&replayer),
        config,
        BOT.to_string(),
    );
    Harness {
        api,
        replayer,
        picker,
    }
}

/// Merged source PR, fork already in place, everyone allowed.
fn harness() -> Harness {
    let config = Config {
        allow_all: true,
        ..Config::default()
    };
    harness_with(config, MockGitHub::default().with_pull(merged_pull()).with_fork())
}

fn comment(body: &str, author: &str) -> Event {
    Event::IssueComment(IssueCommentEvent {
        repo: upstream(),
        action: CommentAction::Created,
        pr_number: Some(SOURCE_PR),
        issue_open: true,
        body: body.to_string(),
        author_login: author.to_string(),
    })
}

fn labeled(label: &str) -> Event {
    Event::PullRequest(PullRequestEvent {
        repo: upstream(),
        action: PrAction::Labeled,
        pr_number: SOURCE_PR,
        label: Some(label.to_string()),
    })
}

#[tokio::test]
async fn comment_pick_replays_each_branch_in_order() {
    let h = harness();
    h.picker
        .handle_event(&comment(
            "/cherrypick release/v1.2\n/cherrypick release/v1.3",
            "someone",
        ))
        .await
        .unwrap();

    assert_eq!(
        h.replayer.branches_replayed(),
        vec!["release/v1.2", "release/v1.3"]
    );
    let requests = h.replayer.requests.lock().unwrap();
    assert_eq!(requests[0].fork.owner, BOT);
    assert_eq!(requests[0].fork.base_full_name, "acme/widget");
    assert_eq!(requests[0].title, "Fix the frobnicator");
    assert_eq!(requests[0].labels, vec!["bug"]);
    drop(requests);

    // One success comment and one picked label per branch.
    let comments = h.api.comments();
    assert_eq!(comments.len(), 2);
    assert!(comments.iter().all(|c| c.contains("Cherry-picked to")));
    assert_eq!(
        h.api.labels(),
        vec!["cherry-picked/release/v1.2", "cherry-picked/release/v1.3"]
    );
}

#[tokio::test]
async fn bot_labels_and_exclusions_are_not_copied() {
    let mut pull = merged_pull();
    pull.labels = vec![
        "bug".to_string(),
        "do-not-copy".to_string(),
        "needs-cherry-pick/stable".to_string(),
        "cherry-picked/old".to_string(),
    ];
    let config = Config {
        allow_all: true,
        exclude_labels: vec!["do-not-copy".to_string()],
        ..Config::default()
    };
    let h = harness_with(config, MockGitHub::default().with_pull(pull).with_fork());

    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "someone"))
        .await
        .unwrap();

    let requests = h.replayer.requests.lock().unwrap();
    assert_eq!(requests[0].labels, vec!["bug"]);
}

#[tokio::test]
async fn already_picked_branch_is_a_benign_no_op() {
    let mut pull = merged_pull();
    pull.labels.push("cherry-picked/release/v1.2".to_string());
    let config = Config {
        allow_all: true,
        ..Config::default()
    };
    let h = harness_with(config, MockGitHub::default().with_pull(pull).with_fork());

    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "someone"))
        .await
        .unwrap();

    assert!(h.replayer.branches_replayed().is_empty());
    let comments = h.api.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("Already cherry-picked"));
    assert!(h.api.labels().is_empty());
}

#[tokio::test]
async fn conflict_on_one_branch_does_not_hide_success_on_another() {
    let h = harness();
    h.replayer.outcomes.lock().unwrap().insert(
        "release/v1.3".to_string(),
        ReplayOutcome::Conflict {
            details: "error: patch failed: src/lib.rs:10".to_string(),
        },
    );

    h.picker
        .handle_event(&comment(
            "/cherrypick release/v1.2\n/cherrypick release/v1.3",
            "someone",
        ))
        .await
        .unwrap();

    assert_eq!(
        h.replayer.branches_replayed(),
        vec!["release/v1.2", "release/v1.3"]
    );
    assert_eq!(
        h.api.labels(),
        vec!["cherry-picked/release/v1.2", CONFLICT_LABEL]
    );
    let comments = h.api.comments();
    assert!(comments[0].contains("Cherry-picked to `release/v1.2`"));
    assert!(comments[1].contains("does not apply cleanly"));
    // No tracking issue unless configured.
    assert!(h.api.issues_created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn conflict_opens_a_tracking_issue_when_configured() {
    let config = Config {
        allow_all: true,
        create_issue_on_conflict: true,
        ..Config::default()
    };
    let h = harness_with(
        config,
        MockGitHub::default().with_pull(merged_pull()).with_fork(),
    );
    h.replayer.outcomes.lock().unwrap().insert(
        "stable".to_string(),
        ReplayOutcome::Conflict {
            details: "error: patch failed".to_string(),
        },
    );

    h.picker
        .handle_event(&comment("/cherrypick stable", "someone"))
        .await
        .unwrap();

    let issues = h.api.issues_created.lock().unwrap();
    assert_eq!(issues.len(), 1);
    let (title, body, labels) = &issues[0];
    assert!(title.contains("`stable`"));
    assert!(body.contains("error: patch failed"));
    assert_eq!(labels, &vec![CONFLICT_LABEL.to_string()]);
    drop(issues);

    let comments = h.api.comments();
    assert!(comments[0].contains("issues/900"));
    assert_eq!(h.api.labels(), vec![CONFLICT_LABEL]);
}

#[tokio::test]
async fn replay_failure_is_reported_without_labels() {
    let h = harness();
    h.replayer.outcomes.lock().unwrap().insert(
        "release/v1.2".to_string(),
        ReplayOutcome::Failure {
            cause: "target branch `release/v1.2` is not usable".to_string(),
        },
    );

    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "someone"))
        .await
        .unwrap();

    let comments = h.api.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("failed"));
    assert!(h.api.labels().is_empty());
}

#[tokio::test]
async fn unmerged_pull_is_rejected_with_a_comment() {
    let mut pull = merged_pull();
    pull.merged = false;
    let config = Config {
        allow_all: true,
        ..Config::default()
    };
    let h = harness_with(config, MockGitHub::default().with_pull(pull).with_fork());

    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "someone"))
        .await
        .unwrap();

    assert!(h.replayer.branches_replayed().is_empty());
    let comments = h.api.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("has not been merged"));
}

#[tokio::test]
async fn label_event_triggers_a_single_pick() {
    let h = harness();
    h.picker
        .handle_event(&labeled("needs-cherry-pick/release/v1.2"))
        .await
        .unwrap();
    assert_eq!(h.replayer.branches_replayed(), vec!["release/v1.2"]);
}

#[tokio::test]
async fn unrelated_label_events_are_ignored() {
    let h = harness();
    h.picker.handle_event(&labeled("bug")).await.unwrap();
    h.picker
        .handle_event(&Event::PullRequest(PullRequestEvent {
            repo: upstream(),
            action: PrAction::Unlabeled,
            pr_number: SOURCE_PR,
            label: Some("needs-cherry-pick/release/v1.2".to_string()),
        }))
        .await
        .unwrap();

    assert!(h.replayer.branches_replayed().is_empty());
    assert!(h.api.comments().is_empty());
}

#[tokio::test]
async fn unauthorized_commenter_is_reported_not_silent() {
    let config = Config::default();
    let h = harness_with(
        config,
        MockGitHub::default().with_pull(merged_pull()).with_fork(),
    );

    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "outsider"))
        .await
        .unwrap();

    assert!(h.replayer.branches_replayed().is_empty());
    let comments = h.api.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("@outsider is not authorized"));
}

#[tokio::test]
async fn collaborators_and_org_members_are_authorized() {
    let api = MockGitHub::default().with_pull(merged_pull()).with_fork();
    api.collaborators.lock().unwrap().push("colleague".to_string());
    api.org_members.lock().unwrap().push("member".to_string());
    let h = harness_with(Config::default(), api);

    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "colleague"))
        .await
        .unwrap();
    h.picker
        .handle_event(&comment("/cherrypick release/v1.3", "member"))
        .await
        .unwrap();

    assert_eq!(
        h.replayer.branches_replayed(),
        vec!["release/v1.2", "release/v1.3"]
    );
}

#[tokio::test]
async fn invite_enables_comment_triggers_for_outsiders() {
    let api = MockGitHub::default().with_pull(merged_pull()).with_fork();
    api.org_members.lock().unwrap().push("maintainer".to_string());
    let h = harness_with(Config::default(), api);

    h.picker
        .handle_event(&comment("/cherrypick-invite", "maintainer"))
        .await
        .unwrap();

    let comments = h.api.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains(INVITE_MARKER));

    // The recorded marker is what later runs read back.
    h.api.existing_comments.lock().unwrap().push(CommentData {
        author_login: BOT.to_string(),
        body: comments[0].clone(),
    });

    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "outsider"))
        .await
        .unwrap();
    assert_eq!(h.replayer.branches_replayed(), vec!["release/v1.2"]);
}

#[tokio::test]
async fn invite_marker_from_a_non_bot_author_is_ignored() {
    let api = MockGitHub::default().with_pull(merged_pull()).with_fork();
    api.existing_comments.lock().unwrap().push(CommentData {
        author_login: "impostor".to_string(),
        body: INVITE_MARKER.to_string(),
    });
    let h = harness_with(Config::default(), api);

    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "outsider"))
        .await
        .unwrap();

    assert!(h.replayer.branches_replayed().is_empty());
}

#[tokio::test]
async fn invite_from_an_outsider_is_rejected() {
    let h = harness_with(
        Config::default(),
        MockGitHub::default().with_pull(merged_pull()).with_fork(),
    );

    h.picker
        .handle_event(&comment("/cherrypick-invite", "outsider"))
        .await
        .unwrap();

    let comments = h.api.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("not authorized"));
    assert!(!comments[0].contains(INVITE_MARKER));
}

#[tokio::test]
async fn existing_fork_is_reused_without_a_create_call() {
    let h = harness();
    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "someone"))
        .await
        .unwrap();

    assert_eq!(*h.api.fork_creations.lock().unwrap(), 0);
    assert_eq!(h.replayer.branches_replayed(), vec!["release/v1.2"]);
}

#[tokio::test]
async fn missing_fork_is_created_exactly_once() {
    let config = Config {
        allow_all: true,
        ..Config::default()
    };
    // No with_fork: the bot account owns nothing yet.
    let h = harness_with(config, MockGitHub::default().with_pull(merged_pull()));

    h.picker
        .handle_event(&comment(
            "/cherrypick release/v1.2\n/cherrypick release/v1.3",
            "someone",
        ))
        .await
        .unwrap();

    // One create for the whole run, not one per branch.
    assert_eq!(*h.api.fork_creations.lock().unwrap(), 1);
    assert_eq!(
        h.replayer.branches_replayed(),
        vec!["release/v1.2", "release/v1.3"]
    );
}

#[tokio::test]
async fn squashed_commit_references_are_mined_when_enabled() {
    let config = Config {
        allow_all: true,
        copy_issue_numbers_from_squashed_commit: true,
        ..Config::default()
    };
    let api = MockGitHub::default().with_pull(merged_pull()).with_fork();
    api.commit_messages.lock().unwrap().insert(
        "abc123".to_string(),
        "Fix the frobnicator (#42)\n\nCloses #7\nFixes #12".to_string(),
    );
    let h = harness_with(config, api);

    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "someone"))
        .await
        .unwrap();

    let requests = h.replayer.requests.lock().unwrap();
    assert_eq!(requests[0].issue_refs, vec![7, 12]);
}

#[tokio::test]
async fn squashed_commit_references_are_off_by_default() {
    let h = harness();
    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", "someone"))
        .await
        .unwrap();

    let requests = h.replayer.requests.lock().unwrap();
    assert!(requests[0].issue_refs.is_empty());
}

#[tokio::test]
async fn out_of_scope_comment_events_are_ignored() {
    let h = harness();

    // Edited comment.
    let mut edited = match comment("/cherrypick release/v1.2", "someone") {
        Event::IssueComment(e) => e,
        _ => unreachable!(),
    };
    edited.action = CommentAction::Edited;
    h.picker
        .handle_event(&Event::IssueComment(edited))
        .await
        .unwrap();

    // Closed PR.
    let mut closed = match comment("/cherrypick release/v1.2", "someone") {
        Event::IssueComment(e) => e,
        _ => unreachable!(),
    };
    closed.issue_open = false;
    h.picker
        .handle_event(&Event::IssueComment(closed))
        .await
        .unwrap();

    // Plain issue, not a PR.
    let mut plain = match comment("/cherrypick release/v1.2", "someone") {
        Event::IssueComment(e) => e,
        _ => unreachable!(),
    };
    plain.pr_number = None;
    h.picker
        .handle_event(&Event::IssueComment(plain))
        .await
        .unwrap();

    // The bot's own comments.
    h.picker
        .handle_event(&comment("/cherrypick release/v1.2", BOT))
        .await
        .unwrap();

    // Command-free chatter.
    h.picker
        .handle_event(&comment("looks good to me", "someone"))
        .await
        .unwrap();

    assert!(h.replayer.branches_replayed().is_empty());
    assert!(h.api.comments().is_empty());
}
