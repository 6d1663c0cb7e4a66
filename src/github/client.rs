//! Octocrab-backed implementation of the platform API.
//!
//! The wrapper holds a single `Octocrab` instance; operations take the
//! repository explicitly because the bot touches both the upstream
//! repository and the bot-owned fork within one run.
//!
//! Membership and collaborator checks use raw routes because they are
//! status-code protocols (204 = yes, 404 = no); the typed octocrab
//! surface is used everywhere a typed model exists.

use serde::Deserialize;

use crate::types::{PrNumber, RepoId};

use super::error::GitHubApiError;
use super::{
    CommentData, CreatedIssue, CreatedPull, GitHubApi, PullData, RepoData, RepoSummary,
};

/// A GitHub API client backed by octocrab.
#[derive(Clone)]
pub struct OctocrabApi {
    client: octocrab::Octocrab,
}

impl OctocrabApi {
    /// Creates a new client from a pre-configured octocrab instance.
    pub fn new(client: octocrab::Octocrab) -> Self {
        Self { client }
    }

    /// Creates a client from a personal access token.
    pub fn from_token(token: impl Into<String>) -> Result<Self, GitHubApiError> {
        let client = octocrab::Octocrab::builder()
            .personal_token(token.into())
            .build()
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(Self::new(client))
    }

    /// Returns the login of the authenticated user (the bot identity that
    /// owns the forks).
    pub async fn current_user(&self) -> Result<String, GitHubApiError> {
        let user = self
            .client
            .current()
            .user()
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(user.login)
    }

    /// Performs a boolean status-code check (204 = true, 404 = false).
    async fn status_check(&self, route: String) -> Result<bool, GitHubApiError> {
        match self.client._get(route.as_str()).await {
            Ok(response) => match response.status().as_u16() {
                204 | 200 => Ok(true),
                302 | 404 => Ok(false),
                other => Err(GitHubApiError::permanent_without_source(format!(
                    "unexpected HTTP {} from {}",
                    other, route
                ))),
            },
            Err(err) => {
                let err = GitHubApiError::from_octocrab(err);
                // Some octocrab transports surface the 404 as an error
                // rather than a response.
                if err.status_code == Some(404) {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }
}

impl std::fmt::Debug for OctocrabApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabApi").finish_non_exhaustive()
    }
}

/// Raw commit shape for the commits endpoint (only the message is read).
#[derive(Debug, Deserialize)]
struct RawCommit {
    commit: RawCommitInner,
}

#[derive(Debug, Deserialize)]
struct RawCommitInner {
    message: String,
}

/// Raw repository summary for user repository listings.
#[derive(Debug, Deserialize)]
struct RawRepoSummary {
    name: String,
    full_name: String,
    #[serde(default)]
    fork: bool,
}

fn repo_data_from_model(repo: octocrab::models::Repository) -> RepoData {
    RepoData {
        name: repo.name,
        fork: repo.fork.unwrap_or(false),
        parent_full_name: repo.parent.and_then(|parent| parent.full_name),
    }
}

impl GitHubApi for OctocrabApi {
    async fn get_pull(&self, repo: &RepoId, number: PrNumber) -> Result<PullData, GitHubApiError> {
        let pull = self
            .client
            .pulls(&repo.owner, &repo.repo)
            .get(number.0)
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        Ok(PullData {
            number,
            title: pull.title.unwrap_or_default(),
            merged: pull.merged_at.is_some(),
            merge_commit_sha: pull.merge_commit_sha,
            patch_url: pull.patch_url.map(|url| url.to_string()),
            labels: pull
                .labels
                .unwrap_or_default()
                .into_iter()
                .map(|label| label.name)
                .collect(),
        })
    }

    async fn create_pull(
        &self,
        repo: &RepoId,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<CreatedPull, GitHubApiError> {
        let pull = self
            .client
            .pulls(&repo.owner, &repo.repo)
            .create(title, head, base)
            .body(body)
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let html_url = pull
            .html_url
            .map(|url| url.to_string())
            .unwrap_or_else(|| format!("https://github.com/{}/pull/{}", repo, pull.number));

        Ok(CreatedPull {
            number: PrNumber(pull.number),
            html_url,
        })
    }

    async fn create_comment(
        &self,
        repo: &RepoId,
        issue: u64,
        body: &str,
    ) -> Result<(), GitHubApiError> {
        self.client
            .issues(&repo.owner, &repo.repo)
            .create_comment(issue, body)
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }

    async fn list_comments(
        &self,
        repo: &RepoId,
        issue: u64,
    ) -> Result<Vec<CommentData>, GitHubApiError> {
        let page = self
            .client
            .issues(&repo.owner, &repo.repo)
            .list_comments(issue)
            .per_page(100)
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let comments = self
            .client
            .all_pages(page)
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        Ok(comments
            .into_iter()
            .map(|comment| CommentData {
                author_login: comment.user.login,
                body: comment.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn add_labels(
        &self,
        repo: &RepoId,
        issue: u64,
        labels: &[String],
    ) -> Result<(), GitHubApiError> {
        self.client
            .issues(&repo.owner, &repo.repo)
            .add_labels(issue, labels)
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }

    async fn create_issue(
        &self,
        repo: &RepoId,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<CreatedIssue, GitHubApiError> {
        let issue = self
            .client
            .issues(&repo.owner, &repo.repo)
            .create(title)
            .body(body)
            .labels(labels.to_vec())
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        Ok(CreatedIssue {
            number: issue.number,
            html_url: issue.html_url.to_string(),
        })
    }

    async fn is_org_member(&self, org: &str, user: &str) -> Result<bool, GitHubApiError> {
        self.status_check(format!("/orgs/{}/members/{}", org, user))
            .await
    }

    async fn is_collaborator(&self, repo: &RepoId, user: &str) -> Result<bool, GitHubApiError> {
        self.status_check(format!(
            "/repos/{}/{}/collaborators/{}",
            repo.owner, repo.repo, user
        ))
        .await
    }

    async fn list_repos_for_user(&self, user: &str) -> Result<Vec<RepoSummary>, GitHubApiError> {
        let mut repos = Vec::new();
        // The listing is paged; a short page marks the end. Every page is
        // fetched - a busy bot account can own a lot of forks, and stopping
        // early would misreport an existing fork as missing.
        let mut page = 1u32;
        loop {
            let batch: Vec<RawRepoSummary> = self
                .client
                .get(
                    format!("/users/{}/repos?per_page=100&page={}", user, page),
                    None::<&()>,
                )
                .await
                .map_err(GitHubApiError::from_octocrab)?;

            let last = batch.len() < 100;
            repos.extend(batch.into_iter().map(|repo| RepoSummary {
                name: repo.name,
                full_name: repo.full_name,
                fork: repo.fork,
            }));
            if last {
                break;
            }
            page += 1;
        }
        Ok(repos)
    }

    async fn get_repo(&self, owner: &str, repo: &str) -> Result<RepoData, GitHubApiError> {
        let repository = self
            .client
            .repos(owner, repo)
            .get()
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(repo_data_from_model(repository))
    }

    async fn create_fork(&self, repo: &RepoId) -> Result<RepoData, GitHubApiError> {
        let forked = self
            .client
            .repos(&repo.owner, &repo.repo)
            .create_fork()
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(repo_data_from_model(forked))
    }

    async fn get_commit_message(&self, repo: &RepoId, sha: &str) -> Result<String, GitHubApiError> {
        let commit: RawCommit = self
            .client
            .get(
                format!("/repos/{}/{}/commits/{}", repo.owner, repo.repo, sha),
                None::<&()>,
            )
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(commit.commit.message)
    }
}
