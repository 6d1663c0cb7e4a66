//! Patch artifact retrieval.
//!
//! The replay engine consumes an already-produced patch file; this module
//! only fetches it from the PR's `patch_url` to a local path.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::{PrNumber, RepoId};

/// Errors from patch retrieval.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The HTTP fetch failed.
    #[error("failed to fetch patch from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Writing the patch file failed.
    #[error("failed to write patch file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Downloads the patch at `url` into `dir`, returning the file path.
///
/// The file is named `{owner}-{repo}-{pr}-{target}.patch` with slashes in
/// the target branch replaced by dashes, so concurrent picks of the same PR
/// to different branches never collide.
pub async fn download_patch(
    url: &str,
    dir: &Path,
    repo: &RepoId,
    source_pr: PrNumber,
    target_branch: &str,
) -> Result<PathBuf, PatchError> {
    let file_name = format!(
        "{}-{}-{}-{}.patch",
        repo.owner,
        repo.repo,
        source_pr.0,
        target_branch.replace('/', "-")
    );
    let path = dir.join(file_name);

    tracing::info!(url, path = %path.display(), "downloading patch");

    let fetch = |source| PatchError::Fetch {
        url: url.to_string(),
        source,
    };
    let response = reqwest::get(url).await.map_err(fetch)?;
    let response = response.error_for_status().map_err(fetch)?;
    let bytes = response.bytes().await.map_err(fetch)?;

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|source| PatchError::Write {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}
