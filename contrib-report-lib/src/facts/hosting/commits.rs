use super::client::{Client, FetchError};
use super::wire::{Branch, CommitDetail, CommitSummary};
use crate::Result;
use crate::facts::activity_window::ActivityWindow;
use crate::facts::records::{CommitRecord, CommitStats, parse_timestamp};
use crate::facts::repo_spec::RepoSpec;
use crate::facts::request_tracker::TrackedTopic;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use futures_util::future::join_all;
use ohno::{IntoAppError, app_err};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::sync::Arc;

const LOG_TARGET: &str = "   hosting";

/// Characters left as-is when a branch name goes into a query string.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// A commit summary that passed validation and is waiting for its detail fetch.
#[derive(Debug)]
struct PendingCommit {
    summary: CommitSummary,
    author: String,
    date: DateTime<Utc>,
}

/// Collect every in-window commit on every branch of `repo`.
///
/// Records come out in branch listing order, then commit listing order within each branch.
/// Failing to list branches fails the whole repository; every later failure only loses
/// the affected branch or the affected commit's line stats.
pub async fn collect_commits(
    client: &Client,
    repo: &RepoSpec,
    window: &ActivityWindow,
    page_size: u8,
) -> Result<Vec<CommitRecord>, FetchError> {
    let branches = list_branches(client, repo, page_size).await?;
    log::debug!(target: LOG_TARGET, "Found {} branch(es) in '{repo}'", branches.len());

    let repository: Arc<str> = repo.to_string().into();
    let per_branch = join_all(
        branches
            .iter()
            .map(|branch| collect_branch(client, repo, &repository, window, branch, page_size)),
    )
    .await;

    Ok(per_branch.into_iter().flatten().collect())
}

async fn list_branches(client: &Client, repo: &RepoSpec, page_size: u8) -> Result<Vec<String>, FetchError> {
    let url = format!("repos/{}/{}/branches?per_page={page_size}", repo.owner(), repo.repo());
    let values: Vec<serde_json::Value> = client.paginate(&url, TrackedTopic::Branches).try_collect().await?;

    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Branch>(value) {
            Ok(branch) => Some(branch.name),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Skipping malformed branch entry in '{repo}': {e}");
                None
            }
        })
        .collect())
}

async fn collect_branch(
    client: &Client,
    repo: &RepoSpec,
    repository: &Arc<str>,
    window: &ActivityWindow,
    branch: &str,
    page_size: u8,
) -> Vec<CommitRecord> {
    let url = format!(
        "repos/{}/{}/commits?sha={}&since={}&per_page={page_size}",
        repo.owner(),
        repo.repo(),
        utf8_percent_encode(branch, QUERY_VALUE),
        utf8_percent_encode(&window.since_param(), QUERY_VALUE),
    );

    let values: Vec<serde_json::Value> = match client.paginate(&url, TrackedTopic::Commits).try_collect().await {
        Ok(values) => values,
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Could not list commits on branch '{branch}' of '{repo}', skipping it: {e}");
            return Vec::new();
        }
    };

    let pending: Vec<PendingCommit> = values
        .into_iter()
        .filter_map(|value| match validate_summary(value) {
            Ok(commit) => Some(commit),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Dropping commit on branch '{branch}' of '{repo}': {e:#}");
                None
            }
        })
        .filter(|commit| window.contains(commit.date))
        .collect();

    log::debug!(target: LOG_TARGET, "Branch '{branch}' of '{repo}' has {} commit(s) in the window", pending.len());

    let stats = join_all(pending.iter().map(|commit| fetch_stats(client, &commit.summary))).await;

    pending
        .into_iter()
        .zip(stats)
        .map(|(commit, stats)| CommitRecord {
            sha: commit.summary.sha,
            author: commit.author,
            message: commit.summary.commit.message,
            additions: stats.additions,
            deletions: stats.deletions,
            files_touched: stats.files_touched,
            date: commit.date,
            branch: branch.to_string(),
            repository: Arc::clone(repository),
            url: commit.summary.html_url,
        })
        .collect()
}

fn validate_summary(value: serde_json::Value) -> Result<PendingCommit> {
    let summary: CommitSummary = serde_json::from_value(value).into_app_err("malformed commit summary")?;

    let author = summary
        .commit
        .author
        .as_ref()
        .ok_or_else(|| app_err!("commit {} has no author", summary.sha))?;

    let name = author
        .name
        .clone()
        .ok_or_else(|| app_err!("commit {} has no author name", summary.sha))?;

    let date = parse_timestamp("commit.author.date", author.date.as_deref())?;

    Ok(PendingCommit {
        summary,
        author: name,
        date,
    })
}

/// Line stats for one commit, or zeros when the detail cannot be fetched.
async fn fetch_stats(client: &Client, summary: &CommitSummary) -> CommitStats {
    match client.get_json::<CommitDetail>(&summary.url, TrackedTopic::Details).await {
        Ok(detail) => {
            let diff = detail.stats.unwrap_or_default();
            CommitStats {
                additions: diff.additions,
                deletions: diff.deletions,
                files_touched: detail.files.map_or(0, |files| files.len() as u64),
            }
        }
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Could not fetch details for commit {}, recording zero line stats: {e}", summary.sha);
            CommitStats::default()
        }
    }
}
