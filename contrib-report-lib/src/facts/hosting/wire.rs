//! Response shapes of the GitHub REST endpoints we read.
//!
//! Only the fields we need are modeled. Timestamps stay as strings here and are parsed
//! when records are built, so one bad value drops one record instead of a whole page.

use serde::Deserialize;
use serde::de::IgnoredAny;

/// `GET /repos/{repo}/branches`
#[derive(Debug, Deserialize)]
pub struct Branch {
    pub name: String,
}

/// `GET /repos/{repo}/commits`
#[derive(Debug, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub commit: GitCommit,
    pub html_url: String,
    /// API link to the commit detail.
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct GitCommit {
    pub author: Option<GitActor>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GitActor {
    pub name: Option<String>,
    pub date: Option<String>,
}

/// `GET {commit.url}`
#[derive(Debug, Default, Deserialize)]
pub struct CommitDetail {
    pub stats: Option<DiffStats>,
    pub files: Option<Vec<IgnoredAny>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiffStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

/// `GET /repos/{repo}/pulls`
#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub state: Option<String>,
    pub user: Option<User>,
    pub head: BranchRef,
    pub base: BranchRef,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub name: String,
}
