use crate::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use ohno::{IntoAppError, app_err};
use std::sync::Arc;

/// Timestamp layout used by the API and by the report.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse an API timestamp.
///
/// The fixed `Z` layout is expected; RFC 3339 with an explicit offset is also accepted
/// and normalized to UTC.
pub fn parse_timestamp(field: &str, value: Option<&str>) -> Result<DateTime<Utc>> {
    let value = value.ok_or_else(|| app_err!("missing '{field}' timestamp"))?;

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return Ok(naive.and_utc());
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .into_app_err_with(|| format!("malformed '{field}' timestamp '{value}'"))
}

/// Render a timestamp the way the report shows it.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Line statistics of one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub additions: u64,
    pub deletions: u64,
    pub files_touched: u64,
}

/// One commit as seen on one branch.
///
/// A commit reachable from several branches yields one record per branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub sha: String,
    pub author: String,
    pub message: String,
    pub additions: u64,
    pub deletions: u64,
    pub files_touched: u64,
    pub date: DateTime<Utc>,
    pub branch: String,
    pub repository: Arc<str>,
    pub url: String,
}

/// One closed pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub from_branch: String,
    pub to_branch: String,
    pub additions: u64,
    pub deletions: u64,
    pub created_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    /// Whole days between creation and close, truncated.
    pub wait_time: i64,
}

/// Whole days between two instants, truncated toward zero.
///
/// Fails when `closed` precedes `created`.
pub fn wait_days(created: DateTime<Utc>, closed: DateTime<Utc>) -> Result<i64> {
    if closed < created {
        return Err(app_err!(
            "closed at {} before it was created at {}",
            format_timestamp(closed),
            format_timestamp(created)
        ));
    }

    Ok((closed - created).num_days())
}
