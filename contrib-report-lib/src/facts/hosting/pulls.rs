use super::client::{Client, FetchError};
use super::wire::PullRequest;
use crate::Result;
use crate::facts::activity_window::ActivityWindow;
use crate::facts::records::{PullRequestRecord, parse_timestamp, wait_days};
use crate::facts::repo_spec::RepoSpec;
use crate::facts::request_tracker::TrackedTopic;
use core::pin::pin;
use futures_util::TryStreamExt;
use ohno::{IntoAppError, app_err};

const LOG_TARGET: &str = "   hosting";

/// Default number of extra listing pages read past the first out-of-window pull request.
pub const DEFAULT_LOOKAHEAD_PAGES: u32 = 1;

/// What one listing entry turned out to be.
enum Classified {
    InWindow(PullRequestRecord),
    OutOfWindow,
    Dropped,
}

/// Collect closed pull requests of `repo` whose close time falls inside the window.
///
/// The listing is sorted by update time, which only approximates close time, so the walk
/// does not stop at the first out-of-window entry. It keeps reading up to
/// `lookahead_pages * page_size` further entries, and any in-window entry found on the way
/// restarts that allowance.
pub async fn collect_pull_requests(
    client: &Client,
    repo: &RepoSpec,
    window: &ActivityWindow,
    page_size: u8,
    lookahead_pages: u32,
) -> Result<Vec<PullRequestRecord>, FetchError> {
    let url = format!(
        "repos/{}/{}/pulls?state=closed&sort=updated&direction=desc&per_page={page_size}",
        repo.owner(),
        repo.repo()
    );

    let budget = u64::from(lookahead_pages) * u64::from(page_size);
    let mut remaining: Option<u64> = None;
    let mut records = Vec::new();
    let mut listing = pin!(client.paginate(&url, TrackedTopic::Pulls));

    while let Some(value) = listing.try_next().await? {
        match classify(value, window) {
            Classified::InWindow(record) => {
                records.push(record);
                remaining = None;
            }
            Classified::OutOfWindow => remaining = Some(remaining.map_or(budget, |n| n.saturating_sub(1))),
            Classified::Dropped => remaining = remaining.map(|n| n.saturating_sub(1)),
        }

        if remaining == Some(0) {
            log::debug!(target: LOG_TARGET, "Stopped reading pull requests of '{repo}' past the window");
            break;
        }
    }

    log::debug!(target: LOG_TARGET, "Found {} closed pull request(s) in the window for '{repo}'", records.len());
    Ok(records)
}

fn classify(value: serde_json::Value, window: &ActivityWindow) -> Classified {
    match build_record(value) {
        Ok(Some(record)) if window.contains(record.closed_at) => Classified::InWindow(record),
        Ok(Some(_)) => Classified::OutOfWindow,
        Ok(None) => Classified::Dropped,
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Dropping pull request: {e:#}");
            Classified::Dropped
        }
    }
}

/// Build a record from one listing entry. Entries that are not closed yield `None`.
fn build_record(value: serde_json::Value) -> Result<Option<PullRequestRecord>> {
    let pr: PullRequest = serde_json::from_value(value).into_app_err("malformed pull request")?;

    if pr.state.as_deref().is_some_and(|state| state != "closed") {
        log::debug!(target: LOG_TARGET, "Ignoring pull request #{} in state '{}'", pr.number, pr.state.as_deref().unwrap_or_default());
        return Ok(None);
    }

    let author = pr.user.ok_or_else(|| app_err!("pull request #{} has no user", pr.number))?.login;
    let created_at = parse_timestamp("created_at", pr.created_at.as_deref())?;
    let closed_at = parse_timestamp("closed_at", pr.closed_at.as_deref())?;
    let wait_time = wait_days(created_at, closed_at).map_err(|e| app_err!("pull request #{}: {e}", pr.number))?;

    Ok(Some(PullRequestRecord {
        number: pr.number,
        title: pr.title,
        author,
        from_branch: pr.head.name,
        to_branch: pr.base.name,
        additions: pr.additions.unwrap_or(0),
        deletions: pr.deletions.unwrap_or(0),
        created_at,
        closed_at,
        wait_time,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn pr_json(number: u64, created_at: &str, closed_at: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "number": number,
            "title": format!("PR {number}"),
            "state": "closed",
            "user": { "login": "bob" },
            "head": { "ref": "feature" },
            "base": { "ref": "main" },
            "created_at": created_at,
            "closed_at": closed_at,
        })
    }

    fn window() -> ActivityWindow {
        ActivityWindow::with_cutoff(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 4)
    }

    #[test]
    fn test_build_record() {
        let record = build_record(pr_json(1, "2024-01-01T00:00:00Z", Some("2024-01-03T12:00:00Z")))
            .unwrap()
            .unwrap();
        assert_eq!(record.number, 1);
        assert_eq!(record.author, "bob");
        assert_eq!(record.from_branch, "feature");
        assert_eq!(record.to_branch, "main");
        assert_eq!(record.wait_time, 2);
        assert_eq!(record.additions, 0);
        assert_eq!(record.deletions, 0);
    }

    #[test]
    fn test_build_record_wait_time_truncates_to_whole_days() {
        let record = build_record(pr_json(4, "2024-01-01T00:00:00Z", Some("2024-01-05T12:00:00Z")))
            .unwrap()
            .unwrap();
        assert_eq!(record.wait_time, 4);
    }

    #[test]
    fn test_open_pull_request_is_ignored() {
        let mut value = pr_json(1, "2024-01-01T00:00:00Z", None);
        value["state"] = serde_json::json!("open");
        assert!(build_record(value).unwrap().is_none());
    }

    #[test]
    fn test_missing_closed_at_is_an_error() {
        assert!(build_record(pr_json(1, "2024-01-01T00:00:00Z", None)).is_err());
    }

    #[test]
    fn test_closed_before_created_is_an_error() {
        assert!(build_record(pr_json(1, "2024-01-05T00:00:00Z", Some("2024-01-04T00:00:00Z"))).is_err());
    }

    #[test]
    fn test_classify_boundary_is_inclusive() {
        let at_cutoff = pr_json(1, "2023-12-20T00:00:00Z", Some("2024-01-01T00:00:00Z"));
        assert!(matches!(classify(at_cutoff, &window()), Classified::InWindow(_)));

        let before_cutoff = pr_json(2, "2023-12-20T00:00:00Z", Some("2023-12-31T23:59:59Z"));
        assert!(matches!(classify(before_cutoff, &window()), Classified::OutOfWindow));
    }

    #[test]
    fn test_classify_malformed_is_dropped() {
        assert!(matches!(classify(serde_json::json!({ "number": 3 }), &window()), Classified::Dropped));
    }
}
