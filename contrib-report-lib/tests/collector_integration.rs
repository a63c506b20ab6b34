//! End-to-end collection against a mock GitHub API.
//!
//! These tests drive the collector over HTTP with wiremock standing in for GitHub, so
//! they exercise pagination, detail fetches, skipping, and rollups together.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use contrib_report_lib::facts::{
    ActivityWindow, ClientOptions, Collector, CollectorOptions, NoProgress, RepoOutcome, RepoSpec, RetryPolicy, format_timestamp,
};
use core::time::Duration;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn collector(server: &MockServer, page_size: u8) -> Collector {
    let options = CollectorOptions {
        client: ClientOptions {
            base_url: server.uri(),
            retry: RetryPolicy {
                max_retry_attempts: 0,
                base_delay: Duration::from_millis(1),
                request_timeout: Duration::from_secs(5),
            },
            max_concurrent_requests: 4,
            max_rate_limit_wait: Duration::from_millis(50),
        },
        page_size,
        lookahead_pages: 1,
    };

    Collector::new("test-token", options, NoProgress).expect("collector")
}

fn days_ago(now: DateTime<Utc>, days: i64) -> String {
    format_timestamp(now - ChronoDuration::days(days))
}

fn commit_json(server: &MockServer, repo: &str, sha: &str, author: &str, date: &str) -> Value {
    json!({
        "sha": sha,
        "commit": { "author": { "name": author, "date": date }, "message": format!("change {sha}") },
        "html_url": format!("https://github.com/{repo}/commit/{sha}"),
        "url": format!("{}/repos/{repo}/commits/{sha}", server.uri()),
    })
}

fn pull_json(number: u64, author: &str, created_at: &str, closed_at: &str) -> Value {
    json!({
        "number": number,
        "title": format!("PR {number}"),
        "state": "closed",
        "user": { "login": author },
        "head": { "ref": format!("feature-{number}") },
        "base": { "ref": "main" },
        "created_at": created_at,
        "closed_at": closed_at,
    })
}

async fn mount_json(server: &MockServer, url_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_branch_commits(server: &MockServer, repo: &str, branch: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{repo}/commits")))
        .and(query_param("sha", branch))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, repo: &str, sha: &str, additions: u64, deletions: u64, files: usize) {
    mount_json(
        server,
        &format!("/repos/{repo}/commits/{sha}"),
        json!({
            "stats": { "additions": additions, "deletions": deletions, "total": additions + deletions },
            "files": vec![json!({ "filename": "x" }); files],
        }),
    )
    .await;
}

#[tokio::test]
async fn test_commit_on_two_branches_yields_two_rows() {
    let server = MockServer::start().await;
    let now = Utc::now();
    let date = days_ago(now, 2);
    let commit = commit_json(&server, "octo/hello", "abc123", "Alice", &date);

    mount_json(&server, "/repos/octo/hello/branches", json!([{ "name": "main" }, { "name": "dev" }])).await;
    mount_branch_commits(&server, "octo/hello", "main", json!([commit.clone()])).await;
    mount_branch_commits(&server, "octo/hello", "dev", json!([commit])).await;
    mount_detail(&server, "octo/hello", "abc123", 10, 2, 3).await;
    mount_json(&server, "/repos/octo/hello/pulls", json!([])).await;

    let report = collector(&server, 100)
        .collect(vec![RepoSpec::parse("octo/hello").unwrap()], &ActivityWindow::new(now, 4))
        .await;

    assert_eq!(report.commits.len(), 2);
    assert_eq!(report.commits[0].branch, "main");
    assert_eq!(report.commits[1].branch, "dev");
    assert!(report.commits.iter().all(|c| c.sha == "abc123" && c.additions == 10 && c.files_touched == 3));
    assert_eq!(&*report.commits[0].repository, "octo/hello");

    assert_eq!(report.summary.len(), 1);
    assert_eq!(report.summary[0].commits, 2);
    assert_eq!(report.summary[0].additions, 20);
    assert_eq!(report.summary[0].working_days, 1);
}

#[tokio::test]
async fn test_failed_detail_records_zero_stats() {
    let server = MockServer::start().await;
    let now = Utc::now();
    let commit = commit_json(&server, "octo/hello", "def456", "Bob", &days_ago(now, 1));

    mount_json(&server, "/repos/octo/hello/branches", json!([{ "name": "main" }])).await;
    mount_branch_commits(&server, "octo/hello", "main", json!([commit])).await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/commits/def456"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_json(&server, "/repos/octo/hello/pulls", json!([])).await;

    let report = collector(&server, 100)
        .collect(vec![RepoSpec::parse("octo/hello").unwrap()], &ActivityWindow::new(now, 4))
        .await;

    assert_eq!(report.commits.len(), 1);
    assert_eq!(report.commits[0].additions, 0);
    assert_eq!(report.commits[0].deletions, 0);
    assert_eq!(report.commits[0].files_touched, 0);
}

#[tokio::test]
async fn test_pull_request_cutoff_is_inclusive() {
    let server = MockServer::start().await;
    let now = Utc::now();
    let cutoff = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
    let window = ActivityWindow::with_cutoff(cutoff, 4);

    mount_json(&server, "/repos/octo/hello/branches", json!([])).await;
    mount_json(
        &server,
        "/repos/octo/hello/pulls",
        json!([
            pull_json(3, "carol", "2024-05-30T10:00:00Z", &format_timestamp(now)),
            pull_json(2, "dave", "2024-05-20T10:00:00Z", "2024-06-01T00:00:00Z"),
            pull_json(1, "erin", "2024-05-20T10:00:00Z", "2024-05-31T23:59:59Z"),
        ]),
    )
    .await;

    let report = collector(&server, 100)
        .collect(vec![RepoSpec::parse("octo/hello").unwrap()], &window)
        .await;

    let numbers: Vec<u64> = report.pull_requests.iter().map(|pr| pr.number).collect();
    assert_eq!(numbers, vec![3, 2]);
    assert_eq!(report.pull_requests[1].wait_time, 11);
    assert_eq!(report.pull_requests[1].from_branch, "feature-2");
    assert_eq!(report.pull_requests[1].to_branch, "main");
}

#[tokio::test]
async fn test_pull_request_walk_stops_after_lookahead() {
    let server = MockServer::start().await;
    let now = Utc::now();
    let recent = days_ago(now, 1);
    let old_created = days_ago(now, 90);
    let old_closed = days_ago(now, 60);

    mount_json(&server, "/repos/octo/hello/branches", json!([])).await;

    let page2 = format!("<{}/repos/octo/hello/pulls?page=2>; rel=\"next\"", server.uri());
    let page3 = format!("<{}/repos/octo/hello/pulls?page=3>; rel=\"next\"", server.uri());
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/pulls"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([pull_json(9, "zed", &recent, &recent)])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/pulls"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    pull_json(7, "old", &old_created, &old_closed),
                    pull_json(6, "old", &old_created, &old_closed),
                ]))
                .insert_header("link", page3.as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/pulls"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    pull_json(10, "alice", &recent, &recent),
                    pull_json(8, "old", &old_created, &old_closed),
                ]))
                .insert_header("link", page2.as_str()),
        )
        .mount(&server)
        .await;

    let report = collector(&server, 2)
        .collect(vec![RepoSpec::parse("octo/hello").unwrap()], &ActivityWindow::new(now, 4))
        .await;

    let numbers: Vec<u64> = report.pull_requests.iter().map(|pr| pr.number).collect();
    assert_eq!(numbers, vec![10]);
}

#[tokio::test]
async fn test_missing_repository_is_skipped() {
    let server = MockServer::start().await;
    let now = Utc::now();

    Mock::given(method("GET"))
        .and(path("/repos/octo/gone/branches"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_json(&server, "/repos/octo/hello/branches", json!([{ "name": "main" }])).await;
    mount_branch_commits(
        &server,
        "octo/hello",
        "main",
        json!([commit_json(&server, "octo/hello", "abc", "Alice", &days_ago(now, 3))]),
    )
    .await;
    mount_detail(&server, "octo/hello", "abc", 1, 1, 1).await;
    mount_json(&server, "/repos/octo/hello/pulls", json!([])).await;

    let repos = RepoSpec::parse_list("octo/gone,octo/hello").unwrap();
    let report = collector(&server, 100).collect(repos, &ActivityWindow::new(now, 4)).await;

    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes[0].1.is_skipped());
    assert_eq!(
        report.outcomes[1].1,
        RepoOutcome::Collected {
            commits: 1,
            pull_requests: 0,
            authors: 1
        }
    );

    let skipped: Vec<_> = report.skipped().map(|(repo, _)| repo.to_string()).collect();
    assert_eq!(skipped, vec!["octo/gone"]);
    assert!(report.commits.iter().all(|c| &*c.repository == "octo/hello"));
}

#[tokio::test]
async fn test_same_author_in_two_repositories_gets_two_rollups() {
    let server = MockServer::start().await;
    let cutoff = DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z").unwrap().with_timezone(&Utc);
    let window = ActivityWindow::with_cutoff(cutoff, 4);

    let one = [
        ("a1", "2024-06-03T09:00:00Z"),
        ("a2", "2024-06-03T15:00:00Z"),
        ("a3", "2024-06-04T10:00:00Z"),
    ];
    let two = [("b1", "2024-06-05T10:00:00Z")];

    for (repo, commits) in [("octo/one", &one[..]), ("octo/two", &two[..])] {
        mount_json(&server, &format!("/repos/{repo}/branches"), json!([{ "name": "main" }])).await;
        let listing: Vec<Value> = commits
            .iter()
            .map(|(sha, date)| commit_json(&server, repo, sha, "Alice", date))
            .collect();
        mount_branch_commits(&server, repo, "main", Value::Array(listing)).await;
        for (sha, _) in commits {
            mount_detail(&server, repo, sha, 4, 1, 2).await;
        }
    }
    mount_json(
        &server,
        "/repos/octo/one/pulls",
        json!([pull_json(1, "Alice", "2024-06-01T00:00:00Z", "2024-06-02T00:00:00Z")]),
    )
    .await;
    mount_json(&server, "/repos/octo/two/pulls", json!([])).await;

    let repos = RepoSpec::parse_list("octo/one, octo/two").unwrap();
    let report = collector(&server, 100).collect(repos, &window).await;

    assert_eq!(report.summary.len(), 2);
    assert!(report.summary.iter().all(|row| row.author == "Alice"));

    let commits: Vec<u64> = report.summary.iter().map(|row| row.commits).collect();
    let working_days: Vec<u64> = report.summary.iter().map(|row| row.working_days).collect();
    let prs: Vec<u64> = report.summary.iter().map(|row| row.prs).collect();
    assert_eq!(commits, vec![3, 1]);
    assert_eq!(working_days, vec![2, 1]);
    assert_eq!(prs, vec![1, 0]);
    assert_eq!(report.collected().count(), 2);
}
