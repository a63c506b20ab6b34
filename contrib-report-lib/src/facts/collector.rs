use super::activity_report::{ActivityReport, RepoOutcome};
use super::activity_window::ActivityWindow;
use super::hosting::{self, Client, ClientOptions, FetchError};
use super::progress::Progress;
use super::records::{CommitRecord, PullRequestRecord};
use super::repo_spec::RepoSpec;
use super::request_tracker::RequestTracker;
use crate::Result;
use crate::rollup;
use std::sync::Arc;

const LOG_TARGET: &str = " collector";

/// Settings for a collection run.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub client: ClientOptions,
    pub page_size: u8,
    pub lookahead_pages: u32,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            client: ClientOptions::default(),
            page_size: 100,
            lookahead_pages: hosting::DEFAULT_LOOKAHEAD_PAGES,
        }
    }
}

/// Gathers commits and pull requests for a list of repositories.
pub struct Collector {
    client: Client,
    page_size: u8,
    lookahead_pages: u32,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for Collector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collector")
            .field("client", &self.client)
            .field("page_size", &self.page_size)
            .field("lookahead_pages", &self.lookahead_pages)
            .field("progress", &"<dyn Progress>")
            .finish()
    }
}

impl Collector {
    pub fn new(token: &str, options: CollectorOptions, progress: impl Progress + 'static) -> Result<Self> {
        let progress: Arc<dyn Progress> = Arc::new(progress);
        progress.set_phase("Preparing");

        let tracker = RequestTracker::new(&progress);
        let client = Client::new(token, options.client, tracker)?;

        Ok(Self {
            client,
            page_size: options.page_size,
            lookahead_pages: options.lookahead_pages,
            progress,
        })
    }

    /// Collect activity for every repository, one repository at a time, in input order.
    ///
    /// A repository that cannot be read is logged, recorded as skipped, and contributes no rows.
    pub async fn collect(&self, repos: impl IntoIterator<Item = RepoSpec>, window: &ActivityWindow) -> ActivityReport {
        let mut report = ActivityReport::default();

        for repo in repos {
            self.progress.set_phase("Querying");

            let outcome = match self.collect_repo(&repo, window).await {
                Ok((commits, pulls)) => {
                    let summary = rollup::summarize(&commits, &pulls);
                    let outcome = RepoOutcome::Collected {
                        commits: commits.len(),
                        pull_requests: pulls.len(),
                        authors: summary.len(),
                    };

                    log::info!(
                        target: LOG_TARGET,
                        "Collected {} commit(s), {} pull request(s) and {} author(s) from '{repo}'",
                        commits.len(),
                        pulls.len(),
                        summary.len()
                    );

                    report.commits.extend(commits);
                    report.pull_requests.extend(pulls);
                    report.summary.extend(summary);
                    outcome
                }
                Err(e) => {
                    let reason = skip_reason(&e);
                    log::error!(target: LOG_TARGET, "Skipping repository '{repo}': {reason}");
                    RepoOutcome::Skipped { reason }
                }
            };

            report.outcomes.push((repo, outcome));
        }

        log::debug!(target: LOG_TARGET, "Issued {} API request(s) in total", self.client.tracker().total_issued());
        self.progress.done();
        report
    }

    async fn collect_repo(
        &self,
        repo: &RepoSpec,
        window: &ActivityWindow,
    ) -> Result<(Vec<CommitRecord>, Vec<PullRequestRecord>), FetchError> {
        log::info!(target: LOG_TARGET, "Querying GitHub for activity in '{repo}' over {window}");

        let (commits, pulls) = tokio::join!(
            hosting::collect_commits(&self.client, repo, window, self.page_size),
            hosting::collect_pull_requests(&self.client, repo, window, self.page_size, self.lookahead_pages),
        );

        Ok((commits?, pulls?))
    }
}

fn skip_reason(error: &FetchError) -> String {
    match error {
        FetchError::NotFound(_) => "repository not found or not accessible with the given token".to_string(),
        FetchError::RateLimited(_) | FetchError::Failed(_) => error.to_string(),
    }
}
