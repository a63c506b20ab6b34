use super::records::{CommitRecord, PullRequestRecord};
use super::repo_spec::RepoSpec;
use crate::rollup::AuthorRollup;

/// What happened to one repository during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    /// Data was collected; the counts are the rows this repository contributed.
    Collected {
        commits: usize,
        pull_requests: usize,
        authors: usize,
    },

    /// The repository contributed no rows.
    Skipped { reason: String },
}

impl RepoOutcome {
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Everything a run collected, concatenated across repositories in input order.
#[derive(Debug, Clone, Default)]
pub struct ActivityReport {
    pub commits: Vec<CommitRecord>,
    pub pull_requests: Vec<PullRequestRecord>,
    pub summary: Vec<AuthorRollup>,
    pub outcomes: Vec<(RepoSpec, RepoOutcome)>,
}

impl ActivityReport {
    /// Repositories that produced data.
    pub fn collected(&self) -> impl Iterator<Item = &RepoSpec> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_skipped())
            .map(|(repo, _)| repo)
    }

    /// Repositories that were skipped, with the reason.
    pub fn skipped(&self) -> impl Iterator<Item = (&RepoSpec, &str)> {
        self.outcomes.iter().filter_map(|(repo, outcome)| match outcome {
            RepoOutcome::Skipped { reason } => Some((repo, reason.as_str())),
            RepoOutcome::Collected { .. } => None,
        })
    }
}
