//! Per-author rollups of raw activity.
//!
//! [`summarize`] is a pure fold. Commits are folded first, then pull requests, into
//! accumulators that keep the set of distinct UTC calendar days an author committed on.
//! A single finalize step turns each accumulator into an [`AuthorRollup`], collapsing the
//! day set into a count. Authors are matched by exact name and come out in first-seen order.

use crate::facts::{CommitRecord, PullRequestRecord};
use crate::{HashMap, HashSet};
use chrono::NaiveDate;

/// Contribution totals for one author within one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRollup {
    pub author: String,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
    pub files_touched: u64,
    pub prs: u64,
    pub working_days: u64,
}

#[derive(Debug)]
struct AuthorAccum {
    author: String,
    commits: u64,
    additions: u64,
    deletions: u64,
    files_touched: u64,
    prs: u64,
    days: HashSet<NaiveDate>,
}

impl AuthorAccum {
    fn new(author: &str) -> Self {
        Self {
            author: author.to_string(),
            commits: 0,
            additions: 0,
            deletions: 0,
            files_touched: 0,
            prs: 0,
            days: HashSet::default(),
        }
    }

    fn finalize(self) -> AuthorRollup {
        AuthorRollup {
            author: self.author,
            commits: self.commits,
            additions: self.additions,
            deletions: self.deletions,
            files_touched: self.files_touched,
            prs: self.prs,
            working_days: self.days.len() as u64,
        }
    }
}

#[derive(Debug)]
struct Accumulators {
    by_author: HashMap<String, usize>,
    accums: Vec<AuthorAccum>,
}

impl Accumulators {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            by_author: crate::hash_map_with_capacity(capacity),
            accums: Vec::with_capacity(capacity),
        }
    }

    fn entry(&mut self, author: &str) -> &mut AuthorAccum {
        let index = if let Some(&index) = self.by_author.get(author) {
            index
        } else {
            let index = self.accums.len();
            self.accums.push(AuthorAccum::new(author));
            let _ = self.by_author.insert(author.to_string(), index);
            index
        };

        &mut self.accums[index]
    }
}

/// Fold one repository's commits and pull requests into per-author rollups.
#[must_use]
pub fn summarize(commits: &[CommitRecord], pulls: &[PullRequestRecord]) -> Vec<AuthorRollup> {
    let mut acc = Accumulators::with_capacity(commits.len().min(64));

    for commit in commits {
        let entry = acc.entry(&commit.author);
        entry.commits += 1;
        entry.additions += commit.additions;
        entry.deletions += commit.deletions;
        entry.files_touched += commit.files_touched;
        let _ = entry.days.insert(commit.date.date_naive());
    }

    for pull in pulls {
        acc.entry(&pull.author).prs += 1;
    }

    acc.accums.into_iter().map(AuthorAccum::finalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn commit(author: &str, date: DateTime<Utc>, additions: u64, deletions: u64, files: u64) -> CommitRecord {
        CommitRecord {
            sha: format!("{author}-{date}"),
            author: author.to_string(),
            message: "change".to_string(),
            additions,
            deletions,
            files_touched: files,
            date,
            branch: "main".to_string(),
            repository: Arc::from("o/r"),
            url: "https://github.com/o/r/commit/x".to_string(),
        }
    }

    fn pull(author: &str, number: u64) -> PullRequestRecord {
        PullRequestRecord {
            number,
            title: "pr".to_string(),
            author: author.to_string(),
            from_branch: "feature".to_string(),
            to_branch: "main".to_string(),
            additions: 100,
            deletions: 100,
            created_at: at(1, 0),
            closed_at: at(2, 0),
            wait_time: 1,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(summarize(&[], &[]).is_empty());
    }

    #[test]
    fn test_commit_totals() {
        let commits = vec![commit("alice", at(1, 9), 10, 2, 3), commit("alice", at(2, 9), 5, 1, 1)];
        let rollup = summarize(&commits, &[]);

        assert_eq!(
            rollup,
            vec![AuthorRollup {
                author: "alice".to_string(),
                commits: 2,
                additions: 15,
                deletions: 3,
                files_touched: 4,
                prs: 0,
                working_days: 2,
            }]
        );
    }

    #[test]
    fn test_working_days_counts_distinct_utc_days() {
        let commits = vec![
            commit("alice", at(1, 1), 1, 0, 1),
            commit("alice", at(1, 23), 1, 0, 1),
            commit("alice", at(3, 12), 1, 0, 1),
        ];
        let rollup = summarize(&commits, &[]);
        assert_eq!(rollup[0].working_days, 2);
        assert_eq!(rollup[0].commits, 3);
    }

    #[test]
    fn test_pull_request_only_author_has_zero_commit_metrics() {
        let rollup = summarize(&[commit("alice", at(1, 1), 1, 1, 1)], &[pull("bob", 1), pull("bob", 2)]);

        assert_eq!(rollup.len(), 2);
        assert_eq!(
            rollup[1],
            AuthorRollup {
                author: "bob".to_string(),
                commits: 0,
                additions: 0,
                deletions: 0,
                files_touched: 0,
                prs: 2,
                working_days: 0,
            }
        );
    }

    #[test]
    fn test_pull_request_line_counts_are_not_added() {
        let rollup = summarize(&[commit("alice", at(1, 1), 3, 4, 5)], &[pull("alice", 1)]);
        assert_eq!(rollup[0].additions, 3);
        assert_eq!(rollup[0].deletions, 4);
        assert_eq!(rollup[0].prs, 1);
    }

    #[test]
    fn test_first_seen_order() {
        let commits = vec![
            commit("carol", at(1, 1), 0, 0, 0),
            commit("alice", at(1, 2), 0, 0, 0),
            commit("carol", at(1, 3), 0, 0, 0),
        ];
        let authors: Vec<_> = summarize(&commits, &[pull("bob", 1)])
            .into_iter()
            .map(|r| r.author)
            .collect();
        assert_eq!(authors, vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn test_author_names_are_not_reconciled() {
        let rollup = summarize(&[commit("Alice", at(1, 1), 0, 0, 0)], &[pull("alice", 1)]);
        assert_eq!(rollup.len(), 2);
    }

    #[test]
    fn test_totals_match_inputs() {
        let commits = vec![
            commit("a", at(1, 1), 1, 2, 3),
            commit("b", at(2, 1), 4, 5, 6),
            commit("a", at(3, 1), 7, 8, 9),
        ];
        let pulls = vec![pull("a", 1), pull("c", 2), pull("b", 3)];
        let rollup = summarize(&commits, &pulls);

        assert_eq!(rollup.iter().map(|r| r.commits).sum::<u64>(), 3);
        assert_eq!(rollup.iter().map(|r| r.additions).sum::<u64>(), 12);
        assert_eq!(rollup.iter().map(|r| r.deletions).sum::<u64>(), 15);
        assert_eq!(rollup.iter().map(|r| r.files_touched).sum::<u64>(), 18);
        assert_eq!(rollup.iter().map(|r| r.prs).sum::<u64>(), 3);
    }

    #[test]
    fn test_summarize_is_repeatable() {
        let commits = vec![
            commit("a", at(1, 1), 1, 2, 3),
            commit("b", at(2, 1), 4, 5, 6),
            commit("a", at(1, 5), 7, 8, 9),
        ];
        let pulls = vec![pull("c", 1), pull("a", 2)];

        assert_eq!(summarize(&commits, &pulls), summarize(&commits, &pulls));
    }
}
