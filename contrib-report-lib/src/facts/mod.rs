//! Collection of contribution activity from GitHub
//!
//! This module gathers the raw facts a report is built from: the commits on every branch
//! of a repository, with per-commit line statistics, and the pull requests closed within
//! the [`ActivityWindow`].
//!
//! # Implementation Model
//!
//! The [`Collector`] walks repositories one after another. For each one the commit and
//! pull request collectors in [`hosting`] run side by side, sharing one API client whose
//! throttler bounds the number of requests in flight and pauses everyone when a rate limit
//! is hit. Results are gathered in input order, so a run's output never depends on which
//! request finished first.
//!
//! A repository that cannot be read becomes a [`RepoOutcome::Skipped`] entry in the
//! [`ActivityReport`] rather than an error; individual bad records are dropped with a
//! warning.

mod activity_report;
mod activity_window;
mod collector;
pub(crate) mod hosting;
mod progress;
mod records;
mod repo_spec;
mod request_tracker;
pub(crate) mod resilient_http;
mod throttler;

pub use activity_report::{ActivityReport, RepoOutcome};
pub use activity_window::ActivityWindow;
pub use collector::{Collector, CollectorOptions};
pub use hosting::{ClientOptions, FetchError};
pub use progress::{NoProgress, Progress};
pub use records::{CommitRecord, CommitStats, PullRequestRecord, TIMESTAMP_FORMAT, format_timestamp, parse_timestamp};
pub use repo_spec::RepoSpec;
pub use resilient_http::RetryPolicy;

#[cfg(debug_assertions)]
pub use request_tracker::RequestTracker;
