mod client;
mod commits;
mod pulls;
mod wire;

pub use client::{Client, ClientOptions, DEFAULT_API_URL, DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_MAX_RATE_LIMIT_WAIT, FetchError};
pub use commits::collect_commits;
pub use pulls::{DEFAULT_LOOKAHEAD_PAGES, collect_pull_requests};
