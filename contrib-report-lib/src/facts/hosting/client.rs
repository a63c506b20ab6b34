//! GitHub API client
//!
//! Authenticated JSON fetches with rate-limit handling and lazy `Link`-header pagination.

use crate::Result;
use crate::facts::request_tracker::{RequestTracker, TopicStatus, TrackedTopic};
use crate::facts::resilient_http::{RetryPolicy, resilient_get};
use crate::facts::throttler::Throttler;
use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use core::time::Duration;
use futures_util::stream::{self, Stream, TryStreamExt};
use ohno::EnrichableExt;
use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;
use std::sync::Arc;

const LOG_TARGET: &str = "   hosting";

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default number of requests allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 5;

/// Default upper bound on a single rate-limit wait.
pub const DEFAULT_MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(3600);

/// How many times one request waits out a rate limit before giving up.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Reset assumed when a rate-limited response carries no reset header.
const DEFAULT_RATE_LIMIT_RESET_SECS: i64 = 3600;

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a hosting API call
pub enum HostingApiResult<T> {
    /// Request succeeded - contains data and optional rate limit info
    Success(T, Option<RateLimitInfo>),

    /// Rate limited - should retry after reset time
    RateLimited(RateLimitInfo),

    /// The requested resource was not found (404)
    NotFound,

    /// Request failed permanently - should NOT retry
    Failed(ohno::AppError),
}

/// Why a fetch produced no data.
#[derive(Debug, Clone)]
pub enum FetchError {
    /// The resource does not exist, or the token cannot see it.
    NotFound(String),

    /// The rate limit did not lift within the allowed number of waits.
    RateLimited(DateTime<Utc>),

    /// Transport failure, unexpected status, or an undecodable body.
    Failed(Arc<ohno::AppError>),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound(url) => write!(f, "not found: {url}"),
            Self::RateLimited(reset_at) => write!(
                f,
                "rate limit still exhausted (resets at {})",
                reset_at.with_timezone(&chrono::Local).format("%T")
            ),
            Self::Failed(e) => write!(f, "{e:#}"),
        }
    }
}

impl core::error::Error for FetchError {}

/// Tunables for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub retry: RetryPolicy,
    pub max_concurrent_requests: usize,
    pub max_rate_limit_wait: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            retry: RetryPolicy::default(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            max_rate_limit_wait: DEFAULT_MAX_RATE_LIMIT_WAIT,
        }
    }
}

/// GitHub API client
///
/// Clones share the concurrency gate and the request counters.
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    max_rate_limit_wait: Duration,
    throttler: Arc<Throttler>,
    tracker: RequestTracker,
}

impl Client {
    /// Create a new client that authenticates every request with `token`.
    pub fn new(token: &str, options: ClientOptions, tracker: RequestTracker) -> Result<Self> {
        use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};

        let mut auth_val = HeaderValue::from_str(&format!("Bearer {token}"))?;
        auth_val.set_sensitive(true);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(AUTHORIZATION, auth_val);
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        let _ = headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));

        let client = reqwest::Client::builder()
            .user_agent("contrib-report")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            retry: options.retry,
            max_rate_limit_wait: options.max_rate_limit_wait,
            throttler: Throttler::new(options.max_concurrent_requests),
            tracker,
        })
    }

    /// The request counters this client reports into.
    #[must_use]
    pub const fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// Turn a path relative to the API root into an absolute URL. Absolute URLs pass through.
    #[must_use]
    pub fn resolve(&self, url_or_path: &str) -> String {
        if url_or_path.starts_with("http://") || url_or_path.starts_with("https://") {
            url_or_path.to_string()
        } else {
            format!("{}/{}", self.base_url, url_or_path.trim_start_matches('/'))
        }
    }

    /// Make an API call and classify the result
    pub async fn api_call(&self, url: &str) -> HostingApiResult<reqwest::Response> {
        let resp = match resilient_get(&self.client, url, &self.retry).await {
            Ok(r) => r,
            Err(e) => return HostingApiResult::Failed(e),
        };

        // Extract rate limit info from response headers before checking status
        let rate_limit = extract_rate_limit_from_headers(resp.headers());

        let status = resp.status();
        if status.is_success() {
            return HostingApiResult::Success(resp, rate_limit);
        }

        // 429 is always a rate limit; 403 only when the quota is spent
        let status_code = status.as_u16();
        let quota_spent = rate_limit.is_some_and(|rl| rl.remaining == 0);
        if status_code == 429 || (status_code == 403 && quota_spent) {
            let rate_limit = rate_limit.unwrap_or_else(|| RateLimitInfo {
                remaining: 0,
                reset_at: Utc::now() + chrono::Duration::seconds(DEFAULT_RATE_LIMIT_RESET_SECS),
            });
            return HostingApiResult::RateLimited(rate_limit);
        }

        if status_code == 404 {
            return HostingApiResult::NotFound;
        }

        match resp.error_for_status() {
            Ok(resp) => HostingApiResult::Failed(ohno::app_err!("unexpected HTTP status {} from '{}'", resp.status(), resp.url())),
            Err(e) => HostingApiResult::Failed(e.into()),
        }
    }

    /// Fetch one JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, url_or_path: &str, topic: TrackedTopic) -> Result<T, FetchError> {
        let url = self.resolve(url_or_path);
        let resp = self.fetch(&url, topic).await?;
        resp.json::<T>()
            .await
            .map_err(|e| FetchError::Failed(Arc::new(ohno::AppError::from(e).enrich_with(|| format!("decoding response from '{url}'")))))
    }

    /// Lazily walk a paginated collection, yielding one JSON record at a time.
    ///
    /// A page is only requested once the records of the previous page have been consumed,
    /// so a caller that stops early never pays for the remaining pages. The walk ends on a
    /// page without a `rel="next"` link, or on an empty page.
    pub fn paginate(&self, url_or_path: &str, topic: TrackedTopic) -> impl Stream<Item = Result<serde_json::Value, FetchError>> + Send + '_ {
        let first = self.resolve(url_or_path);

        stream::try_unfold(Some(first), move |next| async move {
            let Some(url) = next else {
                return Ok(None);
            };

            let resp = self.fetch(&url, topic).await?;
            let next = next_page_url(resp.headers());
            let items: Vec<serde_json::Value> = resp.json().await.map_err(|e| {
                FetchError::Failed(Arc::new(ohno::AppError::from(e).enrich_with(|| format!("decoding page '{url}'"))))
            })?;

            let next = if items.is_empty() { None } else { next };
            Ok::<_, FetchError>(Some((stream::iter(items.into_iter().map(Ok::<_, FetchError>)), next)))
        })
        .try_flatten()
    }

    /// Issue one GET under a throttler permit, waiting out rate limits a bounded number of times.
    async fn fetch(&self, url: &str, topic: TrackedTopic) -> Result<reqwest::Response, FetchError> {
        let mut rate_limit_waits = 0;
        loop {
            let permit = self.throttler.acquire().await;
            self.tracker.set_topic_status(topic, TopicStatus::Active);
            self.tracker.start_request(topic);
            let result = self.api_call(url).await;
            self.tracker.complete_request(topic);
            drop(permit);

            match result {
                HostingApiResult::Success(resp, rate_limit) => {
                    if let Some(rl) = rate_limit {
                        log::trace!(target: LOG_TARGET, "GitHub API quota: {} remaining after '{url}'", rl.remaining);
                    }
                    return Ok(resp);
                }
                HostingApiResult::NotFound => return Err(FetchError::NotFound(url.to_string())),
                HostingApiResult::Failed(e) => {
                    return Err(FetchError::Failed(Arc::new(e.enrich_with(|| format!("fetching '{url}'")))));
                }
                HostingApiResult::RateLimited(rate_limit) => {
                    if rate_limit_waits >= MAX_RATE_LIMIT_RETRIES {
                        log::warn!(target: LOG_TARGET, "Giving up on '{url}' after {rate_limit_waits} rate limit wait(s)");
                        return Err(FetchError::RateLimited(rate_limit.reset_at));
                    }
                    rate_limit_waits += 1;
                    self.wait_for_reset(rate_limit, topic);
                }
            }
        }
    }

    /// Pause every request on this client until the quota resets, bounded by the configured maximum.
    fn wait_for_reset(&self, rate_limit: RateLimitInfo, topic: TrackedTopic) {
        let now = Utc::now();
        let until_reset = (rate_limit.reset_at - now).to_std().unwrap_or(Duration::ZERO);
        let wait_duration = until_reset.min(self.max_rate_limit_wait);

        if wait_duration.is_zero() {
            return;
        }

        let wait_until = now + chrono::Duration::from_std(wait_duration).unwrap_or_default();
        if self.throttler.pause_for(wait_duration) {
            self.tracker.set_topic_status(topic, TopicStatus::Blocked);
            let formatted_time = wait_until.with_timezone(&chrono::Local).format("%T").to_string();
            log::warn!(target: LOG_TARGET, "Hit GitHub rate limit, waiting until {formatted_time}");
            if !log::log_enabled!(log::Level::Warn) {
                self.tracker
                    .println(&format!("GitHub rate limit exceeded: Waiting until {formatted_time}..."));
            }
        }
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

/// Pull the `rel="next"` target out of a `Link` header.
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| target.trim().trim_start_matches('<').trim_end_matches('>').to_string())
    })
}
