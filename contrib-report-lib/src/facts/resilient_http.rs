//! Resilient HTTP GET using retry and timeout middleware.
//!
//! Transient failures (network errors, timeouts, 5xx, 429, and secondary rate limits that
//! carry a `Retry-After` header) are retried by a [`seatbelt`] stack so callers only see the
//! final outcome.

use crate::Result;
use core::time::Duration;
use layered::{Execute, Service, Stack};
use ohno::app_err;
use seatbelt::retry::{Backoff, Retry};
use seatbelt::timeout::Timeout;
use seatbelt::{RecoveryInfo, ResilienceContext};
use tick::Clock;

/// Default timeout for a single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default retry attempts (on top of the original request).
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between retries.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Delay used for a 429 that carries no `Retry-After`.
const DEFAULT_TOO_MANY_REQUESTS_DELAY: Duration = Duration::from_secs(5);

/// How hard to try before giving up on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retry_attempts: u32,
    pub base_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            base_delay: RETRY_BASE_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Parse the `Retry-After` header value as seconds.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|h| h.to_str().ok())?
        .trim()
        .parse::<u64>()
        .ok()
}

/// Classify an HTTP response for retry purposes.
fn should_retry_response(result: &Result<reqwest::Response>) -> RecoveryInfo {
    match result {
        // Network / connection errors and timeouts are always transient.
        Err(_) => RecoveryInfo::retry(),

        Ok(resp) if resp.status().is_server_error() => RecoveryInfo::retry(),

        // Rate-limited (429): honor Retry-After if present.
        Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => RecoveryInfo::retry().delay(
            parse_retry_after(resp.headers()).map_or(DEFAULT_TOO_MANY_REQUESTS_DELAY, Duration::from_secs),
        ),

        // Secondary rate limit (403 with Retry-After). A bare 403 is left to the caller.
        Ok(resp) if resp.status() == reqwest::StatusCode::FORBIDDEN => parse_retry_after(resp.headers())
            .map_or_else(RecoveryInfo::never, |delay| RecoveryInfo::retry().delay(Duration::from_secs(delay))),

        _ => RecoveryInfo::never(),
    }
}

/// Send an HTTP GET request with automatic retry and timeout.
///
/// After the retry budget is spent the last outcome is returned as-is, so a persistent
/// 5xx comes back as an `Ok` response with that status.
pub async fn resilient_get(client: &reqwest::Client, url: &str, policy: &RetryPolicy) -> Result<reqwest::Response> {
    let clock = Clock::new_tokio();
    let context = ResilienceContext::new(&clock).name("github_get");

    let client = client.clone();
    let service = (
        Retry::layer("retry", &context)
            .clone_input()
            .recovery_with(|result: &Result<reqwest::Response>, _| should_retry_response(result))
            .max_retry_attempts(policy.max_retry_attempts)
            .base_delay(policy.base_delay)
            .backoff(Backoff::Exponential)
            .on_retry(|_output, args| {
                log::debug!(
                    "retrying HTTP GET (attempt {}, delay {}ms)",
                    args.attempt().index() + 1,
                    args.retry_delay().as_millis(),
                );
            }),
        Timeout::layer("timeout", &context)
            .timeout_error(|_| app_err!("HTTP request timed out"))
            .timeout(policy.request_timeout),
        Execute::new(move |url: String| {
            let client = client.clone();
            async move { client.get(&url).send().await.map_err(ohno::AppError::from) }
        }),
    )
        .into_service();

    service.execute(url.to_string()).await
}
