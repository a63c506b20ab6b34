use crate::Result;
use crate::facts::{ClientOptions, CollectorOptions, RetryPolicy};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "contrib.toml";

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the GitHub REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Items requested per listing page (1..=100)
    #[serde(default = "default_page_size")]
    pub page_size: u8,

    /// Upper bound on API requests in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Extra pull request pages read after the first one closed before the window
    #[serde(default = "default_lookahead_pages")]
    pub pull_request_lookahead_pages: u32,

    /// Retries for transient HTTP failures
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Timeout for a single HTTP request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Longest single wait for a rate limit to reset
    #[serde(default = "default_max_rate_limit_wait", with = "humantime_serde")]
    pub max_rate_limit_wait: Duration,
}

fn default_api_url() -> String {
    crate::facts::hosting::DEFAULT_API_URL.to_string()
}

const fn default_page_size() -> u8 {
    100
}

const fn default_max_concurrent_requests() -> usize {
    crate::facts::hosting::DEFAULT_MAX_CONCURRENT_REQUESTS
}

const fn default_lookahead_pages() -> u32 {
    crate::facts::hosting::DEFAULT_LOOKAHEAD_PAGES
}

const fn default_max_retry_attempts() -> u32 {
    crate::facts::resilient_http::DEFAULT_MAX_RETRY_ATTEMPTS
}

const fn default_request_timeout() -> Duration {
    crate::facts::resilient_http::DEFAULT_REQUEST_TIMEOUT
}

const fn default_max_rate_limit_wait() -> Duration {
    crate::facts::hosting::DEFAULT_MAX_RATE_LIMIT_WAIT
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `contrib.toml` in `base_dir` is used when present.
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading contrib-report configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("No '{path}' found, using the default configuration");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading contrib-report configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate().map_err(|e| app_err!("invalid configuration file '{final_path}': {e}"))?;

        log::debug!("Loaded configuration from '{final_path}'");
        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.page_size) {
            return Err(app_err!("page_size must be between 1 and 100, got {}", self.page_size));
        }

        if self.max_concurrent_requests == 0 {
            return Err(app_err!("max_concurrent_requests must be at least 1"));
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(app_err!("api_url must be an http(s) URL, got '{}'", self.api_url));
        }

        if url::Url::parse(&self.api_url).is_err() {
            return Err(app_err!("api_url is not a valid URL: '{}'", self.api_url));
        }

        if self.request_timeout.is_zero() {
            return Err(app_err!("request_timeout must be greater than zero"));
        }

        Ok(())
    }

    /// Settings for a collection run derived from this configuration.
    #[must_use]
    pub fn collector_options(&self) -> CollectorOptions {
        CollectorOptions {
            client: ClientOptions {
                base_url: self.api_url.clone(),
                retry: RetryPolicy {
                    max_retry_attempts: self.max_retry_attempts,
                    request_timeout: self.request_timeout,
                    ..RetryPolicy::default()
                },
                max_concurrent_requests: self.max_concurrent_requests,
                max_rate_limit_wait: self.max_rate_limit_wait,
            },
            page_size: self.page_size,
            lookahead_pages: self.pull_request_lookahead_pages,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
