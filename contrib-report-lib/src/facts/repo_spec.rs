use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::{IntoAppError, bail};
use std::sync::Arc;
use url::Url;

/// A repository identifier in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSpec {
    owner: Arc<str>,
    repo: Arc<str>,
}

impl RepoSpec {
    /// Parse `owner/name`, or a web URL such as `https://github.com/owner/name`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains("://") {
            let url = Url::parse(s).into_app_err_with(|| format!("invalid repository URL '{s}'"))?;
            return Self::from_url(&url);
        }

        let mut parts = s.split('/');
        let (Some(owner), Some(repo), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("invalid repository '{s}': expected 'owner/name'");
        };

        Self::from_parts(owner, repo, s)
    }

    fn from_url(url: &Url) -> Result<Self> {
        let path_segments: Vec<_> = url.path_segments().map(Iterator::collect).unwrap_or_default();

        if path_segments.len() < 2 {
            bail!("invalid repository URL format: {url}");
        }

        Self::from_parts(path_segments[0], path_segments[1], url.as_str())
    }

    fn from_parts(owner: &str, repo: &str, original: &str) -> Result<Self> {
        let repo = repo.trim_end_matches(".git");

        if owner.is_empty() || repo.is_empty() {
            bail!("invalid repository '{original}': empty owner or repo name");
        }

        Ok(Self {
            owner: Arc::from(owner),
            repo: Arc::from(repo),
        })
    }

    /// Parse a comma-separated list, skipping empty entries and keeping input order.
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        let repos = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Self::parse)
            .collect::<Result<Vec<_>>>()?;

        if repos.is_empty() {
            bail!("no repositories specified");
        }

        Ok(repos)
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
