use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{RepositoryError, Result};

/// Source of release tags for a project's upstream repository.
#[async_trait]
pub trait TagSource: Send + Sync {
    /// Returns every tag name of the repository at `upstream_url`.
    async fn list_tags(&self, upstream_url: &str) -> Result<Vec<String>>;
}

/// Lists tags through the GitHub REST API.
pub struct GithubTagSource {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct GithubTag {
    name: String,
}

impl GithubTagSource {
    pub fn new(api_url: &str, timeout: Duration, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("srcrepo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepositoryError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl TagSource for GithubTagSource {
    async fn list_tags(&self, upstream_url: &str) -> Result<Vec<String>> {
        let (owner, repo) = parse_github_repo(upstream_url).ok_or_else(|| {
            RepositoryError::Upstream(format!("not a GitHub repository URL: {upstream_url}"))
        })?;

        let url = format!("{}/repos/{owner}/{repo}/tags?per_page=100", self.api_url);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RepositoryError::Upstream(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RepositoryError::Upstream(format!(
                "GET {url} returned {}",
                response.status()
            )));
        }

        let tags: Vec<GithubTag> = response
            .json()
            .await
            .map_err(|e| RepositoryError::Upstream(e.to_string()))?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }
}

/// Extracts `(owner, repo)` from HTTPS or SSH GitHub URLs.
pub fn parse_github_repo(url: &str) -> Option<(String, String)> {
    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
        .or_else(|| url.strip_prefix("git@github.com:"))?;

    let mut parts = rest.trim_end_matches('/').splitn(3, '/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let repo = parts.next()?.trim_end_matches(".git");
    if repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
