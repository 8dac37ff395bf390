//! Paginated listing of an entity's public repositories via the GitHub REST API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::contract::{FetchedPage, PageFetcher, RepositoryDescriptor, RepositoryLister};
use crate::entity::EntityKind;
use crate::error::{ConfigurationError, ListingError};

pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const PAGE_SIZE: u32 = 100;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Hard ceiling on page requests per entity, so a listing that never ends cannot run up
/// an unbounded bill.
pub const MAX_PAGES: u32 = 5000;

/// [`PageFetcher`] backed by a reqwest client with a per-request timeout.
pub struct ReqwestPageFetcher {
    client: Client,
}

impl ReqwestPageFetcher {
    /// A blank token is treated as no token; GitHub answers `Bearer ` with 401.
    pub fn new(token: Option<&str>) -> Result<Self, ConfigurationError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ConfigurationError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("gh-bucket/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(ConfigurationError::HttpClient)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for ReqwestPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, ListingError> {
        let transport = |source: reqwest::Error| ListingError::Transport {
            url: url.to_owned(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport)?;
        Ok(FetchedPage {
            status,
            body: body.to_vec(),
        })
    }
}

/// Lists repositories page by page until GitHub runs out of them.
pub struct GithubLister<F> {
    api_base: String,
    fetcher: F,
    max_pages: u32,
}

impl<F: PageFetcher> GithubLister<F> {
    pub fn new(api_base: impl Into<String>, fetcher: F) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            fetcher,
            max_pages: MAX_PAGES,
        }
    }

    /// `None` for kinds that cannot be listed.
    pub fn base_url(&self, name: &str, kind: &EntityKind) -> Option<String> {
        match kind {
            EntityKind::Organization => Some(format!("{}/orgs/{}/repos", self.api_base, name)),
            EntityKind::User => Some(format!("{}/users/{}/repos", self.api_base, name)),
            EntityKind::Unrecognized(_) => None,
        }
    }
}

#[async_trait]
impl<F: PageFetcher> RepositoryLister for GithubLister<F> {
    async fn list_repositories(
        &self,
        name: &str,
        kind: &EntityKind,
    ) -> Result<Vec<RepositoryDescriptor>, ListingError> {
        let Some(base_url) = self.base_url(name, kind) else {
            debug!(entity = name, ?kind, "Entity kind not listable, nothing to fetch");
            return Ok(Vec::new());
        };

        let mut repos = Vec::new();
        let mut page = 1;
        for _ in 0..self.max_pages {
            let url = format!("{base_url}?per_page={PAGE_SIZE}&page={page}");
            let fetched = self.fetcher.fetch_page(&url).await?;

            // A non-200 page ends the listing, e.g. when the entity no longer exists.
            if fetched.status != StatusCode::OK.as_u16() {
                warn!(
                    entity = name,
                    page,
                    status = fetched.status,
                    "Listing stopped on non-OK status"
                );
                break;
            }
            let page_repos: Vec<RepositoryDescriptor> = serde_json::from_slice(&fetched.body)
                .map_err(|source| ListingError::Decode {
                    url: url.clone(),
                    source,
                })?;
            if page_repos.is_empty() {
                break;
            }
            debug!(entity = name, page, count = page_repos.len(), "Fetched repository page");
            repos.extend(page_repos);
            page += 1;
        }

        info!(entity = name, count = repos.len(), "Listed repositories");
        Ok(repos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockPageFetcher;

    #[test]
    fn base_url_depends_on_kind() {
        let lister = GithubLister::new("https://api.example.com/", MockPageFetcher::new());
        assert_eq!(
            lister.base_url("acme", &EntityKind::Organization).as_deref(),
            Some("https://api.example.com/orgs/acme/repos")
        );
        assert_eq!(
            lister.base_url("octocat", &EntityKind::User).as_deref(),
            Some("https://api.example.com/users/octocat/repos")
        );
        assert_eq!(
            lister.base_url("x", &EntityKind::Unrecognized("TEAM".into())),
            None
        );
    }

    #[tokio::test]
    async fn unrecognized_kind_issues_no_requests() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch_page().never();
        let lister = GithubLister::new(GITHUB_API_URL, fetcher);

        let repos = lister
            .list_repositories("x", &EntityKind::Unrecognized("TEAM".into()))
            .await
            .unwrap();
        assert!(repos.is_empty());
    }

    #[test]
    fn token_that_is_not_a_header_value_is_a_configuration_error() {
        let result = ReqwestPageFetcher::new(Some("bad\ntoken"));
        assert!(
            matches!(result, Err(ConfigurationError::InvalidToken)),
            "expected invalid token error"
        );
    }

    #[test]
    fn blank_tokens_are_ignored() {
        for token in [None, Some(""), Some("   ")] {
            assert!(ReqwestPageFetcher::new(token).is_ok(), "token {token:?}");
        }
    }
}
