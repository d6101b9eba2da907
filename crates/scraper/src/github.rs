//! GitHub repository search adapter.
//!
//! Fans out over a fixed set of topic queries against the repository
//! search API, sorted by stars. An API token is optional — without one
//! the adapter runs unauthenticated at GitHub's lower rate limit.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use skillpulse_core::{ScrapedItem, Source};

use crate::client::{parse_datetime, send_with_retry};
use crate::traits::{ScrapeError, Scraper};

const SEARCH_URL: &str = "https://api.github.com/search/repositories";

/// Topic queries fanned out per fetch, each sorted by stars.
const SEARCH_QUERIES: &[&str] = &[
    "topic:ai language:python",
    "topic:machine-learning language:python",
    "topic:deep-learning language:python",
    "topic:llm language:python",
];

const PER_PAGE: u32 = 50;

/// Hard ceiling on items returned by one fetch.
const RESULT_CAP: usize = 100;

pub struct GithubScraper {
    client: reqwest::Client,
    token: Option<String>,
    max_retries: u32,
}

// ── API response shapes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    name: String,
    owner: Owner,
    html_url: String,
    description: Option<String>,
    language: Option<String>,
    stargazers_count: Option<i64>,
    forks_count: Option<i64>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

impl GithubScraper {
    pub fn new(client: reqwest::Client, token: Option<String>, max_retries: u32) -> Self {
        Self {
            client,
            token,
            max_retries,
        }
    }

    fn parse_repo(repo: &Repo) -> ScrapedItem {
        ScrapedItem {
            name: format!("{}/{}", repo.owner.login, repo.name),
            description: repo.description.clone().unwrap_or_default(),
            url: repo.html_url.clone(),
            language: repo.language.clone(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            downloads_day: None,
            downloads_week: None,
            downloads_month: None,
            likes: None,
            last_activity: parse_datetime(repo.updated_at.as_deref()),
        }
    }
}

#[async_trait]
impl Scraper for GithubScraper {
    fn source(&self) -> Source {
        Source::Github
    }

    async fn fetch(&self) -> Result<Vec<ScrapedItem>, ScrapeError> {
        let mut results = Vec::new();

        let per_page = PER_PAGE.to_string();
        for query in SEARCH_QUERIES {
            let mut request = self
                .client
                .get(SEARCH_URL)
                .header("Accept", "application/vnd.github+json")
                .query(&[
                    ("q", *query),
                    ("sort", "stars"),
                    ("order", "desc"),
                    ("per_page", per_page.as_str()),
                ]);

            if let Some(ref token) = self.token {
                request = request.bearer_auth(token);
            }

            let response = send_with_retry(request, self.max_retries).await?;
            let search: SearchResponse = response.json().await?;

            debug!(query, count = search.items.len(), "github search page fetched");
            results.extend(search.items.iter().map(Self::parse_repo));
        }

        results.truncate(RESULT_CAP);
        Ok(results)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
