//! npm registry search adapter.
//!
//! Searches the public registry for a fixed set of keywords, then looks
//! up last-week download counts per package. The downloads lookup is a
//! secondary call: when it fails the count degrades to `None` rather
//! than aborting the fetch.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use skillpulse_core::{ScrapedItem, Source};

use crate::client::{parse_datetime, send_with_retry};
use crate::traits::{ScrapeError, Scraper};

const SEARCH_URL: &str = "https://registry.npmjs.org/-/v1/search";
const DOWNLOADS_URL: &str = "https://api.npmjs.org/downloads/point/last-week";

const SEARCH_QUERIES: &[&str] = &["ai", "machine-learning", "tensorflow", "openai", "langchain"];

const PAGE_SIZE: u32 = 20;

/// Hard ceiling on items returned by one fetch.
const RESULT_CAP: usize = 50;

pub struct NpmScraper {
    client: reqwest::Client,
    max_retries: u32,
}

// ── API response shapes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    objects: Vec<SearchObject>,
}

#[derive(Debug, Deserialize)]
struct SearchObject {
    package: Package,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    date: Option<PackageDate>,
}

#[derive(Debug, Deserialize)]
struct PackageDate {
    #[serde(default)]
    modified: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadsResponse {
    downloads: i64,
}

impl NpmScraper {
    pub fn new(client: reqwest::Client, max_retries: u32) -> Self {
        Self {
            client,
            max_retries,
        }
    }

    /// Last-week downloads for one package. Degrades to `None` on any
    /// failure — the registry omits counts for scoped or brand-new
    /// packages and that must not fail the item.
    async fn downloads_week(&self, name: &str) -> Option<i64> {
        let url = format!("{}/{}", DOWNLOADS_URL, name);
        let request = self.client.get(&url);
        match send_with_retry(request, 0).await {
            Ok(response) => response
                .json::<DownloadsResponse>()
                .await
                .ok()
                .map(|d| d.downloads),
            Err(e) => {
                debug!(package = name, error = %e, "npm downloads lookup failed");
                None
            }
        }
    }

    fn parse_package(package: &Package, downloads_week: Option<i64>) -> ScrapedItem {
        ScrapedItem {
            name: package.name.clone(),
            description: package.description.clone().unwrap_or_default(),
            url: format!("https://www.npmjs.com/package/{}", package.name),
            language: Some("JavaScript".to_string()),
            stars: None,
            forks: None,
            downloads_day: None,
            downloads_week,
            downloads_month: None,
            likes: None,
            last_activity: parse_datetime(
                package.date.as_ref().and_then(|d| d.modified.as_deref()),
            ),
        }
    }
}

#[async_trait]
impl Scraper for NpmScraper {
    fn source(&self) -> Source {
        Source::Npm
    }

    async fn fetch(&self) -> Result<Vec<ScrapedItem>, ScrapeError> {
        let mut results = Vec::new();

        let size = PAGE_SIZE.to_string();
        for query in SEARCH_QUERIES {
            let request = self.client.get(SEARCH_URL).query(&[
                ("text", *query),
                ("size", size.as_str()),
                ("popularity", "1.0"),
                ("quality", "0.5"),
                ("maintenance", "1.0"),
            ]);

            let response = send_with_retry(request, self.max_retries).await?;
            let search: SearchResponse = response.json().await?;
            debug!(query, count = search.objects.len(), "npm search page fetched");

            for object in &search.objects {
                let downloads = self.downloads_week(&object.package.name).await;
                results.push(Self::parse_package(&object.package, downloads));
            }
        }

        results.truncate(RESULT_CAP);
        Ok(results)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_with_downloads() {
        let package: Package = serde_json::from_value(serde_json::json!({
            "name": "langchain",
            "description": "Composable LLM applications",
            "date": { "modified": "2024-05-20T08:00:00.000Z" },
        }))
        .unwrap();

        let item = NpmScraper::parse_package(&package, Some(120));
        assert_eq!(item.name, "langchain");
        assert_eq!(item.url, "https://www.npmjs.com/package/langchain");
        assert_eq!(item.language.as_deref(), Some("JavaScript"));
        assert_eq!(item.downloads_week, Some(120));
        assert!(item.last_activity.is_some());
        assert!(item.stars.is_none());
    }

    #[test]
    fn test_parse_package_failed_downloads_stays_null() {
        let package: Package = serde_json::from_value(serde_json::json!({
            "name": "@scope/pkg",
        }))
        .unwrap();

        let item = NpmScraper::parse_package(&package, None);
        assert_eq!(item.downloads_week, None);
        assert_eq!(item.description, "");
        assert!(item.last_activity.is_none());
    }

    #[test]
    fn test_search_response_shape() {
        let raw = serde_json::json!({
            "objects": [
                { "package": { "name": "a" } },
                { "package": { "name": "b", "description": "two" } },
            ],
            "total": 2,
        });
        let search: SearchResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(search.objects.len(), 2);
        assert_eq!(search.objects[1].package.description.as_deref(), Some("two"));
    }

    #[test]
    fn test_cap_bounds_query_fanout() {
        assert!(RESULT_CAP <= SEARCH_QUERIES.len() * PAGE_SIZE as usize);
    }
}
