//! PyPI adapter.
//!
//! PyPI has no public search API, so package names are scraped from the
//! search page HTML, then each package's JSON metadata and pypistats
//! download counts are fetched. Failures narrow in scope: a failed
//! search query is skipped, a failed package lookup drops that package,
//! a failed stats lookup leaves the download fields `None`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use skillpulse_core::{ScrapedItem, Source};

use crate::client::{parse_datetime, send_with_retry};
use crate::traits::{ScrapeError, Scraper};

const SEARCH_URL: &str = "https://pypi.org/search/";

const SEARCH_QUERIES: &[&str] = &["tensorflow", "pytorch", "scikit-learn", "transformers", "openai"];

/// Packages taken from each search query's result page.
const NAMES_PER_QUERY: usize = 10;

/// Hard ceiling on items returned by one fetch.
const RESULT_CAP: usize = 50;

pub struct PypiScraper {
    client: reqwest::Client,
    max_retries: u32,
}

// ── API response shapes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    info: PackageInfo,
    /// Map of version -> list of release files; kept untyped since only
    /// the upload_time of the first file per release is read.
    #[serde(default)]
    releases: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PackageInfo {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    project_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    data: StatsData,
}

#[derive(Debug, Default, Deserialize)]
struct StatsData {
    #[serde(default)]
    last_day: Option<i64>,
    #[serde(default)]
    last_week: Option<i64>,
    #[serde(default)]
    last_month: Option<i64>,
}

impl PypiScraper {
    pub fn new(client: reqwest::Client, max_retries: u32) -> Self {
        Self {
            client,
            max_retries,
        }
    }

    /// Recent download counts from pypistats. Degrades to all-`None` on
    /// any failure.
    async fn recent_downloads(&self, name: &str) -> StatsData {
        let url = format!("https://pypistats.org/api/packages/{}/recent", name);
        match send_with_retry(self.client.get(&url), 0).await {
            Ok(response) => match response.json::<StatsResponse>().await {
                Ok(stats) => stats.data,
                Err(e) => {
                    debug!(package = name, error = %e, "pypistats parse failed");
                    StatsData::default()
                }
            },
            Err(e) => {
                debug!(package = name, error = %e, "pypistats lookup failed");
                StatsData::default()
            }
        }
    }

    async fn fetch_package(&self, name: &str) -> Result<ScrapedItem, ScrapeError> {
        let metadata_url = format!("https://pypi.org/pypi/{}/json", name);
        let response = send_with_retry(self.client.get(&metadata_url), self.max_retries).await?;
        let metadata: MetadataResponse = response.json().await?;

        let stats = self.recent_downloads(name).await;

        Ok(ScrapedItem {
            name: name.to_string(),
            description: metadata.info.summary.clone().unwrap_or_default(),
            url: metadata
                .info
                .project_url
                .clone()
                .unwrap_or_else(|| format!("https://pypi.org/project/{}/", name)),
            language: Some("Python".to_string()),
            stars: None,
            forks: None,
            downloads_day: stats.last_day,
            downloads_week: stats.last_week,
            downloads_month: stats.last_month,
            likes: None,
            last_activity: parse_datetime(latest_upload_time(&metadata.releases).as_deref()),
        })
    }
}

#[async_trait]
impl Scraper for PypiScraper {
    fn source(&self) -> Source {
        Source::Pypi
    }

    async fn fetch(&self) -> Result<Vec<ScrapedItem>, ScrapeError> {
        let mut results = Vec::new();

        for query in SEARCH_QUERIES {
            let request = self.client.get(SEARCH_URL).query(&[("q", *query)]);
            let html = match send_with_retry(request, self.max_retries).await {
                Ok(response) => response.text().await?,
                Err(ScrapeError::Status { status, url }) => {
                    // pypi intermittently rate-limits the search page;
                    // skip the query rather than fail the whole fetch
                    warn!(query, status, url = %url, "pypi search query skipped");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let names = extract_package_names(&html);
            debug!(query, count = names.len(), "pypi search page scraped");

            for name in names.iter().take(NAMES_PER_QUERY) {
                match self.fetch_package(name).await {
                    Ok(item) => results.push(item),
                    Err(e) => warn!(package = %name, error = %e, "pypi package lookup skipped"),
                }
            }
        }

        results.truncate(RESULT_CAP);
        Ok(results)
    }
}

// ── HTML / metadata extraction ───────────────────────────────────────

/// Pull package names out of the search result page.
///
/// Matches the `package-snippet` anchor markup; resilient to surrounding
/// markup changes as long as the href shape `/project/<name>/` holds.
fn extract_package_names(html: &str) -> Vec<String> {
    const HREF_PREFIX: &str = "href=\"/project/";

    let mut names = Vec::new();
    for line in html.lines() {
        if !line.contains("<a class=\"package-snippet\"") {
            continue;
        }
        if let Some(start) = line.find(HREF_PREFIX) {
            let rest = &line[start + HREF_PREFIX.len()..];
            if let Some(end) = rest.find('/') {
                names.push(rest[..end].to_string());
            }
        }
    }
    names
}

/// Latest release upload time across all releases (first file per
/// release, lexicographic max — upload times are ISO 8601).
fn latest_upload_time(releases: &serde_json::Value) -> Option<String> {
    releases
        .as_object()?
        .values()
        .filter_map(|files| {
            files
                .as_array()?
                .first()?
                .get("upload_time")?
                .as_str()
                .map(String::from)
        })
        .max()
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_package_names() {
        let html = r#"
<ul>
  <li><a class="package-snippet" href="/project/tensorflow/">tensorflow</a></li>
  <li><a class="package-snippet" href="/project/keras/">keras</a></li>
  <li><a class="other" href="/project/ignored/">ignored</a></li>
</ul>"#;
        assert_eq!(extract_package_names(html), vec!["tensorflow", "keras"]);
    }

    #[test]
    fn test_extract_package_names_empty_page() {
        assert!(extract_package_names("<html><body>no results</body></html>").is_empty());
    }

    #[test]
    fn test_latest_upload_time_picks_max() {
        let releases = serde_json::json!({
            "1.0.0": [{ "upload_time": "2023-01-01T00:00:00" }],
            "2.0.0": [{ "upload_time": "2024-03-10T09:30:00" }],
            "1.5.0": [{ "upload_time": "2023-07-15T12:00:00" }],
        });
        assert_eq!(
            latest_upload_time(&releases).as_deref(),
            Some("2024-03-10T09:30:00")
        );
    }

    #[test]
    fn test_latest_upload_time_skips_empty_releases() {
        let releases = serde_json::json!({
            "0.1.0": [],
            "0.2.0": [{ "upload_time": "2022-05-01T10:00:00" }],
        });
        assert_eq!(
            latest_upload_time(&releases).as_deref(),
            Some("2022-05-01T10:00:00")
        );
        assert!(latest_upload_time(&serde_json::json!({})).is_none());
        assert!(latest_upload_time(&serde_json::Value::Null).is_none());
    }

    #[test]
    fn test_stats_data_defaults_to_null_not_zero() {
        let stats = StatsData::default();
        assert_eq!(stats.last_day, None);
        assert_eq!(stats.last_week, None);
        assert_eq!(stats.last_month, None);
    }

    #[test]
    fn test_stats_response_parse() {
        let stats: StatsResponse = serde_json::from_value(serde_json::json!({
            "data": { "last_day": 1200, "last_week": 8400, "last_month": 36000 },
            "package": "tensorflow",
            "type": "recent_downloads",
        }))
        .unwrap();
        assert_eq!(stats.data.last_week, Some(8400));
    }
}
