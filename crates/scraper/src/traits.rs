//! Scraper trait definition and shared error types.

use async_trait::async_trait;

use skillpulse_core::{ScrapedItem, Source};

/// Errors that can occur while fetching from an upstream ecosystem.
///
/// Missing optional sub-fields (a secondary downloads lookup, an absent
/// description) are NOT errors — they degrade to `None` fields on the
/// returned items. A `ScrapeError` means the fetch as a whole failed.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to parse upstream response: {0}")]
    Parse(String),
}

/// One external ecosystem adapter: fetch + normalize behind a common
/// contract. Adapters perform network calls only; they never touch
/// storage.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Stable identifier for this adapter's ecosystem.
    fn source(&self) -> Source;

    /// Fetch and normalize items from the upstream service.
    ///
    /// May perform many round trips internally (pagination, secondary
    /// lookups) but must apply the adapter's documented result cap and
    /// bounded timeouts/retries so one unreachable upstream cannot stall
    /// its schedule.
    async fn fetch(&self) -> Result<Vec<ScrapedItem>, ScrapeError>;
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = ScrapeError::Status {
            status: 503,
            url: "https://api.github.com/search/repositories".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("api.github.com"));
    }

    #[test]
    fn test_parse_error_message() {
        let err = ScrapeError::Parse("missing field `objects`".to_string());
        assert!(err.to_string().contains("objects"));
    }
}
