//! Source adapters for skillpulse.
//!
//! Each adapter implements the [`Scraper`] contract — fetch and
//! normalize one ecosystem's popularity data — behind a shared HTTP
//! client with bounded timeouts and retries. Adapters never touch
//! storage.

use std::collections::HashMap;
use std::sync::Arc;

use skillpulse_core::config::ScrapeConfig;
use skillpulse_core::Source;

pub mod client;
pub mod github;
pub mod huggingface;
pub mod npm;
pub mod pypi;
pub mod traits;

pub use traits::{ScrapeError, Scraper};

/// Build one adapter per tracked source, sharing a single pooled HTTP
/// client. Missing credentials degrade the affected adapter, never fail
/// construction.
pub fn build_registry(config: &ScrapeConfig) -> HashMap<Source, Arc<dyn Scraper>> {
    let http = client::http_client(config.request_timeout_secs);
    let retries = config.max_retries;

    let mut registry: HashMap<Source, Arc<dyn Scraper>> = HashMap::new();
    registry.insert(
        Source::Github,
        Arc::new(github::GithubScraper::new(
            http.clone(),
            config.github_token.clone(),
            retries,
        )),
    );
    registry.insert(Source::Npm, Arc::new(npm::NpmScraper::new(http.clone(), retries)));
    registry.insert(Source::Pypi, Arc::new(pypi::PypiScraper::new(http.clone(), retries)));
    registry.insert(
        Source::Huggingface,
        Arc::new(huggingface::HuggingfaceScraper::new(http, retries)),
    );
    registry
}

// ── Tests ────────────────────────────────────────────────────────────
