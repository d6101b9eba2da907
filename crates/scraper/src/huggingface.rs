//! Hugging Face Hub models adapter.
//!
//! Pulls the models API twice — once sorted by downloads, once by likes —
//! and normalizes the union. Model cards are free-form, so card fields
//! are read defensively from untyped JSON.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use skillpulse_core::{ScrapedItem, Source};

use crate::client::{parse_datetime, send_with_retry};
use crate::traits::{ScrapeError, Scraper};

const MODELS_URL: &str = "https://huggingface.co/api/models";

/// (sort key, page limit) pairs fetched per run.
const LISTINGS: &[(&str, u32)] = &[("downloads", 50), ("likes", 30)];

/// Model card descriptions are stored at most this many characters.
const DESCRIPTION_MAX_CHARS: usize = 500;

/// Hard ceiling on items returned by one fetch.
const RESULT_CAP: usize = 60;

pub struct HuggingfaceScraper {
    client: reqwest::Client,
    max_retries: u32,
}

// ── API response shapes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Model {
    #[serde(rename = "modelId")]
    model_id: String,
    #[serde(default)]
    downloads: Option<i64>,
    #[serde(default)]
    likes: Option<i64>,
    #[serde(rename = "lastModified", default)]
    last_modified: Option<String>,
    /// Free-form model card; `description` and `language` are read from
    /// it when present but neither has a guaranteed shape.
    #[serde(rename = "cardData", default)]
    card_data: serde_json::Value,
}

impl HuggingfaceScraper {
    pub fn new(client: reqwest::Client, max_retries: u32) -> Self {
        Self {
            client,
            max_retries,
        }
    }

    fn parse_model(model: &Model) -> ScrapedItem {
        let description = model
            .card_data
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        ScrapedItem {
            name: model.model_id.clone(),
            description: truncate_chars(description, DESCRIPTION_MAX_CHARS),
            url: format!("https://huggingface.co/{}", model.model_id),
            language: Some(card_language(&model.card_data)),
            stars: None,
            forks: None,
            downloads_day: None,
            downloads_week: None,
            downloads_month: model.downloads,
            likes: model.likes,
            last_activity: parse_datetime(model.last_modified.as_deref()),
        }
    }
}

#[async_trait]
impl Scraper for HuggingfaceScraper {
    fn source(&self) -> Source {
        Source::Huggingface
    }

    async fn fetch(&self) -> Result<Vec<ScrapedItem>, ScrapeError> {
        let mut results = Vec::new();

        for (sort, limit) in LISTINGS {
            let limit = limit.to_string();
            let request = self.client.get(MODELS_URL).query(&[
                ("sort", *sort),
                ("direction", "-1"),
                ("limit", limit.as_str()),
            ]);

            let response = send_with_retry(request, self.max_retries).await?;
            let models: Vec<Model> = response.json().await?;

            debug!(sort, count = models.len(), "huggingface models page fetched");
            results.extend(models.iter().map(Self::parse_model));
        }

        results.truncate(RESULT_CAP);
        Ok(results)
    }
}

// ── Card helpers ─────────────────────────────────────────────────────

/// Model card `language` is a string, a list of language codes, or
/// absent. Defaults to "Python" — the hub is overwhelmingly Python
/// tooling.
fn card_language(card_data: &serde_json::Value) -> String {
    let value = card_data.get("language");
    let lang = match value {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Array(list)) => list
            .iter()
            .find_map(|v| v.as_str())
            .map(String::from),
        _ => None,
    };
    lang.filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Python".to_string())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn model(value: serde_json::Value) -> Model {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_model_full() {
        let item = HuggingfaceScraper::parse_model(&model(serde_json::json!({
            "modelId": "meta-llama/Llama-3-8B",
            "downloads": 2500000,
            "likes": 18000,
            "lastModified": "2024-04-18T16:00:00.000Z",
            "cardData": { "description": "An 8B parameter model", "language": ["en", "de"] },
        })));

        assert_eq!(item.name, "meta-llama/Llama-3-8B");
        assert_eq!(item.url, "https://huggingface.co/meta-llama/Llama-3-8B");
        assert_eq!(item.downloads_month, Some(2500000));
        assert_eq!(item.likes, Some(18000));
        assert_eq!(item.language.as_deref(), Some("en"));
        assert!(item.last_activity.is_some());
        // the hub never supplies these
        assert!(item.stars.is_none());
        assert!(item.downloads_week.is_none());
    }

    #[test]
    fn test_parse_model_without_card() {
        let item = HuggingfaceScraper::parse_model(&model(serde_json::json!({
            "modelId": "someone/bare-model",
        })));
        assert_eq!(item.description, "");
        assert_eq!(item.language.as_deref(), Some("Python"));
        assert!(item.downloads_month.is_none());
        assert!(item.likes.is_none());
    }

    #[test]
    fn test_card_language_variants() {
        assert_eq!(card_language(&serde_json::json!({ "language": "en" })), "en");
        assert_eq!(card_language(&serde_json::json!({ "language": ["fr", "en"] })), "fr");
        assert_eq!(card_language(&serde_json::json!({ "language": [] })), "Python");
        assert_eq!(card_language(&serde_json::json!({ "language": "" })), "Python");
        assert_eq!(card_language(&serde_json::json!({})), "Python");
        assert_eq!(card_language(&serde_json::Value::Null), "Python");
    }

    #[test]
    fn test_description_truncated() {
        let long = "x".repeat(800);
        let item = HuggingfaceScraper::parse_model(&model(serde_json::json!({
            "modelId": "a/b",
            "cardData": { "description": long },
        })));
        assert_eq!(item.description.chars().count(), DESCRIPTION_MAX_CHARS);
    }

    #[test]
    fn test_truncate_chars_multibyte_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
