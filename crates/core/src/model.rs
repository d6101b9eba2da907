//! Domain types shared across the workspace.
//!
//! A [`Source`] is one external ecosystem we poll. Adapters normalize
//! whatever the upstream API returns into [`ScrapedItem`]s, and every
//! ingestion attempt concludes with a [`RunOutcome`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Source ───────────────────────────────────────────────────────────

/// The fixed set of ecosystems we track.
///
/// A skill's identity is the pair (name, source); the same project
/// appearing under two sources is tracked as two independent skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Github,
    Npm,
    Pypi,
    Huggingface,
}

/// Raised when parsing a source name that is not in the fixed enumeration.
#[derive(Debug, thiserror::Error)]
#[error("unknown source '{0}': must be one of: github, npm, pypi, huggingface")]
pub struct UnknownSource(pub String);

impl Source {
    /// Every tracked source, in a stable order.
    pub const ALL: [Source; 4] = [
        Source::Github,
        Source::Npm,
        Source::Pypi,
        Source::Huggingface,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Github => "github",
            Source::Npm => "npm",
            Source::Pypi => "pypi",
            Source::Huggingface => "huggingface",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Source::Github),
            "npm" => Ok(Source::Npm),
            "pypi" => Ok(Source::Pypi),
            "huggingface" => Ok(Source::Huggingface),
            other => Err(UnknownSource(other.to_string())),
        }
    }
}

// ── Scraped item ─────────────────────────────────────────────────────

/// One normalized item produced by an adapter's fetch.
///
/// `name` and `url` are required; `description` is required but may be
/// empty. Each source supplies only a subset of the metric fields — the
/// rest stay `None` and are stored as NULL, never coerced to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapedItem {
    pub name: String,
    pub description: String,
    pub url: String,
    pub language: Option<String>,
    pub stars: Option<i64>,
    pub forks: Option<i64>,
    pub downloads_day: Option<i64>,
    pub downloads_week: Option<i64>,
    pub downloads_month: Option<i64>,
    pub likes: Option<i64>,
    pub last_activity: Option<DateTime<Utc>>,
}

// ── Run outcome ──────────────────────────────────────────────────────

/// Terminal status of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }
}

/// The result of one ingestion run, threaded from fetch/apply through
/// the run log. Failures are carried as a message here rather than
/// propagated as errors past the run boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub source: Source,
    pub status: RunStatus,
    pub items_scraped: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunOutcome {
    pub fn success(source: Source, items_scraped: usize) -> Self {
        Self {
            source,
            status: RunStatus::Success,
            items_scraped: items_scraped as i64,
            message: None,
        }
    }

    pub fn error(source: Source, message: impl Into<String>) -> Self {
        Self {
            source,
            status: RunStatus::Error,
            items_scraped: 0,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_round_trip() {
        for source in Source::ALL {
            let parsed: Source = source.as_str().parse().unwrap();
            assert_eq!(parsed, source);
        }
    }

    #[test]
    fn test_source_rejects_unknown() {
        let err = "cargo".parse::<Source>().unwrap_err();
        assert!(err.to_string().contains("cargo"));
        assert!(err.to_string().contains("huggingface"));
    }

    #[test]
    fn test_source_serde_lowercase() {
        let json = serde_json::to_string(&Source::Huggingface).unwrap();
        assert_eq!(json, r#""huggingface""#);
        let parsed: Source = serde_json::from_str(r#""npm""#).unwrap();
        assert_eq!(parsed, Source::Npm);
    }

    #[test]
    fn test_outcome_success() {
        let outcome = RunOutcome::success(Source::Npm, 42);
        assert!(outcome.is_success());
        assert_eq!(outcome.items_scraped, 42);
        assert!(outcome.message.is_none());
    }

    #[test]
    fn test_outcome_error_zero_items() {
        let outcome = RunOutcome::error(Source::Pypi, "connection refused");
        assert!(!outcome.is_success());
        assert_eq!(outcome.items_scraped, 0);
        assert_eq!(outcome.message.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_outcome_serialization_omits_empty_message() {
        let json = serde_json::to_string(&RunOutcome::success(Source::Github, 3)).unwrap();
        assert!(json.contains(r#""status":"success""#));
        assert!(!json.contains("message"));

        let json = serde_json::to_string(&RunOutcome::error(Source::Github, "boom")).unwrap();
        assert!(json.contains(r#""status":"error""#));
        assert!(json.contains("boom"));
    }

    #[test]
    fn test_scraped_item_default_metrics_are_none() {
        let item = ScrapedItem {
            name: "pkg-a".to_string(),
            url: "https://example.com/pkg-a".to_string(),
            ..Default::default()
        };
        assert!(item.stars.is_none());
        assert!(item.downloads_week.is_none());
        assert!(item.last_activity.is_none());
    }
}
