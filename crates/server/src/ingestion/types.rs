//! Row types for the ingestion tables and the engine error taxonomy.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// ── Database rows ────────────────────────────────────────────────────

/// Row from the `skills` table. Unique per (name, source).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub source: String,
    pub description: String,
    pub url: String,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row from the `skill_metrics` table — one immutable measurement.
///
/// Metric fields mirror the adapter item verbatim: a source that never
/// supplies a field leaves it NULL, and NULL is never read as zero.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MetricsSnapshot {
    pub id: i64,
    pub skill_id: Uuid,
    pub stars: Option<i64>,
    pub forks: Option<i64>,
    pub downloads_day: Option<i64>,
    pub downloads_week: Option<i64>,
    pub downloads_month: Option<i64>,
    pub likes: Option<i64>,
    pub last_activity: Option<DateTime<Utc>>,
    pub recorded_at: DateTime<Utc>,
}

/// Row from the `scrape_runs` table — the audit trail of every attempt.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RunRecord {
    pub id: i64,
    pub source: String,
    pub items_scraped: i32,
    pub status: String,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// A skill joined with its most recent snapshot (all-NULL metric columns
/// when the skill has no snapshots yet).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SkillWithMetrics {
    pub id: Uuid,
    pub name: String,
    pub source: String,
    pub description: String,
    pub url: String,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stars: Option<i64>,
    pub forks: Option<i64>,
    pub downloads_day: Option<i64>,
    pub downloads_week: Option<i64>,
    pub downloads_month: Option<i64>,
    pub likes: Option<i64>,
    pub last_activity: Option<DateTime<Utc>>,
    pub recorded_at: Option<DateTime<Utc>>,
}

// ── Error type ───────────────────────────────────────────────────────

/// Errors from applying one batch of scraped items.
///
/// Either variant aborts and rolls back the whole batch; the scheduler
/// converts it to an error outcome at the run boundary.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid item at index {index}: {reason}")]
    Validation { index: usize, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// ── Tests ────────────────────────────────────────────────────────────
