//! Append-only log of ingestion attempts.
//!
//! Every run — scheduled or manual, success or error — produces exactly
//! one row, written once after the attempt concludes. Rows are never
//! mutated afterwards; failures are observable only by reading this log.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use skillpulse_core::RunOutcome;

use super::types::RunRecord;

const RETURNING: &str =
    "id, source, items_scraped, status, error_message, started_at, completed_at";

/// Stateless store for `scrape_runs`.
pub struct RunLogStore;

impl RunLogStore {
    /// Append the record for one concluded attempt.
    pub async fn record(
        pool: &PgPool,
        outcome: &RunOutcome,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<RunRecord, sqlx::Error> {
        sqlx::query_as::<_, RunRecord>(&format!(
            "INSERT INTO scrape_runs (source, items_scraped, status, error_message, started_at, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {RETURNING}",
        ))
        .bind(outcome.source.as_str())
        .bind(outcome.items_scraped as i32)
        .bind(outcome.status.as_str())
        .bind(&outcome.message)
        .bind(started_at)
        .bind(completed_at)
        .fetch_one(pool)
        .await
    }

    /// Most recent runs first, bounded by `limit`.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<RunRecord>, sqlx::Error> {
        sqlx::query_as::<_, RunRecord>(&format!(
            "SELECT {RETURNING}
             FROM scrape_runs
             ORDER BY started_at DESC
             LIMIT $1",
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
