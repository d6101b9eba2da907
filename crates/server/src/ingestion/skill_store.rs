//! Read-side queries over skills and their snapshots.
//!
//! The "current" metrics for a skill are defined as its most recently
//! recorded snapshot, joined laterally per skill.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use skillpulse_core::Source;

use super::types::{MetricsSnapshot, SkillWithMetrics};

/// Sort orders exposed by the skills listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillSort {
    /// Most recently updated skills first.
    #[default]
    Latest,
    /// Highest weekly downloads first.
    Hot,
    /// Highest monthly downloads first.
    Used,
}

impl SkillSort {
    fn order_clause(&self) -> &'static str {
        match self {
            SkillSort::Latest => "s.updated_at DESC",
            SkillSort::Hot => "m.downloads_week DESC NULLS LAST",
            SkillSort::Used => "m.downloads_month DESC NULLS LAST",
        }
    }
}

/// Aggregate counters for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SkillStats {
    pub total_skills: i64,
    pub skills_by_source: HashMap<String, i64>,
    pub last_updated: Option<DateTime<Utc>>,
}

const SELECT_WITH_METRICS: &str = "SELECT s.id, s.name, s.source, s.description, s.url, s.language,
        s.created_at, s.updated_at,
        m.stars, m.forks, m.downloads_day, m.downloads_week,
        m.downloads_month, m.likes, m.last_activity, m.recorded_at
 FROM skills s
 LEFT JOIN LATERAL (
     SELECT * FROM skill_metrics
     WHERE skill_id = s.id
     ORDER BY recorded_at DESC
     LIMIT 1
 ) m ON true";

/// Stateless read store for `skills` / `skill_metrics`.
pub struct SkillStore;

impl SkillStore {
    /// List skills with their latest snapshot, optionally filtered by
    /// source, in the requested order.
    pub async fn list(
        pool: &PgPool,
        sort: SkillSort,
        source: Option<Source>,
        limit: i64,
    ) -> Result<Vec<SkillWithMetrics>, sqlx::Error> {
        let order = sort.order_clause();
        match source {
            Some(source) => {
                sqlx::query_as::<_, SkillWithMetrics>(&format!(
                    "{SELECT_WITH_METRICS} WHERE s.source = $2 ORDER BY {order} LIMIT $1",
                ))
                .bind(limit)
                .bind(source.as_str())
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, SkillWithMetrics>(&format!(
                    "{SELECT_WITH_METRICS} ORDER BY {order} LIMIT $1",
                ))
                .bind(limit)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Total number of skills matching the source filter (ignores limit).
    pub async fn count(pool: &PgPool, source: Option<Source>) -> Result<i64, sqlx::Error> {
        match source {
            Some(source) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM skills WHERE source = $1")
                    .bind(source.as_str())
                    .fetch_one(pool)
                    .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM skills")
                    .fetch_one(pool)
                    .await
            }
        }
    }

    /// One skill with its latest snapshot.
    pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<SkillWithMetrics>, sqlx::Error> {
        sqlx::query_as::<_, SkillWithMetrics>(&format!("{SELECT_WITH_METRICS} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Snapshots for a skill within the trailing `days` window, most
    /// recent first.
    pub async fn history(
        pool: &PgPool,
        skill_id: Uuid,
        days: i64,
    ) -> Result<Vec<MetricsSnapshot>, sqlx::Error> {
        let cutoff = Utc::now() - chrono::Duration::days(days);
        sqlx::query_as::<_, MetricsSnapshot>(
            "SELECT id, skill_id, stars, forks, downloads_day, downloads_week,
                    downloads_month, likes, last_activity, recorded_at
             FROM skill_metrics
             WHERE skill_id = $1 AND recorded_at >= $2
             ORDER BY recorded_at DESC",
        )
        .bind(skill_id)
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }

    /// Aggregate counts for the stats endpoint.
    pub async fn stats(pool: &PgPool) -> Result<SkillStats, sqlx::Error> {
        let total_skills: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM skills")
            .fetch_one(pool)
            .await?;

        let by_source: Vec<(String, i64)> =
            sqlx::query_as("SELECT source, COUNT(*) FROM skills GROUP BY source")
                .fetch_all(pool)
                .await?;

        let last_updated: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(updated_at) FROM skills")
                .fetch_one(pool)
                .await?;

        Ok(SkillStats {
            total_skills,
            skills_by_source: by_source.into_iter().collect(),
            last_updated,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_deserialize() {
        let sort: SkillSort = serde_json::from_str(r#""hot""#).unwrap();
        assert_eq!(sort, SkillSort::Hot);
        assert_eq!(SkillSort::default(), SkillSort::Latest);
    }

    #[test]
    fn test_sort_rejects_unknown() {
        assert!(serde_json::from_str::<SkillSort>(r#""alphabetical""#).is_err());
    }

    #[test]
    fn test_order_clauses_reference_joined_columns() {
        assert_eq!(SkillSort::Latest.order_clause(), "s.updated_at DESC");
        assert!(SkillSort::Hot.order_clause().contains("downloads_week"));
        assert!(SkillSort::Used.order_clause().contains("downloads_month"));
        // null metrics must sort last, not first
        assert!(SkillSort::Hot.order_clause().ends_with("NULLS LAST"));
    }
}
