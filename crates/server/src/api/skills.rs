//! Handlers for the skills read API.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use skillpulse_core::Source;

use crate::ingestion::skill_store::{SkillSort, SkillStore};
use crate::ingestion::types::SkillWithMetrics;
use crate::state::AppState;

type ApiError = (StatusCode, Json<Value>);

fn bad_request(detail: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail.into() })))
}

fn not_found(detail: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": detail.into() })))
}

fn internal_error(e: sqlx::Error) -> ApiError {
    tracing::error!(error = %e, "skills query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "database error" })),
    )
}

/// Resolve the `source` query parameter: "all" (or absent) means no
/// filter, anything else must be a known source.
fn parse_source_filter(raw: Option<&str>) -> Result<Option<Source>, ApiError> {
    match raw {
        None | Some("all") => Ok(None),
        Some(other) => Source::from_str(other)
            .map(Some)
            .map_err(|e| bad_request(e.to_string())),
    }
}

/// Shape one joined row for API responses; `metrics` is null for a
/// skill that has no snapshot yet.
fn skill_to_json(row: &SkillWithMetrics) -> Value {
    let metrics = row.recorded_at.map(|recorded_at| {
        json!({
            "stars": row.stars,
            "forks": row.forks,
            "downloads_day": row.downloads_day,
            "downloads_week": row.downloads_week,
            "downloads_month": row.downloads_month,
            "likes": row.likes,
            "last_activity": row.last_activity,
            "recorded_at": recorded_at,
        })
    });

    json!({
        "id": row.id,
        "name": row.name,
        "source": row.source,
        "description": row.description,
        "url": row.url,
        "language": row.language,
        "created_at": row.created_at,
        "updated_at": row.updated_at,
        "metrics": metrics,
    })
}

// ── Handlers ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SkillsQuery {
    #[serde(default)]
    pub sort: SkillSort,
    pub source: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/v1/skills — list skills with their latest metrics.
pub async fn skills_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SkillsQuery>,
) -> Result<Json<Value>, ApiError> {
    let source = parse_source_filter(query.source.as_deref())?;
    let limit = query.limit.clamp(1, 100);

    let skills = SkillStore::list(&state.pool, query.sort, source, limit)
        .await
        .map_err(internal_error)?;
    let total = SkillStore::count(&state.pool, source)
        .await
        .map_err(internal_error)?;

    Ok(Json(json!({
        "skills": skills.iter().map(skill_to_json).collect::<Vec<_>>(),
        "total": total,
        "sort_by": query.sort,
        "updated_at": Utc::now(),
    })))
}

/// GET /api/v1/skills/{id} — one skill with its latest metrics.
pub async fn skills_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let skill = SkillStore::get(&state.pool, id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Skill not found"))?;
    Ok(Json(skill_to_json(&skill)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    30
}

/// GET /api/v1/skills/{id}/history — snapshots within a day window,
/// most recent first.
pub async fn skills_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let days = query.days.clamp(1, 90);

    let skill = SkillStore::get(&state.pool, id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Skill not found"))?;

    let history = SkillStore::history(&state.pool, id, days)
        .await
        .map_err(internal_error)?;

    Ok(Json(json!({
        "skill_id": id,
        "skill_name": skill.name,
        "days": days,
        "history": history,
    })))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skills_query_defaults() {
        let query: SkillsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.sort, SkillSort::Latest);
        assert!(query.source.is_none());
        assert_eq!(query.limit, 50);
    }

    #[test]
    fn test_skills_query_explicit() {
        let query: SkillsQuery =
            serde_json::from_str(r#"{"sort":"hot","source":"npm","limit":10}"#).unwrap();
        assert_eq!(query.sort, SkillSort::Hot);
        assert_eq!(query.source.as_deref(), Some("npm"));
        assert_eq!(query.limit, 10);
    }

    #[test]
    fn test_parse_source_filter() {
        assert_eq!(parse_source_filter(None).unwrap(), None);
        assert_eq!(parse_source_filter(Some("all")).unwrap(), None);
        assert_eq!(parse_source_filter(Some("pypi")).unwrap(), Some(Source::Pypi));
        assert!(parse_source_filter(Some("gitlab")).is_err());
    }

    #[test]
    fn test_skill_to_json_without_snapshot() {
        let row = SkillWithMetrics {
            id: Uuid::new_v4(),
            name: "pkg-a".to_string(),
            source: "npm".to_string(),
            description: String::new(),
            url: "https://www.npmjs.com/package/pkg-a".to_string(),
            language: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            stars: None,
            forks: None,
            downloads_day: None,
            downloads_week: None,
            downloads_month: None,
            likes: None,
            last_activity: None,
            recorded_at: None,
        };
        let value = skill_to_json(&row);
        assert_eq!(value["name"], "pkg-a");
        assert!(value["metrics"].is_null());
    }

    #[test]
    fn test_skill_to_json_preserves_null_metric_fields() {
        let row = SkillWithMetrics {
            id: Uuid::new_v4(),
            name: "pkg-a".to_string(),
            source: "npm".to_string(),
            description: "d".to_string(),
            url: "u".to_string(),
            language: Some("JavaScript".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            stars: None,
            forks: None,
            downloads_day: None,
            downloads_week: Some(120),
            downloads_month: None,
            likes: None,
            last_activity: None,
            recorded_at: Some(Utc::now()),
        };
        let value = skill_to_json(&row);
        assert_eq!(value["metrics"]["downloads_week"], 120);
        assert!(value["metrics"]["stars"].is_null());
        assert!(value["metrics"]["downloads_month"].is_null());
    }
}
