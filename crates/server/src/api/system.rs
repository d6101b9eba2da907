//! Health, stats, run-log and manual-trigger handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use skillpulse_core::Source;

use crate::ingestion::run_log::RunLogStore;
use crate::ingestion::skill_store::SkillStore;
use crate::state::AppState;

/// GET /api/v1/health — database connectivity probe.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => Json(json!({
            "status": "healthy",
            "timestamp": Utc::now(),
            "database": "connected",
        })),
        Err(e) => Json(json!({
            "status": "unhealthy",
            "timestamp": Utc::now(),
            "database": format!("error: {}", e),
        })),
    }
}

/// GET /api/v1/stats — aggregate skill counters.
pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let stats = SkillStore::stats(&state.pool).await.map_err(|e| {
        tracing::error!(error = %e, "stats query failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "database error" })),
        )
    })?;

    Ok(Json(json!({
        "total_skills": stats.total_skills,
        "skills_by_source": stats.skills_by_source,
        "last_updated": stats.last_updated.unwrap_or_else(Utc::now),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ScrapesQuery {
    #[serde(default = "default_scrapes_limit")]
    pub limit: i64,
}

fn default_scrapes_limit() -> i64 {
    20
}

/// GET /api/v1/scrapes — run records, most recent first.
pub async fn scrapes_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScrapesQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let limit = query.limit.clamp(1, 100);
    let scrapes = RunLogStore::list_recent(&state.pool, limit).await.map_err(|e| {
        tracing::error!(error = %e, "run log query failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "database error" })),
        )
    })?;

    Ok(Json(json!({ "scrapes": scrapes })))
}

/// POST /api/v1/scrape/{source} — manual trigger.
///
/// Runs the scrape to completion over the same path as the periodic
/// timers and returns the outcome synchronously. An unrecognized source
/// is rejected before any run starts.
pub async fn trigger_scrape(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let source = Source::from_str(&source).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": e.to_string() })),
        )
    })?;

    let outcome = state.scheduler.trigger_now(source).await;
    Ok(Json(json!(outcome)))
}

// ── Tests ────────────────────────────────────────────────────────────
