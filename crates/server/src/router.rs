use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api::{skills, system};
use crate::state::AppState;

/// Build the API router with the CORS layer for the configured frontend
/// origin ("*" allows any origin).
pub fn build_router(state: Arc<AppState>, cors_origin: &str) -> Router {
    let cors = cors_layer(cors_origin);

    Router::new()
        .route("/api/v1/skills", get(skills::skills_list))
        .route("/api/v1/skills/{id}", get(skills::skills_get))
        .route("/api/v1/skills/{id}/history", get(skills::skills_history))
        .route("/api/v1/scrapes", get(system::scrapes_list))
        .route("/api/v1/scrape/{source}", post(system::trigger_scrape))
        .route("/api/v1/stats", get(system::stats))
        .route("/api/v1/health", get(system::health))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(origin, "invalid CORS origin — falling back to permissive");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}
