mod api;
mod db;
mod ingestion;
mod router;
mod state;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use skillpulse_core::Config;

use crate::ingestion::scheduler::ScrapeScheduler;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    skillpulse_core::config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    config.log_summary();

    let pool = db::init_pg_pool(&config.postgres).await?;

    let registry = skillpulse_scraper::build_registry(&config.scrape);
    let scheduler = Arc::new(ScrapeScheduler::new(pool.clone(), registry, &config.scrape));
    scheduler.start();

    let state = Arc::new(AppState {
        pool,
        scheduler: Arc::clone(&scheduler),
    });
    let app = router::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("skillpulse listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // cancel future timer firings; an in-flight run finishes naturally
    // and its run record is still written before join returns
    scheduler.shutdown();
    scheduler.join().await;
    info!("scheduler stopped");

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
