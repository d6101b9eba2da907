use std::sync::Arc;

use sqlx::PgPool;

use crate::ingestion::scheduler::ScrapeScheduler;

pub struct AppState {
    pub pool: PgPool,
    pub scheduler: Arc<ScrapeScheduler>,
}
